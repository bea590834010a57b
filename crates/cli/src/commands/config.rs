use std::env;
use std::fs;
use std::path::Path;

use configurator_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

/// (config key, primary env var, alias env var)
const FIELDS: [(&str, &str, Option<&str>); 9] = [
    ("database.url", "CONFIGURATOR_DATABASE_URL", None),
    ("database.max_connections", "CONFIGURATOR_DATABASE_MAX_CONNECTIONS", None),
    ("database.timeout_secs", "CONFIGURATOR_DATABASE_TIMEOUT_SECS", None),
    ("pricing.tax_rate", "CONFIGURATOR_PRICING_TAX_RATE", None),
    ("pricing.assembly_fee", "CONFIGURATOR_PRICING_ASSEMBLY_FEE", None),
    (
        "pricing.customization_threshold",
        "CONFIGURATOR_PRICING_CUSTOMIZATION_THRESHOLD",
        None,
    ),
    ("quotes.number_prefix", "CONFIGURATOR_QUOTES_NUMBER_PREFIX", None),
    ("logging.level", "CONFIGURATOR_LOGGING_LEVEL", Some("CONFIGURATOR_LOG_LEVEL")),
    ("logging.format", "CONFIGURATOR_LOGGING_FORMAT", Some("CONFIGURATOR_LOG_FORMAT")),
];

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, env_key, alias) in FIELDS {
        lines.push(render_line(
            key,
            &effective_value(&config, key),
            field_source(
                key,
                &[Some(env_key), alias],
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        ));
    }

    lines.join("\n")
}

fn effective_value(config: &AppConfig, key: &str) -> String {
    match key {
        "database.url" => config.database.url.clone(),
        "database.max_connections" => config.database.max_connections.to_string(),
        "database.timeout_secs" => config.database.timeout_secs.to_string(),
        "pricing.tax_rate" => config.pricing.tax_rate.to_string(),
        "pricing.assembly_fee" => config.pricing.assembly_fee.to_string(),
        "pricing.customization_threshold" => config.pricing.customization_threshold.to_string(),
        "quotes.number_prefix" => config.quotes.number_prefix.clone(),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => format!("{:?}", config.logging.format),
        _ => "<unknown>".to_string(),
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[Option<&str>],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    for env_key in env_keys.iter().flatten() {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{contains_path, field_source, render_line};

    #[test]
    fn nested_keys_resolve_against_the_file_document() {
        let doc: toml::Value = "[pricing]\ntax_rate = \"0.07\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "pricing.tax_rate"));
        assert!(!contains_path(&doc, "pricing.assembly_fee"));
        assert!(!contains_path(&doc, "quotes.number_prefix"));
    }

    #[test]
    fn file_source_names_the_file_when_env_is_unset() {
        let doc: toml::Value = "[quotes]\nnumber_prefix = \"IND\"\n".parse().expect("toml");
        let source = field_source(
            "quotes.number_prefix",
            &[Some("CONFIGURATOR_TEST_UNSET_PREFIX_VAR")],
            Some(&doc),
            Some(Path::new("configurator.toml")),
        );

        assert_eq!(source, "file (configurator.toml)");
        assert_eq!(
            field_source("pricing.tax_rate", &[None], Some(&doc), None),
            "default"
        );
    }

    #[test]
    fn lines_render_key_value_and_source() {
        assert_eq!(
            render_line("pricing.tax_rate", "0.085", "default".to_string()),
            "- pricing.tax_rate = 0.085 (source: default)"
        );
    }
}
