use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::pricing::PricingPolicy;

/// Config files tried, in order, when no explicit path is given.
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["configurator.toml", "config/configurator.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
    pub quotes: QuotesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub tax_rate: Decimal,
    pub assembly_fee: Decimal,
    pub customization_threshold: usize,
}

#[derive(Clone, Debug)]
pub struct QuotesConfig {
    pub number_prefix: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub quote_number_prefix: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let policy = PricingPolicy::default();
        Self {
            database: DatabaseConfig {
                url: "sqlite://configurator.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            pricing: PricingConfig {
                tax_rate: policy.tax_rate,
                assembly_fee: policy.assembly_fee,
                customization_threshold: policy.customization_threshold,
            },
            quotes: QuotesConfig { number_prefix: "QT".to_string() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Pricing constants as consumed by the pricing engine.
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            tax_rate: self.pricing.tax_rate,
            assembly_fee: self.pricing.assembly_fee,
            customization_threshold: self.pricing.customization_threshold,
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(tax_rate) = pricing.tax_rate {
                self.pricing.tax_rate = tax_rate;
            }
            if let Some(assembly_fee) = pricing.assembly_fee {
                self.pricing.assembly_fee = assembly_fee;
            }
            if let Some(threshold) = pricing.customization_threshold {
                self.pricing.customization_threshold = threshold;
            }
        }

        if let Some(quotes) = patch.quotes {
            if let Some(number_prefix) = quotes.number_prefix {
                self.quotes.number_prefix = number_prefix;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CONFIGURATOR_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("CONFIGURATOR_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("CONFIGURATOR_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CONFIGURATOR_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("CONFIGURATOR_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CONFIGURATOR_PRICING_TAX_RATE") {
            self.pricing.tax_rate = parse_env("CONFIGURATOR_PRICING_TAX_RATE", &value)?;
        }
        if let Some(value) = read_env("CONFIGURATOR_PRICING_ASSEMBLY_FEE") {
            self.pricing.assembly_fee = parse_env("CONFIGURATOR_PRICING_ASSEMBLY_FEE", &value)?;
        }
        if let Some(value) = read_env("CONFIGURATOR_PRICING_CUSTOMIZATION_THRESHOLD") {
            self.pricing.customization_threshold =
                parse_env("CONFIGURATOR_PRICING_CUSTOMIZATION_THRESHOLD", &value)?;
        }

        if let Some(value) = read_env("CONFIGURATOR_QUOTES_NUMBER_PREFIX") {
            self.quotes.number_prefix = value;
        }

        let log_level =
            read_env("CONFIGURATOR_LOGGING_LEVEL").or_else(|| read_env("CONFIGURATOR_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CONFIGURATOR_LOGGING_FORMAT").or_else(|| read_env("CONFIGURATOR_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(tax_rate) = overrides.tax_rate {
            self.pricing.tax_rate = tax_rate;
        }
        if let Some(prefix) = overrides.quote_number_prefix {
            self.quotes.number_prefix = prefix;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_pricing(&self.pricing)?;
        validate_quotes(&self.quotes)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.tax_rate < Decimal::ZERO || pricing.tax_rate >= Decimal::ONE {
        return Err(ConfigError::Validation(
            "pricing.tax_rate must be a fraction in range 0..1 (e.g. 0.085)".to_string(),
        ));
    }

    if pricing.assembly_fee < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.assembly_fee must not be negative".to_string(),
        ));
    }

    if pricing.customization_threshold == 0 {
        return Err(ConfigError::Validation(
            "pricing.customization_threshold must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_quotes(quotes: &QuotesConfig) -> Result<(), ConfigError> {
    let prefix = quotes.number_prefix.trim();
    if prefix.is_empty() || !prefix.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(
            "quotes.number_prefix must be a non-empty alphanumeric string".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    pricing: Option<PricingPatch>,
    quotes: Option<QuotesPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    tax_rate: Option<Decimal>,
    assembly_fee: Option<Decimal>,
    customization_threshold: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct QuotesPatch {
    number_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
