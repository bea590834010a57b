use std::env;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use configurator_cli::commands::{catalog, config, configure, migrate, quotes, seed};
use configurator_cli::{ConfigureArgs, QuotesCommand};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_memory_database() {
    with_env(
        &[
            ("CONFIGURATOR_DATABASE_URL", "sqlite::memory:"),
            ("CONFIGURATOR_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 0, "expected successful migrate run");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "migrate");
            assert_eq!(payload["status"], "ok");
        },
    );
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("CONFIGURATOR_DATABASE_URL", "postgres://localhost/configurator")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_temp_database(|| {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["command"], "seed");
        assert_eq!(first_payload["data"]["components"], 17);
        assert_eq!(first_payload["data"]["compatibility_rules"], 21);
        assert_eq!(first_payload["data"]["pricing_rules"], 3);

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        assert_eq!(first_payload["message"], second_payload["message"]);

        let listed = parse_payload(&catalog::run(None).output);
        assert_eq!(listed["data"].as_array().map(Vec::len), Some(17));
    });
}

#[test]
fn catalog_filters_by_category_and_rejects_unknown_categories() {
    with_temp_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let motors = catalog::run(Some("motor"));
        assert_eq!(motors.exit_code, 0);
        let payload = parse_payload(&motors.output);
        let ids: Vec<&str> = payload["data"]
            .as_array()
            .map(|entries| entries.iter().filter_map(|entry| entry["id"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec!["MOTOR-001", "MOTOR-002", "MOTOR-003"]);

        let unknown = catalog::run(Some("flux_capacitor"));
        assert_eq!(unknown.exit_code, 6);
        let payload = parse_payload(&unknown.output);
        assert_eq!(payload["error_class"], "domain_validation");
    });
}

#[test]
fn configure_prices_a_premium_bundle_without_saving() {
    with_temp_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = configure::run(&args("BASE-003", &["MOTOR-003", "CTRL-002", "GEAR-002"], false));
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        let data = &payload["data"];
        assert_eq!(data["step"], "reviewing");
        assert_eq!(data["bill_of_materials"]["subtotal"], "6899.96");
        assert_eq!(data["bill_of_materials"]["tax"], "496.40");
        assert_eq!(data["bill_of_materials"]["total"], "6336.35");
        // Housing, sensor, connector and bracket rules of BASE-003 have no ally yet.
        assert_eq!(data["mutually_compatible"], false);
        assert_eq!(data["availability"]["motor"], serde_json::json!([]));
        assert!(data.get("quote").is_none());

        let listed = parse_payload(&quotes::run(&QuotesCommand::List).output);
        assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));
    });
}

#[test]
fn configure_flags_parts_outside_the_base_rules_and_rejects_unknown_ids() {
    with_temp_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = configure::run(&args("BASE-002", &["MOTOR-003"], false));
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);
        assert_eq!(parse_payload(&result.output)["data"]["mutually_compatible"], false);

        let result = configure::run(&args("BASE-002", &["MOTOR-404"], false));
        assert_eq!(result.exit_code, 6);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "domain_validation");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("MOTOR-404"));
        assert!(message.contains("correlation_id=cli-configure"));
    });
}

#[test]
fn saved_quotes_round_trip_through_the_ledger_commands() {
    with_temp_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let saved = configure::run(&args("BASE-001", &["MOTOR-001"], true));
        assert_eq!(saved.exit_code, 0, "unexpected output: {}", saved.output);
        let payload = parse_payload(&saved.output);
        let quote_id = payload["data"]["quote_id"].as_str().unwrap_or_default().to_string();
        let quote_number = payload["data"]["quote"]["quote_number"].as_str().unwrap_or_default();
        assert!(quote_number.starts_with("QT-"));
        assert!(quote_number.ends_with("-0001"));
        assert_eq!(payload["data"]["quote"]["notes"], "rush");

        let listed = parse_payload(&quotes::run(&QuotesCommand::List).output);
        assert_eq!(listed["data"][0]["id"], quote_id.as_str());
        assert_eq!(listed["data"][0]["status"], "draft");

        let updated = quotes::run(&QuotesCommand::Status {
            id: quote_id.clone(),
            status: "approved".to_string(),
        });
        assert_eq!(updated.exit_code, 0);
        assert_eq!(parse_payload(&updated.output)["data"]["status"], "approved");

        let shown = parse_payload(&quotes::run(&QuotesCommand::Show { id: quote_id.clone() }).output);
        assert_eq!(shown["data"]["status"], "approved");
        assert_eq!(shown["data"]["base_component"], "Industrial Base Unit Alpha");

        let deleted = quotes::run(&QuotesCommand::Delete { id: quote_id.clone() });
        assert_eq!(deleted.exit_code, 0);

        let missing = quotes::run(&QuotesCommand::Delete { id: quote_id });
        assert_eq!(missing.exit_code, 6);
        assert_eq!(parse_payload(&missing.output)["error_class"], "quote_not_found");
    });
}

#[test]
fn config_reports_env_sources() {
    with_env(&[("CONFIGURATOR_QUOTES_NUMBER_PREFIX", "IND")], || {
        let output = config::run();
        assert!(output.contains(
            "- quotes.number_prefix = IND (source: env (CONFIGURATOR_QUOTES_NUMBER_PREFIX))"
        ));
        assert!(output.contains("- pricing.tax_rate = 0.085 (source: default)"));
    });
}

fn args(base: &str, parts: &[&str], save: bool) -> ConfigureArgs {
    ConfigureArgs {
        base: base.to_string(),
        parts: parts.iter().map(|part| (*part).to_string()).collect(),
        notes: save.then(|| "rush".to_string()),
        save,
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_temp_database(test_fn: impl FnOnce()) {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = database_url(&dir.path().join("configurator.db"));
    with_env(&[("CONFIGURATOR_DATABASE_URL", url.as_str())], test_fn);
}

fn database_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CONFIGURATOR_DATABASE_URL",
        "CONFIGURATOR_DATABASE_MAX_CONNECTIONS",
        "CONFIGURATOR_DATABASE_TIMEOUT_SECS",
        "CONFIGURATOR_PRICING_TAX_RATE",
        "CONFIGURATOR_PRICING_ASSEMBLY_FEE",
        "CONFIGURATOR_PRICING_CUSTOMIZATION_THRESHOLD",
        "CONFIGURATOR_QUOTES_NUMBER_PREFIX",
        "CONFIGURATOR_LOGGING_LEVEL",
        "CONFIGURATOR_LOGGING_FORMAT",
        "CONFIGURATOR_LOG_LEVEL",
        "CONFIGURATOR_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
