use serde_json::json;

use crate::commands::{
    build_runtime, load_config, open_database, CommandFailure, CommandResult, EXIT_MIGRATION,
};
use configurator_db::{SampleCatalog, SeedResult};

pub fn run() -> CommandResult {
    match execute() {
        Ok(seeded) => CommandResult::success_with_data(
            "seed",
            format!(
                "sample catalog loaded: {} components, {} compatibility rules, {} pricing rules",
                seeded.components, seeded.compatibility_rules, seeded.pricing_rules
            ),
            Some(json!({
                "components": seeded.components,
                "compatibility_rules": seeded.compatibility_rules,
                "pricing_rules": seeded.pricing_rules,
            })),
        ),
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

fn execute() -> Result<SeedResult, CommandFailure> {
    let config = load_config()?;
    let runtime = build_runtime()?;

    runtime.block_on(async {
        let pool = open_database(&config).await?;

        let seeded = SampleCatalog::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;
        let verification = SampleCatalog::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_MIGRATION))?;

        pool.close().await;
        if !verification.all_present {
            let failed_checks = failed_check_names(&verification.checks);
            return Err(("seed_verification", verification_message(&failed_checks), EXIT_MIGRATION));
        }
        Ok(seeded)
    })
}

fn failed_check_names(checks: &[(&'static str, bool)]) -> Vec<&'static str> {
    checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect()
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
