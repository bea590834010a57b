use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::commands::{
    application_failure, build_runtime, load_config, open_database, to_data, CommandFailure,
    CommandResult, EXIT_VALIDATION,
};
use crate::QuotesCommand;
use configurator_core::config::AppConfig;
use configurator_core::domain::quote::{Quote, QuoteId, QuoteStatus};
use configurator_core::ledger::QuoteLedger;
use configurator_db::SqlDocumentStore;

const CORRELATION_ID: &str = "cli-quotes";

#[derive(Debug, Serialize)]
pub struct QuoteSummary {
    pub id: QuoteId,
    pub quote_number: String,
    pub status: QuoteStatus,
    pub total: String,
    pub created_date: String,
}

impl From<&Quote> for QuoteSummary {
    fn from(quote: &Quote) -> Self {
        Self {
            id: quote.id.clone(),
            quote_number: quote.quote_number.clone(),
            status: quote.status,
            total: quote.bill_of_materials.total.to_string(),
            created_date: quote.created_date.to_rfc3339(),
        }
    }
}

pub fn run(command: &QuotesCommand) -> CommandResult {
    match execute(command) {
        Ok((message, data)) => CommandResult::success_with_data("quotes", message, data),
        Err(failure) => CommandResult::from_failure("quotes", failure),
    }
}

fn execute(command: &QuotesCommand) -> Result<(String, Option<Value>), CommandFailure> {
    let status = match command {
        QuotesCommand::Status { status, .. } => Some(parse_status(status)?),
        _ => None,
    };

    let config = load_config()?;
    let runtime = build_runtime()?;
    runtime.block_on(async {
        let pool = open_database(&config).await?;
        let mut ledger = open_ledger(&config, SqlDocumentStore::new(pool.clone())).await;
        let outcome = apply(&mut ledger, command, status).await;
        pool.close().await;
        outcome
    })
}

async fn open_ledger(config: &AppConfig, store: SqlDocumentStore) -> QuoteLedger {
    QuoteLedger::open_with_prefix(Arc::new(store), config.quotes.number_prefix.clone()).await
}

async fn apply(
    ledger: &mut QuoteLedger,
    command: &QuotesCommand,
    status: Option<QuoteStatus>,
) -> Result<(String, Option<Value>), CommandFailure> {
    match command {
        QuotesCommand::List => {
            let summaries = newest_first(ledger.quotes());
            Ok((format!("{} saved quotes", summaries.len()), Some(to_data(&summaries)?)))
        }
        QuotesCommand::Show { id } => {
            let quote = ledger.find(&QuoteId(id.clone())).ok_or_else(|| not_found(id))?;
            Ok((format!("quote {}", quote.quote_number), Some(to_data(&quote.export())?)))
        }
        QuotesCommand::Status { id, .. } => {
            let status = status.ok_or_else(|| {
                ("domain_validation", "a status is required".to_string(), EXIT_VALIDATION)
            })?;
            let updated = ledger
                .update_status(&QuoteId(id.clone()), status)
                .await
                .map_err(application_failure(CORRELATION_ID))?
                .ok_or_else(|| not_found(id))?;
            Ok((
                format!("quote {} is now {}", updated.quote_number, status.as_key()),
                Some(to_data(&QuoteSummary::from(&updated))?),
            ))
        }
        QuotesCommand::Delete { id } => {
            let removed = ledger
                .delete(&QuoteId(id.clone()))
                .await
                .map_err(application_failure(CORRELATION_ID))?;
            if !removed {
                return Err(not_found(id));
            }
            Ok((format!("quote {id} deleted"), None))
        }
    }
}

/// Saved quotes as listed to operators: most recently created first.
fn newest_first(quotes: &[Quote]) -> Vec<QuoteSummary> {
    let mut ordered: Vec<&Quote> = quotes.iter().collect();
    ordered.sort_by(|left, right| right.created_date.cmp(&left.created_date));
    ordered.into_iter().map(QuoteSummary::from).collect()
}

fn parse_status(raw: &str) -> Result<QuoteStatus, CommandFailure> {
    raw.parse::<QuoteStatus>().map_err(|message| ("domain_validation", message, EXIT_VALIDATION))
}

fn not_found(id: &str) -> CommandFailure {
    ("quote_not_found", format!("no saved quote with id `{id}`"), EXIT_VALIDATION)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use configurator_core::cpq::pricing::{price_configuration, PricingPolicy};
    use configurator_core::domain::component::{Component, ComponentCategory};
    use configurator_core::domain::configuration::Configuration;
    use configurator_core::domain::quote::{Quote, QuoteId, QuoteStatus};
    use rust_decimal::Decimal;

    use super::{newest_first, not_found, parse_status};
    use crate::commands::EXIT_VALIDATION;

    fn quote(number: &str, day: u32) -> Quote {
        let mut configuration = Configuration::new();
        configuration.set_base_component(Component::new(
            "BASE-001",
            "Industrial Base Unit Alpha",
            ComponentCategory::BaseUnit,
            "IBU-ALPHA-1000",
            Decimal::new(129_999, 2),
        ));
        let created = Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).single().expect("timestamp");
        let bill = price_configuration(&configuration, &[], &PricingPolicy::default(), created)
            .expect("price");

        Quote {
            id: QuoteId(format!("id-{number}")),
            quote_number: number.to_owned(),
            configuration,
            bill_of_materials: bill,
            created_date: created,
            status: QuoteStatus::Draft,
            notes: None,
        }
    }

    #[test]
    fn listing_puts_the_newest_quote_first() {
        let saved = vec![quote("QT-1", 2), quote("QT-2", 9), quote("QT-3", 5)];

        let numbers: Vec<String> =
            newest_first(&saved).into_iter().map(|summary| summary.quote_number).collect();
        assert_eq!(numbers, vec!["QT-2", "QT-3", "QT-1"]);
        assert_eq!(saved[0].quote_number, "QT-1");
    }

    #[test]
    fn status_argument_is_validated_before_touching_storage() {
        assert_eq!(parse_status("Submitted"), Ok(QuoteStatus::Submitted));

        let (class, message, code) = parse_status("shipped").expect_err("unknown status");
        assert_eq!(class, "domain_validation");
        assert_eq!(code, EXIT_VALIDATION);
        assert!(message.contains("shipped"));
    }

    #[test]
    fn missing_quote_reports_its_id() {
        let (class, message, _) = not_found("abc");
        assert_eq!(class, "quote_not_found");
        assert!(message.contains("`abc`"));
    }
}
