use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::commands::{
    application_failure, build_runtime, load_config, open_database, to_data, CommandFailure,
    CommandResult, EXIT_DB_CONNECTIVITY,
};
use crate::ConfigureArgs;
use configurator_core::audit::{AuditContext, InMemoryAuditSink};
use configurator_core::config::AppConfig;
use configurator_core::cpq::pricing::DeterministicPricingEngine;
use configurator_core::cpq::CatalogIndex;
use configurator_core::domain::component::ComponentId;
use configurator_core::domain::pricing::BillOfMaterials;
use configurator_core::domain::quote::{QuoteExport, QuoteId};
use configurator_core::errors::ApplicationError;
use configurator_core::flows::{AvailabilityMap, ConfigurationSession, SessionStep};
use configurator_core::ledger::QuoteLedger;
use configurator_db::{CatalogRepository, SqlCatalogRepository, SqlDocumentStore};

const CORRELATION_ID: &str = "cli-configure";

#[derive(Debug, Serialize)]
pub struct ConfigureReport {
    pub step: SessionStep,
    pub selected: Vec<String>,
    /// Parts are not gated by availability, so the report says whether they fit together.
    pub mutually_compatible: bool,
    /// Remaining choices per category once every requested part is in place.
    pub availability: BTreeMap<&'static str, Vec<String>>,
    pub bill_of_materials: BillOfMaterials,
    pub step_events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<QuoteId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<QuoteExport>,
}

pub fn run(args: &ConfigureArgs) -> CommandResult {
    match execute(args) {
        Ok(report) => {
            let message = match &report.quote {
                Some(quote) => format!("quote {} saved, total {}", quote.quote_number, quote.total),
                None => format!("configuration priced, total {}", report.bill_of_materials.total),
            };
            match to_data(&report) {
                Ok(data) => CommandResult::success_with_data("configure", message, Some(data)),
                Err(failure) => CommandResult::from_failure("configure", failure),
            }
        }
        Err(failure) => CommandResult::from_failure("configure", failure),
    }
}

fn execute(args: &ConfigureArgs) -> Result<ConfigureReport, CommandFailure> {
    let config = load_config()?;
    let runtime = build_runtime()?;
    runtime.block_on(configure(&config, args))
}

async fn configure(config: &AppConfig, args: &ConfigureArgs) -> Result<ConfigureReport, CommandFailure> {
    let pool = open_database(config).await?;
    let catalog = SqlCatalogRepository::new(pool.clone())
        .load()
        .await
        .map_err(|error| ("catalog_load", error.to_string(), EXIT_DB_CONNECTIVITY))?;

    let sink = Arc::new(InMemoryAuditSink::default());
    let context = AuditContext::new(None, Some(session_label(args)), CORRELATION_ID, "operator");
    let mut session = ConfigurationSession::with_pricing(
        CatalogIndex::new(catalog),
        Arc::new(DeterministicPricingEngine::new(config.pricing_policy())),
    )
    .with_audit(sink.clone(), context.clone());

    let walked = walk_session(&mut session, args).map_err(application_failure(CORRELATION_ID))?;

    let (quote_id, quote) = if args.save {
        let store = Arc::new(SqlDocumentStore::new(pool.clone()));
        let mut ledger = QuoteLedger::open_with_prefix(store, config.quotes.number_prefix.clone())
            .await
            .with_audit(sink.clone(), context);
        let quote = session
            .generate_quote(&ledger, args.notes.clone())
            .map_err(application_failure(CORRELATION_ID))?;
        ledger.save(quote.clone()).await.map_err(application_failure(CORRELATION_ID))?;
        (Some(quote.id.clone()), Some(quote.export()))
    } else {
        (None, None)
    };
    pool.close().await;

    info!(
        event_name = "cli.configure_completed",
        correlation_id = CORRELATION_ID,
        saved = args.save,
        audit_events = sink.events().len(),
        "configuration run completed"
    );

    Ok(ConfigureReport {
        step: session.step(),
        selected: session.configuration().component_ids().into_iter().map(|id| id.0).collect(),
        mutually_compatible: session.is_mutually_compatible(),
        availability: availability_ids(session.availability()),
        bill_of_materials: walked,
        step_events: sink.events().iter().filter(|event| event.event_type.starts_with("session.")).count(),
        quote_id,
        quote,
    })
}

/// Picks the base and parts, then walks forward to review, which prices the selection.
fn walk_session(
    session: &mut ConfigurationSession,
    args: &ConfigureArgs,
) -> Result<BillOfMaterials, ApplicationError> {
    session.select_base(&ComponentId::from(args.base.as_str()))?;
    for part in &args.parts {
        session.select_component(&ComponentId::from(part.as_str()))?;
    }

    while session.step() != SessionStep::Reviewing {
        session.next()?;
    }

    session.bill_of_materials().cloned().ok_or_else(|| {
        ApplicationError::Configuration("review reached without a bill of materials".to_string())
    })
}

fn availability_ids(availability: &AvailabilityMap) -> BTreeMap<&'static str, Vec<String>> {
    availability
        .iter()
        .map(|(category, components)| {
            (category.as_key(), components.iter().map(|component| component.id.to_string()).collect())
        })
        .collect()
}

fn session_label(args: &ConfigureArgs) -> String {
    std::iter::once(args.base.as_str())
        .chain(args.parts.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use configurator_core::cpq::catalog::StaticCatalog;
    use configurator_core::cpq::compatibility::CompatibilityRule;
    use configurator_core::cpq::CatalogIndex;
    use configurator_core::domain::component::{Component, ComponentCategory, ComponentId};
    use configurator_core::errors::{ApplicationError, DomainError};
    use configurator_core::flows::{ConfigurationSession, SessionStep};
    use rust_decimal::Decimal;

    use super::{availability_ids, session_label, walk_session};
    use crate::ConfigureArgs;

    fn session() -> ConfigurationSession {
        ConfigurationSession::new(CatalogIndex::new(StaticCatalog::new(
            vec![
                Component::new("BASE-002", "Beta", ComponentCategory::BaseUnit, "CBU", Decimal::new(89_999, 2)),
                Component::new("MOTOR-001", "AC", ComponentCategory::Motor, "AC5", Decimal::new(89_999, 2)),
                Component::new("MOTOR-002", "DC", ComponentCategory::Motor, "DC3", Decimal::new(64_999, 2)),
            ],
            vec![CompatibilityRule {
                id: "RULE-005".to_owned(),
                required_component_id: ComponentId::from("BASE-002"),
                compatible_component_ids: vec![ComponentId::from("MOTOR-002")],
                category: ComponentCategory::Motor,
                conditions: None,
            }],
            Vec::new(),
        )))
    }

    fn args(parts: &[&str]) -> ConfigureArgs {
        ConfigureArgs {
            base: "BASE-002".to_owned(),
            parts: parts.iter().map(|part| (*part).to_owned()).collect(),
            notes: None,
            save: false,
        }
    }

    #[test]
    fn walk_reaches_review_with_a_bill() {
        let mut session = session();
        let bill = walk_session(&mut session, &args(&["MOTOR-002"])).expect("walk");

        assert_eq!(session.step(), SessionStep::Reviewing);
        assert_eq!(bill.items.len(), 2);
        assert_eq!(bill.subtotal, Decimal::new(154_998, 2));

        let availability = availability_ids(session.availability());
        assert_eq!(availability["motor"], vec!["MOTOR-002".to_string()]);
        assert_eq!(availability.len(), ComponentCategory::ALL.len());
    }

    #[test]
    fn incompatible_part_is_priced_but_flagged() {
        let mut session = session();
        walk_session(&mut session, &args(&["MOTOR-001"])).expect("walk");

        assert_eq!(session.step(), SessionStep::Reviewing);
        assert!(!session.is_mutually_compatible());
    }

    #[test]
    fn unknown_part_stops_the_walk() {
        let mut session = session();
        let error = walk_session(&mut session, &args(&["MOTOR-404"])).expect_err("unknown");

        assert_eq!(
            error,
            ApplicationError::Domain(DomainError::UnknownComponentId(ComponentId::from("MOTOR-404")))
        );
        assert_eq!(session.step(), SessionStep::SelectingBase);
    }

    #[test]
    fn session_label_joins_requested_ids() {
        assert_eq!(session_label(&args(&["MOTOR-002"])), "BASE-002+MOTOR-002");
    }
}
