use sqlx::Executor;
use tracing::info;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SAMPLE_COMPONENT_IDS: &[&str] = &[
    "BASE-001",
    "BASE-002",
    "BASE-003",
    "MOTOR-001",
    "MOTOR-002",
    "MOTOR-003",
    "GEAR-001",
    "GEAR-002",
    "GEAR-003",
    "CTRL-001",
    "CTRL-002",
    "SENSOR-001",
    "SENSOR-002",
    "HOUSE-001",
    "HOUSE-002",
    "CONN-001",
    "MOUNT-001",
];

const SAMPLE_BASE_UNIT_IDS: &[&str] = &["BASE-001", "BASE-002", "BASE-003"];

const SAMPLE_COMPATIBILITY_RULE_IDS: &[&str] = &[
    "RULE-001",
    "RULE-002",
    "RULE-003",
    "RULE-004",
    "RULE-005",
    "RULE-006",
    "RULE-007",
    "RULE-008",
    "RULE-009",
    "RULE-010",
    "RULE-011",
    "RULE-012",
    "RULE-SENS-BASE-001",
    "RULE-CONN-BASE-001",
    "RULE-MOUNT-BASE-001",
    "RULE-SENS-BASE-002",
    "RULE-CONN-BASE-002",
    "RULE-MOUNT-BASE-002",
    "RULE-SENS-BASE-003",
    "RULE-CONN-BASE-003",
    "RULE-MOUNT-BASE-003",
];

const SAMPLE_PRICING_RULE_IDS: &[&str] = &["PRICE-001", "PRICE-002", "PRICE-003"];

/// The demo industrial catalog: three base units with their motors, gearboxes, controllers,
/// sensors, housings, connectors and brackets, the rules tying them to each base, and the
/// bundle and customization pricing rules.
pub struct SampleCatalog;

impl SampleCatalog {
    pub const SQL: &str = include_str!("../../../config/fixtures/sample_catalog.sql");

    /// Upserts the sample rows. Running it twice leaves the same tables.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let result = SeedResult {
            components: SAMPLE_COMPONENT_IDS.len(),
            compatibility_rules: SAMPLE_COMPATIBILITY_RULE_IDS.len(),
            pricing_rules: SAMPLE_PRICING_RULE_IDS.len(),
        };
        info!(
            event_name = "catalog.sample_seeded",
            components = result.components,
            compatibility_rules = result.compatibility_rules,
            pricing_rules = result.pricing_rules,
            "sample catalog seeded"
        );
        Ok(result)
    }

    /// Checks that every sample id is present and the base units carry the right category.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let components = count_ids(pool, "component", SAMPLE_COMPONENT_IDS).await?;
        checks.push(("sample-components", components == SAMPLE_COMPONENT_IDS.len() as i64));

        let rules = count_ids(pool, "compatibility_rule", SAMPLE_COMPATIBILITY_RULE_IDS).await?;
        checks.push((
            "sample-compatibility-rules",
            rules == SAMPLE_COMPATIBILITY_RULE_IDS.len() as i64,
        ));

        let pricing = count_ids(pool, "pricing_rule", SAMPLE_PRICING_RULE_IDS).await?;
        checks.push(("sample-pricing-rules", pricing == SAMPLE_PRICING_RULE_IDS.len() as i64));

        let quoted_bases = sql_array_from_ids(SAMPLE_BASE_UNIT_IDS);
        let bases: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM component WHERE id IN {quoted_bases} AND category = 'base_unit'"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("sample-base-units", bases == SAMPLE_BASE_UNIT_IDS.len() as i64));

        let every_base_ruled: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(DISTINCT required_component_id) FROM compatibility_rule
             WHERE required_component_id IN {quoted_bases}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("sample-base-rules", every_base_ruled == SAMPLE_BASE_UNIT_IDS.len() as i64));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the sample rows, leaving any operator-added catalog entries alone.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let quoted_pricing = sql_array_from_ids(SAMPLE_PRICING_RULE_IDS);
        let quoted_rules = sql_array_from_ids(SAMPLE_COMPATIBILITY_RULE_IDS);
        let quoted_components = sql_array_from_ids(SAMPLE_COMPONENT_IDS);

        sqlx::query(&format!("DELETE FROM pricing_rule WHERE id IN {quoted_pricing}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM compatibility_rule WHERE id IN {quoted_rules}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM component WHERE id IN {quoted_components}"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn count_ids(pool: &DbPool, table: &str, ids: &[&str]) -> Result<i64, RepositoryError> {
    let quoted = sql_array_from_ids(ids);
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {table} WHERE id IN {quoted}"))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    pub components: usize,
    pub compatibility_rules: usize,
    pub pricing_rules: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use configurator_core::cpq::catalog::CatalogProvider;
    use configurator_core::cpq::CatalogIndex;
    use configurator_core::domain::component::{ComponentCategory, ComponentId};
    use configurator_core::flows::ConfigurationSession;

    use super::*;
    use crate::repositories::{CatalogRepository, SqlCatalogRepository};
    use crate::{connect_with_settings, migrations};

    async fn seeded_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        SampleCatalog::load(&pool).await.expect("load sample catalog");
        pool
    }

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!SampleCatalog::SQL.is_empty());
        let ids = SAMPLE_COMPONENT_IDS
            .iter()
            .chain(SAMPLE_COMPATIBILITY_RULE_IDS)
            .chain(SAMPLE_PRICING_RULE_IDS);
        for id in ids {
            assert!(SampleCatalog::SQL.contains(&format!("'{id}'")), "fixture should contain {id}");
        }
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = seeded_pool().await;

        let first_verification = SampleCatalog::verify(&pool).await.expect("verify");
        assert!(first_verification.all_present);

        let second = SampleCatalog::load(&pool).await.expect("reload");
        let second_verification = SampleCatalog::verify(&pool).await.expect("re-verify");
        assert!(second_verification.all_present);
        assert_eq!(second.components, 17);
        assert_eq!(first_verification.checks, second_verification.checks);

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM component").fetch_one(&pool).await.expect("count");
        assert_eq!(total, 17);
    }

    #[tokio::test]
    async fn clean_removes_sample_rows() {
        let pool = seeded_pool().await;
        SampleCatalog::clean(&pool).await.expect("clean");

        let verification = SampleCatalog::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
        let catalog = SqlCatalogRepository::new(pool).load().await.expect("load");
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn sample_catalog_drives_a_premium_configuration() {
        let pool = seeded_pool().await;
        let catalog = SqlCatalogRepository::new(pool).load().await.expect("load catalog");
        assert_eq!(catalog.rules().len(), 21);
        assert_eq!(catalog.pricing_rules().len(), 3);

        let mut session = ConfigurationSession::new(CatalogIndex::new(catalog));
        let available = session.select_base(&ComponentId::from("BASE-003")).expect("base");
        // The base rules every part category, so a lone candidate never satisfies all of them.
        assert!(available
            .iter()
            .filter(|(category, _)| !category.is_base())
            .all(|(_, components)| components.is_empty()));

        for part in ["MOTOR-003", "CTRL-002", "GEAR-002"] {
            session.select_component(&ComponentId::from(part)).expect("known part");
        }
        assert!(!session.is_mutually_compatible());
        session.next().expect("parts");
        session.next().expect("preview");
        session.next().expect("review");

        let bill = session.bill_of_materials().expect("bill");
        assert_eq!(bill.subtotal, Decimal::new(689_996, 2));
        let discounts: Vec<Decimal> = bill.discounts.iter().map(|d| d.amount).collect();
        assert_eq!(discounts, vec![Decimal::new(32_000, 2), Decimal::new(84_000, 2)]);
        assert_eq!(bill.additional_charges.len(), 1);
        assert_eq!(bill.tax, Decimal::new(49_640, 2));
        assert_eq!(bill.total, Decimal::new(633_635, 2));

        session.back();
        session.back();
        for part in ["HOUSE-001", "SENSOR-001", "CONN-001", "MOUNT-001"] {
            session.select_component(&ComponentId::from(part)).expect("known part");
        }
        assert!(session.is_mutually_compatible());
        let motors: Vec<&str> =
            session.available(ComponentCategory::Motor).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(motors, vec!["MOTOR-003"]);
        let gearboxes: Vec<&str> =
            session.available(ComponentCategory::Gearbox).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(gearboxes, vec!["GEAR-001", "GEAR-002"]);
    }
}
