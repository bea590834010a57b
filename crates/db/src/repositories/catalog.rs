use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;
use tracing::info;

use configurator_core::cpq::catalog::StaticCatalog;
use configurator_core::cpq::compatibility::CompatibilityRule;
use configurator_core::domain::component::{Component, ComponentCategory, ComponentId};
use configurator_core::domain::pricing::{PricingRule, PricingRuleType};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn components(&self) -> Result<Vec<Component>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, category, description, part_number, base_price,
                    specifications_json, compatibility_tags_json, image_url, model_file_name
             FROM component
             ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_component).collect()
    }

    pub async fn compatibility_rules(&self) -> Result<Vec<CompatibilityRule>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, required_component_id, category, compatible_component_ids_json,
                    conditions_json
             FROM compatibility_rule
             ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_compatibility_rule).collect()
    }

    pub async fn pricing_rules(&self) -> Result<Vec<PricingRule>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, rule_type, component_ids_json, discount_percentage, additional_charge,
                    description
             FROM pricing_rule
             ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_pricing_rule).collect()
    }
}

#[async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn load(&self) -> Result<StaticCatalog, RepositoryError> {
        let components = self.components().await?;
        let rules = self.compatibility_rules().await?;
        let pricing_rules = self.pricing_rules().await?;

        info!(
            event_name = "catalog.loaded",
            component_count = components.len(),
            rule_count = rules.len(),
            pricing_rule_count = pricing_rules.len(),
            "catalog loaded from storage"
        );
        Ok(StaticCatalog::new(components, rules, pricing_rules))
    }
}

fn column<T>(row: &sqlx::sqlite::SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_category(value: &str) -> Result<ComponentCategory, RepositoryError> {
    ComponentCategory::from_str(value).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value.trim())
        .map_err(|e| RepositoryError::Decode(format!("{field} `{value}` is not a decimal: {e}")))
}

/// Bundle discounts are percentages of the bundle's price, so only 0 to 100 is meaningful.
fn parse_percentage(field: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    let value = parse_decimal(field, raw)?;
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(RepositoryError::Decode(format!("{field}: {value} is outside 0..=100")));
    }
    Ok(value)
}

fn parse_json<T: serde::de::DeserializeOwned>(field: &str, raw: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::Decode(format!("{field}: {e}")))
}

fn parse_ids(field: &str, raw: &str) -> Result<Vec<ComponentId>, RepositoryError> {
    let ids: Vec<String> = parse_json(field, raw)?;
    Ok(ids.into_iter().map(ComponentId).collect())
}

fn row_to_component(row: &sqlx::sqlite::SqliteRow) -> Result<Component, RepositoryError> {
    let id: String = column(row, "id")?;
    let category: String = column(row, "category")?;
    let base_price: String = column(row, "base_price")?;
    let specifications: String = column(row, "specifications_json")?;
    let tags: String = column(row, "compatibility_tags_json")?;

    Ok(Component {
        id: ComponentId(id),
        name: column(row, "name")?,
        category: parse_category(&category)?,
        description: column(row, "description")?,
        part_number: column(row, "part_number")?,
        base_price: parse_decimal("base_price", &base_price)?,
        specifications: parse_json::<BTreeMap<String, String>>("specifications_json", &specifications)?,
        compatibility_tags: parse_json::<BTreeSet<String>>("compatibility_tags_json", &tags)?,
        image_url: column(row, "image_url")?,
        model_file_name: column(row, "model_file_name")?,
    })
}

fn row_to_compatibility_rule(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CompatibilityRule, RepositoryError> {
    let required: String = column(row, "required_component_id")?;
    let category: String = column(row, "category")?;
    let compatible: String = column(row, "compatible_component_ids_json")?;
    let conditions: Option<String> = column(row, "conditions_json")?;

    Ok(CompatibilityRule {
        id: column(row, "id")?,
        required_component_id: ComponentId(required),
        compatible_component_ids: parse_ids("compatible_component_ids_json", &compatible)?,
        category: parse_category(&category)?,
        conditions: conditions
            .map(|raw| parse_json::<BTreeMap<String, String>>("conditions_json", &raw))
            .transpose()?,
    })
}

fn row_to_pricing_rule(row: &sqlx::sqlite::SqliteRow) -> Result<PricingRule, RepositoryError> {
    let rule_type: String = column(row, "rule_type")?;
    let component_ids: String = column(row, "component_ids_json")?;
    let discount: Option<String> = column(row, "discount_percentage")?;
    let charge: Option<String> = column(row, "additional_charge")?;

    Ok(PricingRule {
        id: column(row, "id")?,
        rule_type: PricingRuleType::from_str(&rule_type).map_err(RepositoryError::Decode)?,
        component_ids: parse_ids("component_ids_json", &component_ids)?,
        discount_percentage: discount
            .map(|value| parse_percentage("discount_percentage", &value))
            .transpose()?,
        additional_charge: charge
            .map(|value| parse_decimal("additional_charge", &value))
            .transpose()?,
        description: column(row, "description")?,
    })
}
