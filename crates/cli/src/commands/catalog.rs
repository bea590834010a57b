use std::str::FromStr;

use serde::Serialize;

use crate::commands::{
    build_runtime, load_config, open_database, to_data, CommandFailure, CommandResult,
    EXIT_DB_CONNECTIVITY, EXIT_VALIDATION,
};
use configurator_core::config::AppConfig;
use configurator_core::cpq::catalog::{CatalogProvider, StaticCatalog};
use configurator_core::domain::component::{Component, ComponentCategory};
use configurator_db::{CatalogRepository, SqlCatalogRepository};

#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub category: &'static str,
    pub part_number: String,
    pub base_price: String,
}

impl From<&Component> for CatalogEntry {
    fn from(component: &Component) -> Self {
        Self {
            id: component.id.to_string(),
            name: component.name.clone(),
            category: component.category.as_key(),
            part_number: component.part_number.clone(),
            base_price: component.base_price.to_string(),
        }
    }
}

pub fn run(category: Option<&str>) -> CommandResult {
    match execute(category) {
        Ok(entries) => {
            let message = format!("{} components", entries.len());
            match to_data(&entries) {
                Ok(data) => CommandResult::success_with_data("catalog", message, Some(data)),
                Err(failure) => CommandResult::from_failure("catalog", failure),
            }
        }
        Err(failure) => CommandResult::from_failure("catalog", failure),
    }
}

fn execute(category: Option<&str>) -> Result<Vec<CatalogEntry>, CommandFailure> {
    let category = category
        .map(ComponentCategory::from_str)
        .transpose()
        .map_err(|error| ("domain_validation", error.to_string(), EXIT_VALIDATION))?;

    let config = load_config()?;
    let runtime = build_runtime()?;
    let catalog = runtime.block_on(load_catalog(&config))?;

    Ok(list_components(&catalog, category))
}

async fn load_catalog(config: &AppConfig) -> Result<StaticCatalog, CommandFailure> {
    let pool = open_database(config).await?;
    let catalog = SqlCatalogRepository::new(pool.clone())
        .load()
        .await
        .map_err(|error| ("catalog_load", error.to_string(), EXIT_DB_CONNECTIVITY))?;
    pool.close().await;
    Ok(catalog)
}

fn list_components(catalog: &StaticCatalog, category: Option<ComponentCategory>) -> Vec<CatalogEntry> {
    catalog
        .all_components()
        .iter()
        .filter(|component| category.map_or(true, |category| component.category == category))
        .map(CatalogEntry::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use configurator_core::cpq::catalog::StaticCatalog;
    use configurator_core::domain::component::{Component, ComponentCategory};
    use rust_decimal::Decimal;

    use super::list_components;

    #[test]
    fn category_filter_keeps_catalog_order() {
        let catalog = StaticCatalog::new(
            vec![
                Component::new("BASE-001", "Alpha", ComponentCategory::BaseUnit, "IBU", Decimal::new(129_999, 2)),
                Component::new("MOTOR-002", "DC", ComponentCategory::Motor, "DC3", Decimal::new(64_999, 2)),
                Component::new("MOTOR-001", "AC", ComponentCategory::Motor, "AC5", Decimal::new(89_999, 2)),
            ],
            Vec::new(),
            Vec::new(),
        );

        let motors = list_components(&catalog, Some(ComponentCategory::Motor));
        let ids: Vec<&str> = motors.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["MOTOR-002", "MOTOR-001"]);
        assert_eq!(motors[0].category, "motor");
        assert_eq!(motors[0].base_price, "649.99");

        assert_eq!(list_components(&catalog, None).len(), 3);
    }
}
