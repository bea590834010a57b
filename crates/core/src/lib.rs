pub mod audit;
pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod ledger;

pub use cpq::catalog::{CatalogProvider, StaticCatalog};
pub use cpq::compatibility::{CompatibilityMatrix, CompatibilityRule};
pub use cpq::pricing::{DeterministicPricingEngine, PricingEngine, PricingPolicy};
pub use cpq::CatalogIndex;
pub use domain::component::{Component, ComponentCategory, ComponentId};
pub use domain::configuration::Configuration;
pub use domain::pricing::{BillOfMaterials, BomItem, PricingAdjustment, PricingRule, PricingRuleType};
pub use domain::quote::{Quote, QuoteExport, QuoteId, QuoteStatus};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{AvailabilityMap, ConfigurationSession, SessionStep};
pub use ledger::{PersistenceError, PersistenceStore, QuoteLedger};
