use crate::cpq::compatibility::CompatibilityRule;
use crate::domain::component::{Component, ComponentCategory, ComponentId};
use crate::domain::pricing::PricingRule;
use crate::errors::DomainError;

/// Read-only source of parts and rules. Implementations are never mutated by the engine.
pub trait CatalogProvider: Send + Sync {
    fn all_components(&self) -> &[Component];
    fn rules(&self) -> &[CompatibilityRule];
    fn pricing_rules(&self) -> &[PricingRule];

    fn components_in(&self, category: ComponentCategory) -> Vec<Component> {
        self.all_components().iter().filter(|c| c.category == category).cloned().collect()
    }

    fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.all_components().iter().find(|component| &component.id == id)
    }

    fn require_component(&self, id: &ComponentId) -> Result<&Component, DomainError> {
        self.component(id).ok_or_else(|| DomainError::UnknownComponentId(id.clone()))
    }
}

/// Catalog held fully in memory, e.g. fabricated for tests or loaded from storage.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    components: Vec<Component>,
    rules: Vec<CompatibilityRule>,
    pricing_rules: Vec<PricingRule>,
}

impl StaticCatalog {
    pub fn new(
        components: Vec<Component>,
        rules: Vec<CompatibilityRule>,
        pricing_rules: Vec<PricingRule>,
    ) -> Self {
        Self { components, rules, pricing_rules }
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl CatalogProvider for StaticCatalog {
    fn all_components(&self) -> &[Component] {
        &self.components
    }

    fn rules(&self) -> &[CompatibilityRule] {
        &self.rules
    }

    fn pricing_rules(&self) -> &[PricingRule] {
        &self.pricing_rules
    }
}
