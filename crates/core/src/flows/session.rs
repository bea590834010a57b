use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink, AuditTrail};
use crate::cpq::pricing::{DeterministicPricingEngine, PricingEngine};
use crate::cpq::CatalogIndex;
use crate::domain::component::{Component, ComponentCategory, ComponentId};
use crate::domain::configuration::Configuration;
use crate::domain::pricing::BillOfMaterials;
use crate::domain::quote::Quote;
use crate::errors::{ApplicationError, DomainError};
use crate::flows::engine::StepEngine;
use crate::flows::states::{SessionStep, StepAction, StepContext, StepEvent, TransitionOutcome};
use crate::ledger::QuoteLedger;

/// Components a user may pick, per category. Every category has an entry.
pub type AvailabilityMap = BTreeMap<ComponentCategory, Vec<Component>>;

/// One user's in-progress configuration.
///
/// Every mutating call recomputes the availability map from scratch and returns it.
/// Calls must be serialized by the owner; nothing here is shared between sessions except
/// the read-only catalog index.
pub struct ConfigurationSession {
    index: CatalogIndex,
    pricing: Arc<dyn PricingEngine>,
    engine: StepEngine,
    step: SessionStep,
    configuration: Configuration,
    available: AvailabilityMap,
    bill_of_materials: Option<BillOfMaterials>,
    current_quote: Option<Quote>,
    audit: Option<AuditTrail>,
}

impl ConfigurationSession {
    pub fn new(index: CatalogIndex) -> Self {
        Self::with_pricing(index, Arc::new(DeterministicPricingEngine::default()))
    }

    pub fn with_pricing(index: CatalogIndex, pricing: Arc<dyn PricingEngine>) -> Self {
        let configuration = Configuration::new();
        let available = resolve_availability(&index, &configuration);
        let engine = StepEngine;
        Self {
            index,
            pricing,
            step: engine.initial_step(),
            engine,
            configuration,
            available,
            bill_of_materials: None,
            current_quote: None,
            audit: None,
        }
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>, context: AuditContext) -> Self {
        self.audit = Some(AuditTrail::new(sink, context));
        self
    }

    pub fn step(&self) -> SessionStep {
        self.step
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn availability(&self) -> &AvailabilityMap {
        &self.available
    }

    pub fn available(&self, category: ComponentCategory) -> &[Component] {
        self.available.get(&category).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn bill_of_materials(&self) -> Option<&BillOfMaterials> {
        self.bill_of_materials.as_ref()
    }

    pub fn current_quote(&self) -> Option<&Quote> {
        self.current_quote.as_ref()
    }

    /// Whether the current selection passes the mutual compatibility check.
    pub fn is_mutually_compatible(&self) -> bool {
        self.index.matrix().mutually_compatible(&self.configuration.component_ids())
    }

    pub fn is_selected(&self, component: &Component) -> bool {
        self.configuration
            .component_in(component.category)
            .is_some_and(|selected| selected.id == component.id)
    }

    /// Sets the base and drops every other part chosen so far.
    pub fn select_base(&mut self, id: &ComponentId) -> Result<&AvailabilityMap, DomainError> {
        let component = self.index.catalog().require_component(id)?.clone();
        if !component.category.is_base() {
            return Err(DomainError::InvalidSelection(format!(
                "{id} is a {} and cannot be used as the base component",
                component.category
            )));
        }

        info!(event_name = "session.base_selected", component_id = %id, "base component selected");
        self.configuration.set_base_component(component);
        Ok(self.recompute())
    }

    /// Adds a part, replacing whatever was chosen in its category. Base units are routed to
    /// [`Self::select_base`].
    ///
    /// The availability map is what a caller should offer; it is not enforced here. Use
    /// [`Self::is_mutually_compatible`] to check the resulting selection.
    pub fn select_component(&mut self, id: &ComponentId) -> Result<&AvailabilityMap, DomainError> {
        let component = self.index.catalog().require_component(id)?.clone();
        if component.category.is_base() {
            return self.select_base(id);
        }
        if self.configuration.base_component.is_none() {
            return Err(DomainError::InvalidSelection(format!(
                "select a base component before adding {id}"
            )));
        }
        info!(
            event_name = "session.component_selected",
            component_id = %id,
            category = component.category.as_key(),
            "component selected"
        );
        self.configuration.add_component(component);
        Ok(self.recompute())
    }

    /// Removes the part in `category`. Removing the base category clears the whole
    /// configuration, since nothing else is selectable without a base.
    pub fn deselect(&mut self, category: ComponentCategory) -> &AvailabilityMap {
        if category.is_base() {
            self.configuration = Configuration::new();
        } else {
            self.configuration.remove_component(category);
        }

        info!(
            event_name = "session.component_deselected",
            category = category.as_key(),
            "component deselected"
        );
        self.recompute()
    }

    pub fn next(&mut self) -> Result<TransitionOutcome, DomainError> {
        let outcome = self.transition(StepEvent::Next)?;
        debug!(event_name = "session.step_changed", from = ?outcome.from, to = ?outcome.to, "step advanced");
        Ok(outcome)
    }

    /// Moves one step back. Never fails; from the first step it stays put.
    pub fn back(&mut self) -> TransitionOutcome {
        let outcome = self.transition(StepEvent::Back).unwrap_or(TransitionOutcome {
            from: self.step,
            to: self.step,
            event: StepEvent::Back,
            actions: Vec::new(),
        });
        debug!(event_name = "session.step_changed", from = ?outcome.from, to = ?outcome.to, "step reversed");
        outcome
    }

    /// Prices the current configuration and keeps the result for review.
    pub fn compute_bill_of_materials(&mut self) -> Result<&BillOfMaterials, DomainError> {
        if self.configuration.base_component.is_none() {
            return Err(DomainError::InvalidSelection(
                "cannot finalize a configuration without a base component".to_string(),
            ));
        }

        let priced = self.pricing.price(&self.configuration, self.index.catalog().pricing_rules());
        if let Some(trail) = &self.audit {
            let event = match &priced {
                Ok(bill) => trail
                    .event("pricing.bom_computed", AuditCategory::Pricing, AuditOutcome::Success)
                    .with_metadata("items", bill.items.len().to_string())
                    .with_metadata("total", bill.total.to_string()),
                Err(error) => trail
                    .event("pricing.bom_computed", AuditCategory::Pricing, AuditOutcome::Failed)
                    .with_metadata("error", error.to_string()),
            };
            trail.emit(event);
        }

        Ok(self.bill_of_materials.insert(priced?))
    }

    /// Wraps the reviewed configuration into a draft quote. The caller decides whether to
    /// save it.
    pub fn generate_quote(
        &mut self,
        ledger: &QuoteLedger,
        notes: Option<String>,
    ) -> Result<Quote, ApplicationError> {
        let bill = self.bill_of_materials.clone().ok_or_else(|| {
            DomainError::InvalidSelection(
                "a bill of materials must be computed before generating a quote".to_string(),
            )
        })?;

        let quote = ledger.generate_quote(&self.configuration, bill, notes);
        if let Some(trail) = &self.audit {
            trail.emit(
                trail
                    .event("quote.generated", AuditCategory::Quote, AuditOutcome::Success)
                    .for_quote(&quote.id)
                    .with_metadata("quote_number", quote.quote_number.clone()),
            );
        }
        self.current_quote = Some(quote.clone());
        Ok(quote)
    }

    pub fn reset(&mut self) -> &AvailabilityMap {
        self.configuration = Configuration::new();
        self.step = self.engine.initial_step();
        self.bill_of_materials = None;
        self.current_quote = None;
        self.recompute()
    }

    /// Applies a step move and runs its actions; the step only changes when both succeed.
    fn transition(&mut self, event: StepEvent) -> Result<TransitionOutcome, DomainError> {
        let context =
            StepContext { has_base_component: self.configuration.base_component.is_some() };
        let result = self
            .engine
            .apply(self.step, event, &context)
            .map_err(DomainError::from)
            .and_then(|outcome| {
                self.run_actions(&outcome.actions)?;
                Ok(outcome)
            });

        if let Some(trail) = &self.audit {
            trail.emit(self.engine.audit_event(trail.context(), self.step, event, &result));
        }

        let outcome = result?;
        self.step = outcome.to;
        Ok(outcome)
    }

    fn run_actions(&mut self, actions: &[StepAction]) -> Result<(), DomainError> {
        for action in actions {
            match action {
                StepAction::ComputeBillOfMaterials => {
                    self.compute_bill_of_materials()?;
                }
            }
        }
        Ok(())
    }

    fn recompute(&mut self) -> &AvailabilityMap {
        self.available = resolve_availability(&self.index, &self.configuration);
        &self.available
    }
}

/// Full, non-incremental availability computation.
///
/// Without a base only base units are offered. With a base, a candidate is offered when the
/// base's rules allow it in its category and the whole current selection plus the candidate
/// passes [`crate::cpq::compatibility::CompatibilityMatrix::mutually_compatible`].
pub fn resolve_availability(index: &CatalogIndex, configuration: &Configuration) -> AvailabilityMap {
    let catalog = index.catalog();
    let mut available: AvailabilityMap = ComponentCategory::ALL
        .into_iter()
        .map(|category| (category, Vec::new()))
        .collect();
    available.insert(ComponentCategory::BaseUnit, catalog.components_in(ComponentCategory::BaseUnit));

    let Some(base) = &configuration.base_component else {
        return available;
    };

    let selected = configuration.component_ids();
    for category in ComponentCategory::ALL.into_iter().filter(|category| !category.is_base()) {
        let compatible = index
            .matrix()
            .compatible_components(&base.id, category, catalog.all_components())
            .into_iter()
            .filter(|candidate| {
                let mut ids = selected.clone();
                ids.push(candidate.id.clone());
                index.matrix().mutually_compatible(&ids)
            })
            .collect();

        available.insert(category, compatible);
    }

    available
}
