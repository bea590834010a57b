use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::domain::component::ComponentId;
use crate::domain::configuration::Configuration;
use crate::domain::pricing::{BillOfMaterials, BomItem, PricingAdjustment, PricingRule, PricingRuleType};
use crate::errors::DomainError;

pub const ASSEMBLY_FEE_ID: &str = "ASSEMBLY-FEE";
pub const ASSEMBLY_FEE_DESCRIPTION: &str = "Professional assembly and testing";

/// Fixed constants applied on top of the catalog's pricing rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingPolicy {
    pub tax_rate: Decimal,
    pub assembly_fee: Decimal,
    /// Minimum number of selected components that triggers customization fees.
    pub customization_threshold: usize,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(85, 3),
            assembly_fee: Decimal::new(9_999, 2),
            customization_threshold: 6,
        }
    }
}

pub trait PricingEngine: Send + Sync {
    fn price(
        &self,
        configuration: &Configuration,
        rules: &[PricingRule],
    ) -> Result<BillOfMaterials, DomainError>;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicPricingEngine {
    policy: PricingPolicy,
}

impl DeterministicPricingEngine {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }
}

impl PricingEngine for DeterministicPricingEngine {
    fn price(
        &self,
        configuration: &Configuration,
        rules: &[PricingRule],
    ) -> Result<BillOfMaterials, DomainError> {
        price_configuration(configuration, rules, &self.policy, Utc::now())
    }
}

fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Builds the bill of materials. Rounding happens only on bundle discounts and on tax.
pub fn price_configuration(
    configuration: &Configuration,
    rules: &[PricingRule],
    policy: &PricingPolicy,
    generated_date: DateTime<Utc>,
) -> Result<BillOfMaterials, DomainError> {
    if configuration.is_empty() {
        return Err(DomainError::InvalidSelection(
            "cannot price a configuration with no components".to_string(),
        ));
    }

    let items: Vec<BomItem> =
        configuration.components().map(|component| BomItem::new(component.clone(), 1)).collect();
    let subtotal: Decimal = items.iter().map(|item| item.line_total).sum();

    let (discounts, mut additional_charges) = apply_pricing_rules(configuration, rules, policy);
    additional_charges.push(PricingAdjustment {
        id: ASSEMBLY_FEE_ID.to_string(),
        description: ASSEMBLY_FEE_DESCRIPTION.to_string(),
        amount: policy.assembly_fee,
    });

    let discount_total: Decimal = discounts.iter().map(|adjustment| adjustment.amount).sum();
    let charge_total: Decimal = additional_charges.iter().map(|adjustment| adjustment.amount).sum();

    let taxable = subtotal - discount_total + charge_total;
    let tax = round_currency(taxable * policy.tax_rate);
    let total = subtotal - discount_total + charge_total + tax;

    debug!(
        event_name = "pricing.bom_computed",
        item_count = items.len(),
        subtotal = %subtotal,
        discount_total = %discount_total,
        charge_total = %charge_total,
        tax = %tax,
        total = %total,
        "bill of materials computed"
    );

    Ok(BillOfMaterials { items, subtotal, discounts, additional_charges, tax, total, generated_date })
}

fn apply_pricing_rules(
    configuration: &Configuration,
    rules: &[PricingRule],
    policy: &PricingPolicy,
) -> (Vec<PricingAdjustment>, Vec<PricingAdjustment>) {
    let mut discounts = Vec::new();
    let mut charges = Vec::new();
    let selected: HashSet<&ComponentId> = configuration.components().map(|c| &c.id).collect();

    for rule in rules {
        match rule.rule_type {
            PricingRuleType::BundleDiscount => {
                let bundle: HashSet<&ComponentId> = rule.component_ids.iter().collect();
                if bundle.is_empty() || !bundle.is_subset(&selected) {
                    continue;
                }
                let Some(percentage) = rule.discount_percentage else {
                    continue;
                };

                let bundle_total: Decimal = configuration
                    .components()
                    .filter(|component| bundle.contains(&component.id))
                    .map(|component| component.base_price)
                    .sum();

                discounts.push(PricingAdjustment {
                    id: rule.id.clone(),
                    description: rule.description.clone(),
                    amount: round_currency(bundle_total * percentage / Decimal::ONE_HUNDRED),
                });
            }
            PricingRuleType::CustomizationFee => {
                if configuration.len() < policy.customization_threshold {
                    continue;
                }
                if let Some(charge) = rule.additional_charge {
                    charges.push(PricingAdjustment {
                        id: rule.id.clone(),
                        description: rule.description.clone(),
                        amount: charge,
                    });
                }
            }
            // Recognized but not priced yet.
            PricingRuleType::CompatibilityCharge | PricingRuleType::VolumeDiscount => {}
        }
    }

    (discounts, charges)
}
