use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::component::{Component, ComponentId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingRuleType {
    BundleDiscount,
    CompatibilityCharge,
    VolumeDiscount,
    CustomizationFee,
}

impl PricingRuleType {
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::BundleDiscount => "bundle_discount",
            Self::CompatibilityCharge => "compatibility_charge",
            Self::VolumeDiscount => "volume_discount",
            Self::CustomizationFee => "customization_fee",
        }
    }
}

impl std::str::FromStr for PricingRuleType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bundle_discount" => Ok(Self::BundleDiscount),
            "compatibility_charge" => Ok(Self::CompatibilityCharge),
            "volume_discount" => Ok(Self::VolumeDiscount),
            "customization_fee" => Ok(Self::CustomizationFee),
            other => Err(format!("unsupported pricing rule type `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: String,
    pub rule_type: PricingRuleType,
    /// Bundle members; empty for rules not keyed on specific parts.
    #[serde(default)]
    pub component_ids: Vec<ComponentId>,
    /// Percentage in 0..=100.
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub additional_charge: Option<Decimal>,
    pub description: String,
}

/// A discount or surcharge line. Discounts are stored as positive magnitudes and
/// subtracted by the bill of materials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingAdjustment {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomItem {
    pub id: ComponentId,
    pub component: Component,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl BomItem {
    pub fn new(component: Component, quantity: u32) -> Self {
        let unit_price = component.base_price;
        Self {
            id: component.id.clone(),
            line_total: unit_price * Decimal::from(quantity),
            component,
            quantity,
            unit_price,
        }
    }
}

/// Priced snapshot of a configuration. Recomputed wholesale, never patched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillOfMaterials {
    pub items: Vec<BomItem>,
    pub subtotal: Decimal,
    pub discounts: Vec<PricingAdjustment>,
    pub additional_charges: Vec<PricingAdjustment>,
    pub tax: Decimal,
    pub total: Decimal,
    pub generated_date: DateTime<Utc>,
}

impl BillOfMaterials {
    pub fn discount_total(&self) -> Decimal {
        self.discounts.iter().map(|adjustment| adjustment.amount).sum()
    }

    pub fn charge_total(&self) -> Decimal {
        self.additional_charges.iter().map(|adjustment| adjustment.amount).sum()
    }

    /// Equality ignoring `generated_date`.
    pub fn same_pricing_as(&self, other: &Self) -> bool {
        self.items == other.items
            && self.subtotal == other.subtotal
            && self.discounts == other.discounts
            && self.additional_charges == other.additional_charges
            && self.tax == other.tax
            && self.total == other.total
    }
}
