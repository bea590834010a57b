use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::configuration::Configuration;
use crate::domain::pricing::{BillOfMaterials, PricingAdjustment};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl std::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl QuoteStatus {
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!(
                "unsupported quote status `{other}` (expected draft|submitted|approved|rejected)"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub quote_number: String,
    pub configuration: Configuration,
    pub bill_of_materials: BillOfMaterials,
    pub created_date: DateTime<Utc>,
    pub status: QuoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Quote {
    /// Status changes are unrestricted: any status may follow any other.
    pub fn with_status(mut self, status: QuoteStatus) -> Self {
        self.status = status;
        self
    }

    /// Fully resolved, render-ready view for document generators.
    pub fn export(&self) -> QuoteExport {
        let bill = &self.bill_of_materials;
        QuoteExport {
            quote_number: self.quote_number.clone(),
            status: self.status,
            created_date: self.created_date,
            generated_date: bill.generated_date,
            base_component: self.configuration.base_component.as_ref().map(|c| c.name.clone()),
            lines: bill
                .items
                .iter()
                .map(|item| QuoteExportLine {
                    part_number: item.component.part_number.clone(),
                    name: item.component.name.clone(),
                    category: item.component.category.label().to_owned(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    line_total: item.line_total,
                })
                .collect(),
            subtotal: bill.subtotal,
            discounts: bill.discounts.clone(),
            additional_charges: bill.additional_charges.clone(),
            tax: bill.tax,
            total: bill.total,
            notes: self.notes.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuoteExportLine {
    pub part_number: String,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuoteExport {
    pub quote_number: String,
    pub status: QuoteStatus,
    pub created_date: DateTime<Utc>,
    pub generated_date: DateTime<Utc>,
    pub base_component: Option<String>,
    pub lines: Vec<QuoteExportLine>,
    pub subtotal: Decimal,
    pub discounts: Vec<PricingAdjustment>,
    pub additional_charges: Vec<PricingAdjustment>,
    pub tax: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{Quote, QuoteId, QuoteStatus};
    use crate::domain::component::{Component, ComponentCategory};
    use crate::domain::configuration::Configuration;
    use crate::domain::pricing::{BillOfMaterials, BomItem, PricingAdjustment};

    fn quote(status: QuoteStatus) -> Quote {
        let base = Component::new(
            "BASE-001",
            "Industrial Base Unit Alpha",
            ComponentCategory::BaseUnit,
            "IBU-ALPHA-1000",
            Decimal::new(129_999, 2),
        );
        let mut configuration = Configuration::new();
        configuration.set_base_component(base.clone());

        Quote {
            id: QuoteId("3f1e0c1a-0000-4000-8000-000000000001".to_owned()),
            quote_number: "QT-20260101-0001".to_owned(),
            configuration,
            bill_of_materials: BillOfMaterials {
                items: vec![BomItem::new(base, 1)],
                subtotal: Decimal::new(129_999, 2),
                discounts: Vec::new(),
                additional_charges: vec![PricingAdjustment {
                    id: "ASSEMBLY-FEE".to_owned(),
                    description: "Professional assembly and testing".to_owned(),
                    amount: Decimal::new(9_999, 2),
                }],
                tax: Decimal::new(11_900, 2),
                total: Decimal::new(151_898, 2),
                generated_date: Utc::now(),
            },
            created_date: Utc::now(),
            status,
            notes: Some("Rush order".to_owned()),
        }
    }

    #[test]
    fn any_status_may_follow_any_other() {
        let rejected = quote(QuoteStatus::Approved).with_status(QuoteStatus::Rejected);
        assert_eq!(rejected.status, QuoteStatus::Rejected);

        let draft = rejected.with_status(QuoteStatus::Draft);
        assert_eq!(draft.status, QuoteStatus::Draft);
    }

    #[test]
    fn export_carries_resolved_lines_and_totals() {
        let quote = quote(QuoteStatus::Submitted);
        let export = quote.export();

        assert_eq!(export.quote_number, "QT-20260101-0001");
        assert_eq!(export.base_component.as_deref(), Some("Industrial Base Unit Alpha"));
        assert_eq!(export.lines.len(), 1);
        assert_eq!(export.lines[0].part_number, "IBU-ALPHA-1000");
        assert_eq!(export.lines[0].category, "Base Unit");
        assert_eq!(export.additional_charges.len(), 1);
        assert_eq!(export.total, quote.bill_of_materials.total);
        assert_eq!(export.notes.as_deref(), Some("Rush order"));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Approved".parse::<QuoteStatus>(), Ok(QuoteStatus::Approved));
        assert!("sent".parse::<QuoteStatus>().is_err());
    }
}
