use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub String);

impl ComponentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentCategory {
    BaseUnit,
    Motor,
    Gearbox,
    Controller,
    Sensor,
    Housing,
    Connector,
    MountingBracket,
}

impl ComponentCategory {
    /// Every category in selection-screen order.
    pub const ALL: [ComponentCategory; 8] = [
        Self::BaseUnit,
        Self::Motor,
        Self::Gearbox,
        Self::Controller,
        Self::Sensor,
        Self::Housing,
        Self::Connector,
        Self::MountingBracket,
    ];

    pub fn as_key(&self) -> &'static str {
        match self {
            Self::BaseUnit => "base_unit",
            Self::Motor => "motor",
            Self::Gearbox => "gearbox",
            Self::Controller => "controller",
            Self::Sensor => "sensor",
            Self::Housing => "housing",
            Self::Connector => "connector",
            Self::MountingBracket => "mounting_bracket",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BaseUnit => "Base Unit",
            Self::Motor => "Motor",
            Self::Gearbox => "Gearbox",
            Self::Controller => "Controller",
            Self::Sensor => "Sensor",
            Self::Housing => "Housing",
            Self::Connector => "Connector",
            Self::MountingBracket => "Mounting Bracket",
        }
    }

    pub fn is_base(&self) -> bool {
        matches!(self, Self::BaseUnit)
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ComponentCategory {
    type Err = DomainError;

    /// Accepts either the storage key (`mounting_bracket`) or the display label
    /// (`Mounting Bracket`), case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|category| category.as_key() == normalized)
            .ok_or_else(|| DomainError::UnknownCategory(value.trim().to_owned()))
    }
}

/// A catalog part. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    pub category: ComponentCategory,
    pub description: String,
    pub part_number: String,
    pub base_price: Decimal,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    /// Informational only; the compatibility matrix never reads these.
    #[serde(default)]
    pub compatibility_tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_file_name: Option<String>,
}

impl Component {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ComponentCategory,
        part_number: impl Into<String>,
        base_price: Decimal,
    ) -> Self {
        Self {
            id: ComponentId(id.into()),
            name: name.into(),
            category,
            description: String::new(),
            part_number: part_number.into(),
            base_price,
            specifications: BTreeMap::new(),
            compatibility_tags: BTreeSet::new(),
            image_url: None,
            model_file_name: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_specification(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.specifications.insert(label.into(), value.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compatibility_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_model_file(mut self, model_file_name: impl Into<String>) -> Self {
        self.model_file_name = Some(model_file_name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Component, ComponentCategory};
    use crate::errors::DomainError;

    #[test]
    fn category_parses_keys_and_labels() {
        assert_eq!("motor".parse::<ComponentCategory>(), Ok(ComponentCategory::Motor));
        assert_eq!(
            "Mounting Bracket".parse::<ComponentCategory>(),
            Ok(ComponentCategory::MountingBracket)
        );
        assert_eq!("BASE_UNIT".parse::<ComponentCategory>(), Ok(ComponentCategory::BaseUnit));
    }

    #[test]
    fn unknown_category_fails_fast() {
        let error = "turbine".parse::<ComponentCategory>().expect_err("turbine is not a category");
        assert_eq!(error, DomainError::UnknownCategory("turbine".to_owned()));
    }

    #[test]
    fn component_serializes_category_as_snake_case_key() {
        let component = Component::new(
            "MOUNT-001",
            "Universal Mounting Bracket Set",
            ComponentCategory::MountingBracket,
            "MOUNT-UNIV-SET",
            Decimal::new(12_999, 2),
        )
        .with_specification("Material", "Steel")
        .with_tags(["heavy-duty", "compact"]);

        let json = serde_json::to_value(&component).expect("serialize component");
        assert_eq!(json["category"], "mounting_bracket");
        assert_eq!(json["base_price"], "129.99");
        assert!(json.get("image_url").is_none());

        let decoded: Component = serde_json::from_value(json).expect("decode component");
        assert_eq!(decoded, component);
    }
}
