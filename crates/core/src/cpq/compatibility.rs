use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::component::{Component, ComponentCategory, ComponentId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRule {
    pub id: String,
    /// Anchor component the rule is keyed on.
    pub required_component_id: ComponentId,
    pub compatible_component_ids: Vec<ComponentId>,
    pub category: ComponentCategory,
    /// Reserved; not consulted when matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<BTreeMap<String, String>>,
}

/// Read-only index of compatibility rules grouped by anchor id.
#[derive(Clone, Debug, Default)]
pub struct CompatibilityMatrix {
    rules_by_anchor: HashMap<ComponentId, Vec<CompatibilityRule>>,
}

impl CompatibilityMatrix {
    pub fn new(rules: &[CompatibilityRule]) -> Self {
        let mut rules_by_anchor: HashMap<ComponentId, Vec<CompatibilityRule>> = HashMap::new();
        for rule in rules {
            rules_by_anchor.entry(rule.required_component_id.clone()).or_default().push(rule.clone());
        }
        Self { rules_by_anchor }
    }

    pub fn rules_for(&self, anchor: &ComponentId) -> &[CompatibilityRule] {
        self.rules_by_anchor.get(anchor).map(Vec::as_slice).unwrap_or_default()
    }

    /// Components of `category` allowed alongside `anchor`.
    ///
    /// When no rule constrains `anchor` in `category`, the whole category is returned:
    /// the absence of a rule is not a prohibition.
    pub fn compatible_components(
        &self,
        anchor: &ComponentId,
        category: ComponentCategory,
        catalog: &[Component],
    ) -> Vec<Component> {
        let matching: Vec<&CompatibilityRule> =
            self.rules_for(anchor).iter().filter(|rule| rule.category == category).collect();

        if matching.is_empty() {
            return catalog.iter().filter(|c| c.category == category).cloned().collect();
        }

        let allowed: HashSet<&ComponentId> =
            matching.iter().flat_map(|rule| rule.compatible_component_ids.iter()).collect();

        catalog.iter().filter(|c| allowed.contains(&c.id)).cloned().collect()
    }

    /// Every ruled id must have at least one ally among the other ids for each of its
    /// non-empty allow-lists.
    ///
    /// This is not a full pairwise check: two unruled parts are never tested against each
    /// other, and a ruled part is satisfied by any single ally.
    pub fn mutually_compatible(&self, ids: &[ComponentId]) -> bool {
        ids.iter().all(|id| {
            let others: Vec<&ComponentId> = ids.iter().filter(|other| *other != id).collect();
            if others.is_empty() {
                return true;
            }

            self.rules_for(id).iter().all(|rule| {
                rule.compatible_component_ids.is_empty()
                    || others.iter().any(|other| rule.compatible_component_ids.contains(other))
            })
        })
    }
}
