use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::component::{Component, ComponentCategory, ComponentId};

/// An in-progress assembly: one optional base plus at most one component per category.
///
/// The base is also stored in the category map under its own category, so the map alone
/// is the full parts list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub base_component: Option<Component>,
    pub selected_components: BTreeMap<ComponentCategory, Component>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the base and discards every previously selected part.
    pub fn set_base_component(&mut self, component: Component) {
        self.selected_components = BTreeMap::from([(component.category, component.clone())]);
        self.base_component = Some(component);
    }

    pub fn add_component(&mut self, component: Component) -> Option<Component> {
        self.selected_components.insert(component.category, component)
    }

    pub fn remove_component(&mut self, category: ComponentCategory) -> Option<Component> {
        self.selected_components.remove(&category)
    }

    pub fn component_in(&self, category: ComponentCategory) -> Option<&Component> {
        self.selected_components.get(&category)
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.selected_components.values()
    }

    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.components().map(|component| component.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.selected_components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_components.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.base_component.is_some() && !self.selected_components.is_empty()
    }
}
