pub mod catalog;
pub mod compatibility;
pub mod pricing;

use std::sync::Arc;

use self::{catalog::CatalogProvider, compatibility::CompatibilityMatrix};

/// A catalog paired with the compatibility matrix derived from its rules.
///
/// Both halves are read-only once built, so one index can back any number of sessions.
/// Reloading rules means building a new index.
#[derive(Clone)]
pub struct CatalogIndex {
    catalog: Arc<dyn CatalogProvider>,
    matrix: Arc<CompatibilityMatrix>,
}

impl CatalogIndex {
    pub fn new<C>(catalog: C) -> Self
    where
        C: CatalogProvider + 'static,
    {
        Self::from_shared(Arc::new(catalog))
    }

    pub fn from_shared(catalog: Arc<dyn CatalogProvider>) -> Self {
        let matrix = Arc::new(CompatibilityMatrix::new(catalog.rules()));
        Self { catalog, matrix }
    }

    pub fn catalog(&self) -> &dyn CatalogProvider {
        self.catalog.as_ref()
    }

    pub fn matrix(&self) -> &CompatibilityMatrix {
        &self.matrix
    }
}

impl std::fmt::Debug for CatalogIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogIndex")
            .field("components", &self.catalog.all_components().len())
            .field("rules", &self.catalog.rules().len())
            .field("pricing_rules", &self.catalog.pricing_rules().len())
            .finish()
    }
}
