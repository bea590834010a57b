use async_trait::async_trait;
use thiserror::Error;

use configurator_core::cpq::catalog::StaticCatalog;

pub mod catalog;
pub mod document;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use document::SqlDocumentStore;
pub use memory::InMemoryDocumentStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Reads every component and rule in catalog order.
    async fn load(&self) -> Result<StaticCatalog, RepositoryError>;
}
