use async_trait::async_trait;
use thiserror::Error;

/// Key under which the whole quote list is stored as one document.
pub const SAVED_QUOTES_KEY: &str = "saved_quotes";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("store read failed: {0}")]
    Read(String),
    #[error("store write failed: {0}")]
    Write(String),
}

/// Coarse-grained document store: whole blobs in, whole blobs out.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    async fn save(&self, key: &str, blob: String) -> Result<(), PersistenceError>;
}
