use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use configurator_core::ledger::{PersistenceError, PersistenceStore};

/// Process-local document store for tests and dry runs.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, String>>,
}

impl InMemoryDocumentStore {
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl PersistenceStore for InMemoryDocumentStore {
    async fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let documents = self.documents.read().await;
        Ok(documents.get(key).cloned())
    }

    async fn save(&self, key: &str, blob: String) -> Result<(), PersistenceError> {
        let mut documents = self.documents.write().await;
        documents.insert(key.to_string(), blob);
        Ok(())
    }
}
