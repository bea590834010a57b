use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use configurator_core::ledger::{PersistenceError, PersistenceStore};

use super::RepositoryError;
use crate::DbPool;

/// Key/blob store over the `document_store` table.
pub struct SqlDocumentStore {
    pool: DbPool,
}

impl SqlDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn read(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let blob = sqlx::query_scalar::<_, String>("SELECT blob FROM document_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(blob)
    }

    pub async fn write(&self, key: &str, blob: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO document_store (key, blob, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 blob = excluded.blob,
                 updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(blob)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(event_name = "persistence.document_written", key, bytes = blob.len(), "document saved");
        Ok(())
    }
}

#[async_trait]
impl PersistenceStore for SqlDocumentStore {
    async fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.read(key).await.map_err(|error| PersistenceError::Read(error.to_string()))
    }

    async fn save(&self, key: &str, blob: String) -> Result<(), PersistenceError> {
        self.write(key, &blob).await.map_err(|error| PersistenceError::Write(error.to_string()))
    }
}
