pub mod store;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink, AuditTrail};
use crate::domain::configuration::Configuration;
use crate::domain::pricing::BillOfMaterials;
use crate::domain::quote::{Quote, QuoteId, QuoteStatus};
use crate::errors::ApplicationError;

pub use self::store::{PersistenceError, PersistenceStore, SAVED_QUOTES_KEY};

pub const DEFAULT_QUOTE_PREFIX: &str = "QT";

/// Saved quotes plus the numbering and persistence rules around them.
///
/// The full list is written back to the store after every mutation; the in-memory list only
/// changes once that write succeeds.
pub struct QuoteLedger {
    store: Arc<dyn PersistenceStore>,
    number_prefix: String,
    quotes: Vec<Quote>,
    audit: Option<AuditTrail>,
}

impl QuoteLedger {
    pub async fn open(store: Arc<dyn PersistenceStore>) -> Self {
        Self::open_with_prefix(store, DEFAULT_QUOTE_PREFIX).await
    }

    /// Hydrates from the store. Missing or unreadable data yields an empty ledger.
    pub async fn open_with_prefix(
        store: Arc<dyn PersistenceStore>,
        number_prefix: impl Into<String>,
    ) -> Self {
        let mut ledger = Self { store, number_prefix: number_prefix.into(), quotes: Vec::new(), audit: None };
        ledger.reload().await;
        ledger
    }

    /// Records every save, delete and status change, including failed writes.
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>, context: AuditContext) -> Self {
        self.audit = Some(AuditTrail::new(sink, context));
        self
    }

    pub async fn reload(&mut self) {
        self.quotes = match self.store.load(SAVED_QUOTES_KEY).await {
            Ok(Some(blob)) => match decode_quotes(&blob) {
                Ok(quotes) => quotes,
                Err(error) => {
                    warn!(
                        event_name = "ledger.load_decode_failed",
                        error = %error,
                        "saved quotes could not be decoded; starting empty"
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(
                    event_name = "ledger.load_failed",
                    error = %error,
                    "saved quotes could not be read; starting empty"
                );
                Vec::new()
            }
        };
        info!(event_name = "ledger.loaded", quote_count = self.quotes.len(), "quote ledger loaded");
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn find(&self, id: &QuoteId) -> Option<&Quote> {
        self.quotes.iter().find(|quote| &quote.id == id)
    }

    pub fn generate_quote(
        &self,
        configuration: &Configuration,
        bill_of_materials: BillOfMaterials,
        notes: Option<String>,
    ) -> Quote {
        self.generate_quote_at(configuration, bill_of_materials, notes, Utc::now())
    }

    /// Builds a draft quote without saving it.
    pub fn generate_quote_at(
        &self,
        configuration: &Configuration,
        bill_of_materials: BillOfMaterials,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Quote {
        Quote {
            id: QuoteId(Uuid::new_v4().to_string()),
            quote_number: self.next_quote_number(now.date_naive()),
            configuration: configuration.clone(),
            bill_of_materials,
            created_date: now,
            status: QuoteStatus::Draft,
            notes,
        }
    }

    /// `PREFIX-YYYYMMDD-NNNN` where `NNNN` is the saved count plus one.
    ///
    /// Two unsaved quotes, concurrent ledgers or a delete followed by a save can all reuse
    /// a number.
    pub fn next_quote_number(&self, date: NaiveDate) -> String {
        format!("{}-{}-{:04}", self.number_prefix, date.format("%Y%m%d"), self.quotes.len() + 1)
    }

    /// Upserts by id: replaces in place when the id exists, appends otherwise.
    pub async fn save(&mut self, quote: Quote) -> Result<(), ApplicationError> {
        let mut next = self.quotes.clone();
        match next.iter_mut().find(|existing| existing.id == quote.id) {
            Some(existing) => *existing = quote.clone(),
            None => next.push(quote.clone()),
        }

        self.persist(next, "quote.saved", &quote.id).await?;
        info!(
            event_name = "ledger.quote_saved",
            quote_id = %quote.id,
            quote_number = %quote.quote_number,
            "quote saved"
        );
        Ok(())
    }

    /// Returns whether a quote was removed.
    pub async fn delete(&mut self, id: &QuoteId) -> Result<bool, ApplicationError> {
        let next: Vec<Quote> = self.quotes.iter().filter(|quote| &quote.id != id).cloned().collect();
        let removed = next.len() != self.quotes.len();

        self.persist(next, "quote.deleted", id).await?;
        info!(event_name = "ledger.quote_deleted", quote_id = %id, removed, "quote deleted");
        Ok(removed)
    }

    /// Any status may follow any other. Unknown ids are left alone and nothing is written.
    pub async fn update_status(
        &mut self,
        id: &QuoteId,
        status: QuoteStatus,
    ) -> Result<Option<Quote>, ApplicationError> {
        let Some(position) = self.quotes.iter().position(|quote| &quote.id == id) else {
            return Ok(None);
        };

        let mut next = self.quotes.clone();
        let updated = next[position].clone().with_status(status);
        next[position] = updated.clone();

        self.persist(next, "quote.status_updated", id).await?;
        info!(
            event_name = "ledger.status_updated",
            quote_id = %id,
            status = status.as_key(),
            "quote status updated"
        );
        Ok(Some(updated))
    }

    async fn persist(
        &mut self,
        next: Vec<Quote>,
        event_type: &str,
        quote_id: &QuoteId,
    ) -> Result<(), ApplicationError> {
        let written = match serde_json::to_string(&next) {
            Ok(blob) => self.store.save(SAVED_QUOTES_KEY, blob).await.map_err(|e| e.to_string()),
            Err(error) => Err(error.to_string()),
        };

        match written {
            Ok(()) => {
                self.record(event_type, quote_id, AuditOutcome::Success, None);
                self.quotes = next;
                Ok(())
            }
            Err(message) => {
                warn!(
                    event_name = "ledger.persist_failed",
                    quote_id = %quote_id,
                    error = %message,
                    "saved quotes could not be written; in-memory list unchanged"
                );
                self.record(event_type, quote_id, AuditOutcome::Failed, Some(&message));
                Err(ApplicationError::PersistenceWrite(message))
            }
        }
    }

    fn record(&self, event_type: &str, quote_id: &QuoteId, outcome: AuditOutcome, error: Option<&str>) {
        let Some(trail) = &self.audit else {
            return;
        };

        let mut event = trail
            .event(event_type, AuditCategory::Persistence, outcome)
            .for_quote(quote_id)
            .with_metadata("quote_count_before", self.quotes.len().to_string());
        if let Some(error) = error {
            event = event.with_metadata("error", error);
        }
        trail.emit(event);
    }
}

fn decode_quotes(blob: &str) -> Result<Vec<Quote>, ApplicationError> {
    serde_json::from_str(blob).map_err(|error| ApplicationError::PersistenceDecode(error.to_string()))
}
