//! The import queue
//!
//! Owns the item list; all mutation happens here, between suspension
//! points, so no two tasks ever touch the same item concurrently. Lookups
//! run in fixed-size batches with a pacing delay, slow enough for the
//! lookup endpoint's rate tolerance while beating strictly serial
//! processing.

use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use uuid::Uuid;

use schulbib_domain::Book;
use schulbib_store::{BookStore, StoreError};

use crate::cancel::CancelToken;
use crate::client::BookLookupClient;
use crate::item::{EditableBook, FieldValue, ImportItem, ImportStatus};

/// Lookups dispatched per batch.
pub const CONCURRENCY: usize = 3;

/// Pause between batches.
pub const BATCH_DELAY: Duration = Duration::from_millis(500);

/// Progress readout of a processing run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportProgress {
    /// Items whose lookup settled (success or error) this run.
    pub current: usize,
    /// Items that were pending when the run started.
    pub total: usize,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unbekannter Eintrag: {0}")]
    UnknownItem(Uuid),
    #[error("Eintrag hat keine Daten: {0}")]
    NoData(Uuid),
    #[error("Eintrag ist bereits gespeichert: {0}")]
    NotEditable(Uuid),
    #[error("Eintrag ist nicht bereit zum Speichern: {0}")]
    NotReady(Uuid),
    #[error("Unbekanntes Feld: {0}")]
    UnknownField(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a commit-all pass.
#[derive(Debug, Default)]
pub struct CommitSummary {
    pub saved: usize,
    pub failed: Vec<(Uuid, String)>,
}

#[derive(Default)]
pub struct ImportQueue {
    items: Vec<ImportItem>,
}

impl ImportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ImportItem] {
        &self.items
    }

    pub fn item(&self, id: Uuid) -> Option<&ImportItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Split pasted input into one pending item per non-blank line.
    /// Returns the number of items added.
    pub fn enqueue(&mut self, input: &str) -> usize {
        let added: Vec<ImportItem> = input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ImportItem::pending)
            .collect();
        let count = added.len();
        self.items.extend(added);
        count
    }

    /// Remove one item, whatever its status.
    pub fn remove(&mut self, id: Uuid) {
        self.items.retain(|item| item.id != id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Run the lookup over all pending items.
    ///
    /// Batches of `CONCURRENCY` are dispatched concurrently and awaited as
    /// a set; the next batch starts only after the previous one settled
    /// and `BATCH_DELAY` elapsed. The cancel token is checked before each
    /// batch and raced against every in-flight call; aborted items keep
    /// their current status so a user stop never reads as a failure.
    pub async fn process<C>(&mut self, client: &C, cancel: &CancelToken) -> ImportProgress
    where
        C: BookLookupClient + ?Sized,
    {
        let pending: Vec<(Uuid, String)> = self
            .items
            .iter()
            .filter(|item| item.status == ImportStatus::Pending)
            .map(|item| (item.id, item.original_query.clone()))
            .collect();

        let total = pending.len();
        let mut current = 0;
        tracing::info!(total, "starting import run");

        let mut batches = pending.chunks(CONCURRENCY).peekable();
        while let Some(batch) = batches.next() {
            if cancel.is_cancelled() {
                break;
            }

            for (id, _) in batch {
                self.set_status(*id, ImportStatus::Loading);
            }

            let lookups = batch.iter().map(|(id, query)| {
                let id = *id;
                let cancel = cancel.clone();
                async move {
                    tokio::select! {
                        result = client.lookup(query) => (id, Some(result)),
                        _ = cancel.cancelled() => (id, None),
                    }
                }
            });

            for (id, settled) in join_all(lookups).await {
                match settled {
                    // Aborted mid-flight: leave the item untouched.
                    None => {}
                    Some(Ok(reply)) => {
                        current += 1;
                        if reply.success {
                            if let Some(record) = reply.data {
                                self.apply_success(id, EditableBook::from(record));
                                continue;
                            }
                        }
                        let message = reply
                            .error
                            .unwrap_or_else(|| "Keine Daten gefunden".to_string());
                        self.apply_error(id, message);
                    }
                    Some(Err(error)) => {
                        current += 1;
                        self.apply_error(id, error.to_string());
                    }
                }
            }
            tracing::info!(current, total, "import progress");

            if batches.peek().is_some() && !cancel.is_cancelled() {
                tokio::time::sleep(BATCH_DELAY).await;
            }
        }

        ImportProgress { current, total }
    }

    /// Edit one field of a looked-up item. Saved items are immutable.
    pub fn update_field(
        &mut self,
        id: Uuid,
        field: &str,
        value: FieldValue,
    ) -> Result<(), ImportError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(ImportError::UnknownItem(id))?;
        if item.status == ImportStatus::Saved {
            return Err(ImportError::NotEditable(id));
        }
        let data = item.data.as_mut().ok_or(ImportError::NoData(id))?;

        match (field, value) {
            ("title", FieldValue::Text(v)) => data.title = v,
            ("author", FieldValue::Text(v)) => data.author = v,
            ("isbn", FieldValue::Text(v)) => data.isbn = v,
            ("publisher", FieldValue::Text(v)) => data.publisher = v,
            ("subject", FieldValue::Text(v)) => data.subject = v,
            ("description", FieldValue::Text(v)) => data.description = v,
            ("year", FieldValue::Text(v)) => data.year = v,
            ("level", FieldValue::Text(v)) => data.level = v,
            ("type", FieldValue::Text(v)) => data.media_type = v,
            ("school", FieldValue::Text(v)) => data.school = v,
            ("location", FieldValue::Text(v)) => data.location = v,
            ("available", FieldValue::Flag(v)) => data.available = v,
            ("has_pdf", FieldValue::Flag(v)) => data.has_pdf = v,
            (other, _) => return Err(ImportError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Commit one looked-up item into the store and mark it saved.
    ///
    /// A failed create leaves the item editable (`Success`) so the user
    /// can fix the data and retry.
    pub fn commit(&mut self, id: Uuid, store: &dyn BookStore) -> Result<Book, ImportError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(ImportError::UnknownItem(id))?;
        if item.status != ImportStatus::Success {
            return Err(ImportError::NotReady(id));
        }
        let data = item.data.as_ref().ok_or(ImportError::NoData(id))?;

        let book = store.create(data.to_new_book())?;
        item.status = ImportStatus::Saved;
        Ok(book)
    }

    /// Commit every looked-up item, strictly one after another to avoid
    /// write contention. Failures are collected, not fatal.
    pub fn commit_all(&mut self, store: &dyn BookStore) -> CommitSummary {
        let ready: Vec<Uuid> = self
            .items
            .iter()
            .filter(|item| item.status == ImportStatus::Success)
            .map(|item| item.id)
            .collect();

        let mut summary = CommitSummary::default();
        for id in ready {
            match self.commit(id, store) {
                Ok(book) => {
                    tracing::debug!(%id, title = %book.title, "import committed");
                    summary.saved += 1;
                }
                Err(error) => {
                    tracing::warn!(%id, %error, "import commit failed");
                    summary.failed.push((id, error.to_string()));
                }
            }
        }
        summary
    }

    fn set_status(&mut self, id: Uuid, status: ImportStatus) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.status = status;
        }
    }

    fn apply_success(&mut self, id: Uuid, data: EditableBook) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            if item.status == ImportStatus::Loading {
                item.status = ImportStatus::Success;
                item.data = Some(data);
                item.error = None;
            }
        }
    }

    fn apply_error(&mut self, id: Uuid, message: String) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            if item.status == ImportStatus::Loading {
                item.status = ImportStatus::Error;
                item.error = Some(message);
            }
        }
    }
}
