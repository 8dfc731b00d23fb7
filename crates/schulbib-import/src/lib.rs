//! Bulk import for the school catalog
//!
//! Takes a pasted list of queries (one book per line), runs the AI lookup
//! over them in small concurrent batches with pacing and cancellation, and
//! commits the reviewed results into the record store:
//! - `item`: queue entry lifecycle and editable form data
//! - `queue`: the batch processor and commit operations
//! - `client`: the lookup dependency (HTTP endpoint or in-process)
//! - `cancel`: the shared cooperative cancellation token

pub mod cancel;
pub mod client;
pub mod item;
pub mod queue;

pub use cancel::CancelToken;
pub use client::{BookLookupClient, ClientError, HttpLookupClient, LocalLookupClient};
pub use item::{EditableBook, FieldValue, ImportItem, ImportStatus};
pub use queue::{
    CommitSummary, ImportError, ImportProgress, ImportQueue, BATCH_DELAY, CONCURRENCY,
};
