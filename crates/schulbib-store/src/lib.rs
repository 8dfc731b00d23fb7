//! Catalog record store
//!
//! The `BookStore` trait is the seam between the catalog services and
//! whatever holds the records. The default backend is SQLite; tests use
//! its in-memory mode.

pub mod query;
mod sql;
pub mod sqlite;
pub mod store;

pub use query::{BookQuery, Filter, FilterOp, SortOrder, TextSearch};
pub use sqlite::SqliteBookStore;
pub use store::{BookStore, StoreError};
