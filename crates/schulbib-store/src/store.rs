//! The trait that all catalog backends implement

use uuid::Uuid;

use schulbib_domain::{Book, NewBook};

use crate::query::BookQuery;

pub trait BookStore: Send + Sync {
    /// Validate, sanitize, and insert a new entry. Returns the stored book.
    fn create(&self, new: NewBook) -> Result<Book, StoreError>;

    /// Get an entry by ID.
    fn get(&self, id: Uuid) -> Result<Option<Book>, StoreError>;

    /// List entries matching a query, sorted and limited.
    fn list(&self, query: &BookQuery) -> Result<Vec<Book>, StoreError>;

    /// Delete an entry by ID.
    fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Errors from the catalog store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Eintrag nicht gefunden: {0}")]
    NotFound(Uuid),

    #[error("ISBN bereits im Katalog: {0}")]
    DuplicateIsbn(String),

    #[error("Ungültige Eingabe: {0}")]
    Validation(String),

    #[error("Ungültige Abfrage: {0}")]
    Query(String),

    #[error("Speicherfehler: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::NotFound(Uuid::nil());
        assert!(err.to_string().contains("nicht gefunden"));

        let err = StoreError::Validation("Titel ist erforderlich".to_string());
        assert!(err.to_string().contains("Titel"));
    }
}
