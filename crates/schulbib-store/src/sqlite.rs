//! SQLite-backed implementation of the BookStore trait

use std::path::Path;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use schulbib_domain::{has_errors, validate_new_book, Book, NewBook};

use crate::query::BookQuery;
use crate::sql::compile_query;
use crate::store::{BookStore, StoreError};

pub struct SqliteBookStore {
    conn: Mutex<Connection>,
}

impl SqliteBookStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn =
            Connection::open(path).map_err(|e| StoreError::Storage(format!("open: {}", e)))?;
        Self::init_with_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Storage(format!("open_in_memory: {}", e)))?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                isbn TEXT NOT NULL,
                publisher TEXT NOT NULL,
                subject TEXT NOT NULL,
                description TEXT,
                year INTEGER,
                level TEXT NOT NULL DEFAULT '[]',
                media_type TEXT,
                school TEXT,
                location TEXT,
                available INTEGER NOT NULL DEFAULT 1,
                has_pdf INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_books_isbn ON books(isbn);
            CREATE INDEX IF NOT EXISTS idx_books_subject ON books(subject);
            CREATE INDEX IF NOT EXISTS idx_books_created ON books(created_at);
            ",
        )
        .map_err(|e| StoreError::Storage(format!("init_schema: {}", e)))?;
        Ok(())
    }

    fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
        let id: String = row.get("id")?;
        let level_json: String = row.get("level")?;
        let created_ms: i64 = row.get("created_at")?;

        Ok(Book {
            id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
            title: row.get("title")?,
            author: row.get("author")?,
            isbn: row.get("isbn")?,
            publisher: row.get("publisher")?,
            subject: row.get("subject")?,
            description: row.get("description")?,
            year: row.get("year")?,
            level: serde_json::from_str(&level_json).unwrap_or_default(),
            media_type: row.get("media_type")?,
            school: row.get("school")?,
            location: row.get("location")?,
            available: row.get::<_, i64>("available")? != 0,
            has_pdf: row.get::<_, i64>("has_pdf")? != 0,
            created_at: Utc
                .timestamp_millis_opt(created_ms)
                .single()
                .unwrap_or_else(Utc::now),
        })
    }
}

impl BookStore for SqliteBookStore {
    fn create(&self, new: NewBook) -> Result<Book, StoreError> {
        let findings = validate_new_book(&new);
        if has_errors(&findings) {
            let message = findings
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(StoreError::Validation(message));
        }

        let book = Book::from_new(new);
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Storage(format!("lock poisoned: {}", e)))?;

        // Real ISBNs are unique in the catalog; the unknown sentinel never
        // collides, so several hand-entered records may share it.
        if schulbib_domain::UNKNOWN != book.isbn {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM books WHERE isbn = ?1",
                    params![book.isbn],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| StoreError::Storage(format!("isbn check: {}", e)))?;
            if existing.is_some() {
                return Err(StoreError::DuplicateIsbn(book.isbn.clone()));
            }
        }

        let level_json = serde_json::to_string(&book.level)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        conn.execute(
            "INSERT INTO books (id, title, author, isbn, publisher, subject, description, year, level, media_type, school, location, available, has_pdf, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                book.id.to_string(),
                book.title,
                book.author,
                book.isbn,
                book.publisher,
                book.subject,
                book.description,
                book.year,
                level_json,
                book.media_type,
                book.school,
                book.location,
                book.available as i64,
                book.has_pdf as i64,
                book.created_at.timestamp_millis(),
            ],
        )
        .map_err(|e| StoreError::Storage(format!("insert: {}", e)))?;

        Ok(book)
    }

    fn get(&self, id: Uuid) -> Result<Option<Book>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Storage(format!("lock poisoned: {}", e)))?;
        conn.query_row(
            "SELECT * FROM books WHERE id = ?1",
            params![id.to_string()],
            Self::row_to_book,
        )
        .optional()
        .map_err(|e| StoreError::Storage(format!("get: {}", e)))
    }

    fn list(&self, query: &BookQuery) -> Result<Vec<Book>, StoreError> {
        let compiled = compile_query(query)?;
        let sql = format!(
            "SELECT * FROM books {} {} {}",
            compiled.where_clause, compiled.order_clause, compiled.limit_clause
        );

        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Storage(format!("lock poisoned: {}", e)))?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Storage(format!("prepare: {}", e)))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(compiled.params), Self::row_to_book)
            .map_err(|e| StoreError::Storage(format!("query: {}", e)))?;

        let mut books = Vec::new();
        for row in rows {
            books.push(row.map_err(|e| StoreError::Storage(format!("row: {}", e)))?);
        }
        Ok(books)
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Storage(format!("lock poisoned: {}", e)))?;
        let changed = conn
            .execute("DELETE FROM books WHERE id = ?1", params![id.to_string()])
            .map_err(|e| StoreError::Storage(format!("delete: {}", e)))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
