//! Queue entries and their editable payload

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use schulbib_domain::{BookRecord, NewBook, UNKNOWN};

/// Lifecycle of a queue entry. Transitions only move forward:
/// Pending -> Loading -> Success | Error, and Success -> Saved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Pending,
    Loading,
    Success,
    Error,
    Saved,
}

/// One entry of the import queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportItem {
    pub id: Uuid,
    pub original_query: String,
    pub status: ImportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EditableBook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportItem {
    pub fn pending(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_query: query.into(),
            status: ImportStatus::Pending,
            data: None,
            error: None,
        }
    }
}

/// A lookup result coerced into editable, string-valued form fields, plus
/// the inventory fields the catalog needs on commit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EditableBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub subject: String,
    pub description: String,
    pub year: String,
    pub level: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub school: String,
    pub location: String,
    pub available: bool,
    pub has_pdf: bool,
}

/// Value for a single form-field update.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl From<BookRecord> for EditableBook {
    fn from(record: BookRecord) -> Self {
        Self {
            title: record.title,
            author: record.author,
            isbn: record.isbn,
            publisher: record.publisher.unwrap_or_else(|| UNKNOWN.to_string()),
            subject: record.subject.unwrap_or_else(|| UNKNOWN.to_string()),
            description: record.description.unwrap_or_default(),
            year: record.year.map(|y| y.to_string()).unwrap_or_default(),
            level: record.level.join(", "),
            media_type: record.media_type.unwrap_or_default(),
            school: String::new(),
            location: String::new(),
            available: true,
            has_pdf: false,
        }
    }
}

impl EditableBook {
    /// Build the create payload for the record store.
    pub fn to_new_book(&self) -> NewBook {
        fn optional(value: &str) -> Option<String> {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }

        NewBook {
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            publisher: self.publisher.clone(),
            subject: self.subject.clone(),
            description: optional(&self.description),
            year: self.year.trim().parse().ok(),
            level: self
                .level
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            media_type: optional(&self.media_type),
            school: optional(&self.school),
            location: optional(&self.location),
            available: self.available,
            has_pdf: self.has_pdf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_coerces_to_string_fields() {
        let mut record = BookRecord::with_title("Mathwelt 2");
        record.year = Some(2019);
        record.level = vec!["3. Klasse".to_string(), "4. Klasse".to_string()];
        let editable = EditableBook::from(record);
        assert_eq!(editable.year, "2019");
        assert_eq!(editable.level, "3. Klasse, 4. Klasse");
        assert_eq!(editable.author, UNKNOWN);
        assert!(editable.available);
        assert!(!editable.has_pdf);
    }

    #[test]
    fn to_new_book_round_trips_year_and_levels() {
        let mut record = BookRecord::with_title("Mathwelt 2");
        record.year = Some(2019);
        record.level = vec!["3. Klasse".to_string(), "4. Klasse".to_string()];
        let new = EditableBook::from(record).to_new_book();
        assert_eq!(new.year, Some(2019));
        assert_eq!(new.level, vec!["3. Klasse", "4. Klasse"]);
        assert!(new.description.is_none());
    }

    #[test]
    fn unparsable_year_becomes_none() {
        let mut editable = EditableBook::from(BookRecord::with_title("X"));
        editable.year = "ca. 2000".to_string();
        assert_eq!(editable.to_new_book().year, None);
    }

    #[test]
    fn pending_item_has_no_data() {
        let item = ImportItem::pending("978-3-551-55167-2");
        assert_eq!(item.status, ImportStatus::Pending);
        assert!(item.data.is_none());
        assert!(item.error.is_none());
    }
}
