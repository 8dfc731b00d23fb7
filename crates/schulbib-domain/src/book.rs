//! Catalog entry domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UNKNOWN;

/// A book or teaching-material entry in the school catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub level: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub available: bool,
    pub has_pdf: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a catalog entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub level: Vec<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub has_pdf: bool,
}

fn default_available() -> bool {
    true
}

impl NewBook {
    /// Trim free-text fields and fill blank identity fields with the
    /// unknown sentinel. Title and author stay as entered; validation
    /// rejects them when blank.
    pub fn sanitized(&self) -> NewBook {
        fn or_unknown(value: &str) -> String {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                UNKNOWN.to_string()
            } else {
                trimmed.to_string()
            }
        }

        NewBook {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            isbn: or_unknown(&self.isbn),
            publisher: or_unknown(&self.publisher),
            subject: or_unknown(&self.subject),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            year: self.year,
            level: self
                .level
                .iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            media_type: self
                .media_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            school: self.school.clone(),
            location: self.location.clone(),
            available: self.available,
            has_pdf: self.has_pdf,
        }
    }

    /// Whether the ISBN identifies a real book (not the unknown sentinel).
    pub fn has_known_isbn(&self) -> bool {
        let trimmed = self.isbn.trim();
        !trimmed.is_empty() && trimmed != UNKNOWN
    }
}

impl Book {
    /// Materialize a stored entry from a create payload.
    pub fn from_new(new: NewBook) -> Self {
        let new = new.sanitized();
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            author: new.author,
            isbn: new.isbn,
            publisher: new.publisher,
            subject: new.subject,
            description: new.description,
            year: new.year,
            level: new.level,
            media_type: new.media_type,
            school: new.school,
            location: new.location,
            available: new.available,
            has_pdf: new.has_pdf,
            created_at: Utc::now(),
        }
    }
}
