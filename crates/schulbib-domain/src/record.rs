//! Normalized book record produced by the lookup pipeline

use serde::{Deserialize, Serialize};

use crate::UNKNOWN;

/// The canonical, language-neutral result of a book lookup.
///
/// Produced by the lookup pipeline after parsing and field-mapping raw
/// model output. A record is only usable when `title` is non-empty; every
/// other field may carry the unknown sentinel or be absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub level: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl BookRecord {
    /// Create a record carrying only a title; remaining fields unknown.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: UNKNOWN.to_string(),
            isbn: UNKNOWN.to_string(),
            publisher: None,
            subject: None,
            description: None,
            year: None,
            level: Vec::new(),
            media_type: None,
        }
    }

    /// Whether the record satisfies the acceptance criterion.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}
