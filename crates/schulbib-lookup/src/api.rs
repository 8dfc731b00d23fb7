//! Wire shape of the lookup endpoint
//!
//! Shared between the server handler and the bulk-import client so both
//! sides agree on one response type. All failure modes are carried as
//! structured values; the user-facing messages live here so every caller
//! reports failures identically.

use serde::{Deserialize, Serialize};

use schulbib_domain::BookRecord;

use crate::backend::BackendError;
use crate::lookup::{LookupError, LookupOutcome};

pub mod messages {
    pub const RATE_LIMITED: &str =
        "Zu viele Anfragen. Bitte versuchen Sie es in einer Minute erneut.";
    pub const QUERY_REQUIRED: &str = "Suchbegriff ist erforderlich";
    pub const CONFIG_MISSING: &str = "API-Konfiguration fehlt";
    pub const NO_DATA: &str = "Keine ausreichenden Buchinformationen gefunden (Titel fehlt). \
         Bitte versuchen Sie es erneut oder suchen Sie manuell.";
    pub const QUOTA_REACHED: &str =
        "API-Limit erreicht. Bitte versuchen Sie es später erneut.";
}

/// Response body of `POST /api/book-lookup`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LookupResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BookRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Manual-search links the client can offer when the lookup failed.
    #[serde(
        rename = "fallbackUrls",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fallback_urls: Option<Vec<String>>,
}

impl LookupResponse {
    pub fn found(record: BookRecord) -> Self {
        Self {
            success: true,
            data: Some(record),
            error: None,
            fallback_urls: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            fallback_urls: None,
        }
    }

    pub fn not_found(fallback_urls: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(messages::NO_DATA.to_string()),
            fallback_urls: Some(fallback_urls),
        }
    }

    pub fn from_outcome(outcome: LookupOutcome) -> Self {
        match outcome {
            LookupOutcome::Found { record, .. } => Self::found(record),
            LookupOutcome::NotFound { fallback_urls } => Self::not_found(fallback_urls),
        }
    }

    pub fn from_error(error: &LookupError) -> Self {
        match error {
            LookupError::InvalidQuery => Self::failure(messages::QUERY_REQUIRED),
            LookupError::Backend(BackendError::MissingCredential) => {
                Self::failure(messages::CONFIG_MISSING)
            }
            LookupError::Backend(backend) if backend.is_quota() => {
                Self::failure(messages::QUOTA_REACHED)
            }
            LookupError::Backend(backend) => {
                Self::failure(format!("Fehler bei der Buchabfrage: {}", backend))
            }
        }
    }
}
