//! Domain types shared across the schulbib catalog services
//!
//! This crate provides the canonical models for the school-library catalog:
//! - BookRecord: the normalized result of an AI-assisted lookup
//! - Book / NewBook: a catalog entry and its create payload
//! - Vocabularies: the closed lists for subjects, media types, grade levels
//! - Validation: field checks for create payloads

pub mod book;
pub mod record;
pub mod validation;
pub mod vocab;

pub use book::*;
pub use record::*;
pub use validation::*;
pub use vocab::*;

/// Sentinel used wherever a text field is unknown rather than absent.
///
/// The catalog UI and the lookup pipeline both treat this value as
/// "no information", so it must stay byte-identical across crates.
pub const UNKNOWN: &str = "Unbekannt";
