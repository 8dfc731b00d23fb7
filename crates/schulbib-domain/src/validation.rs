//! Validation for catalog create payloads

use serde::{Deserialize, Serialize};

use crate::{is_known_level, is_known_media_type, is_known_subject, NewBook, UNKNOWN};

/// Severity of a validation finding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

/// A validation error or warning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub severity: ValidationSeverity,
}

impl ValidationError {
    fn error(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            severity: ValidationSeverity::Error,
        }
    }

    fn warning(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            severity: ValidationSeverity::Warning,
        }
    }
}

/// Validate a create payload and return findings.
///
/// Title and author are required; off-vocabulary classification values are
/// warnings only, since the vocabularies are advisory.
pub fn validate_new_book(new: &NewBook) -> Vec<ValidationError> {
    let mut findings = Vec::new();

    if new.title.trim().is_empty() {
        findings.push(ValidationError::error("title", "Titel ist erforderlich"));
    }
    if new.author.trim().is_empty() {
        findings.push(ValidationError::error("author", "Autor ist erforderlich"));
    }

    let subject = new.subject.trim();
    if !subject.is_empty() && subject != UNKNOWN && !is_known_subject(subject) {
        findings.push(ValidationError::warning(
            "subject",
            "Fach ist nicht in der Fächerliste",
        ));
    }

    if let Some(media_type) = new.media_type.as_deref() {
        if !media_type.is_empty() && !is_known_media_type(media_type) {
            findings.push(ValidationError::warning(
                "type",
                "Typ ist nicht in der Medientypenliste",
            ));
        }
    }

    for level in &new.level {
        if !is_known_level(level) {
            findings.push(ValidationError::warning(
                "level",
                "Stufe ist nicht in der Stufenliste",
            ));
        }
    }

    findings
}

/// Whether the findings contain any hard error.
pub fn has_errors(findings: &[ValidationError]) -> bool {
    findings
        .iter()
        .any(|f| f.severity == ValidationSeverity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_author_are_required() {
        let findings = validate_new_book(&NewBook::default());
        assert!(has_errors(&findings));
        let fields: Vec<_> = findings.iter().map(|f| f.field.as_str()).collect();
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"author"));
    }

    #[test]
    fn off_vocabulary_values_are_warnings() {
        let new = NewBook {
            title: "Mathwelt 2".to_string(),
            author: "Autorenteam".to_string(),
            subject: "Astrologie".to_string(),
            level: vec!["10. Klasse".to_string()],
            ..NewBook::default()
        };
        let findings = validate_new_book(&new);
        assert!(!has_errors(&findings));
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn unknown_sentinel_subject_is_accepted() {
        let new = NewBook {
            title: "Irgendwas".to_string(),
            author: "Jemand".to_string(),
            subject: UNKNOWN.to_string(),
            ..NewBook::default()
        };
        assert!(validate_new_book(&new).is_empty());
    }
}
