//! Normalization of raw model output
//!
//! Model responses arrive as free-form text: usually a JSON object, often
//! wrapped in a markdown code fence, with German field names but sometimes
//! English ones. Mapping is an ordered-fallback lookup per field - the
//! candidate keys are tried in priority order and the first usable value
//! wins, with the unknown sentinel as default where the catalog expects a
//! value.

use serde_json::Value;

use schulbib_domain::{BookRecord, UNKNOWN};

/// Strip a leading/trailing markdown code fence (with or without a `json`
/// tag) and surrounding whitespace.
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// First usable text value among the candidate keys.
///
/// Blank strings and nulls are skipped like absent keys; numbers are
/// stringified (ISBNs occasionally come back as bare numbers).
fn text_field(raw: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match raw.get(key) {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Year accepted as a number or a numeric string.
fn year_field(raw: &Value, keys: &[&str]) -> Option<i32> {
    for key in keys {
        match raw.get(key) {
            Some(Value::Number(n)) => return n.as_i64().map(|y| y as i32),
            Some(Value::String(s)) => {
                if let Ok(year) = s.trim().parse::<i32>() {
                    return Some(year);
                }
            }
            _ => {}
        }
    }
    None
}

/// Grade levels accepted as a single string or an array; always
/// materialized as a sequence.
fn level_field(raw: &Value, keys: &[&str]) -> Vec<String> {
    for key in keys {
        match raw.get(key) {
            Some(Value::Array(entries)) => {
                return entries
                    .iter()
                    .filter_map(|entry| match entry {
                        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect();
            }
            Some(Value::String(s)) if !s.trim().is_empty() => {
                return vec![s.trim().to_string()];
            }
            _ => {}
        }
    }
    Vec::new()
}

/// Map a parsed payload onto the canonical record.
///
/// Deterministic: the same payload always maps to the same record.
pub fn normalize_record(raw: &Value) -> BookRecord {
    BookRecord {
        title: text_field(raw, &["Titel", "title"]).unwrap_or_default(),
        author: text_field(raw, &["Autor", "author"]).unwrap_or_else(|| UNKNOWN.to_string()),
        isbn: text_field(raw, &["ISBN", "isbn"]).unwrap_or_else(|| UNKNOWN.to_string()),
        publisher: Some(
            text_field(raw, &["Verlag", "publisher"]).unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        subject: Some(
            text_field(raw, &["Fach", "subject"]).unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        description: text_field(raw, &["Beschreibung", "description"]),
        year: year_field(raw, &["Erscheinungsjahr", "year"]),
        level: level_field(raw, &["Stufe", "level"]),
        media_type: text_field(raw, &["Typ", "type"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_RESPONSE: &str = r#"{
        "Titel": "Harry Potter und der Stein der Weisen",
        "Autor": "J.K. Rowling",
        "ISBN": "978-3-551-55167-2",
        "Verlag": "Carlsen",
        "Erscheinungsjahr": 1998,
        "Stufe": ["4. Klasse", "5. Klasse", "6. Klasse"],
        "Fach": "Deutsch",
        "Typ": "Buch",
        "Beschreibung": "Der erste Band der Reihe."
    }"#;

    #[test]
    fn maps_german_keyed_payload() {
        let raw: Value = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        let record = normalize_record(&raw);
        assert_eq!(record.title, "Harry Potter und der Stein der Weisen");
        assert_eq!(record.author, "J.K. Rowling");
        assert_eq!(record.isbn, "978-3-551-55167-2");
        assert_eq!(record.publisher.as_deref(), Some("Carlsen"));
        assert_eq!(record.year, Some(1998));
        assert_eq!(record.level.len(), 3);
        assert_eq!(record.media_type.as_deref(), Some("Buch"));
    }

    #[test]
    fn german_keys_win_over_english() {
        let raw = json!({"Titel": "Deutscher Titel", "title": "English title"});
        assert_eq!(normalize_record(&raw).title, "Deutscher Titel");
    }

    #[test]
    fn english_keys_are_the_fallback() {
        let raw = json!({"title": "Only English", "author": "Somebody"});
        let record = normalize_record(&raw);
        assert_eq!(record.title, "Only English");
        assert_eq!(record.author, "Somebody");
    }

    #[test]
    fn missing_fields_get_unknown_sentinels() {
        let raw = json!({"Titel": "Nur Titel"});
        let record = normalize_record(&raw);
        assert_eq!(record.author, UNKNOWN);
        assert_eq!(record.isbn, UNKNOWN);
        assert_eq!(record.publisher.as_deref(), Some(UNKNOWN));
        assert_eq!(record.subject.as_deref(), Some(UNKNOWN));
        assert!(record.description.is_none());
        assert!(record.level.is_empty());
    }

    #[test]
    fn level_string_and_singleton_array_are_equal() {
        let from_string = normalize_record(&json!({"Titel": "X", "Stufe": "3. Klasse"}));
        let from_array = normalize_record(&json!({"Titel": "X", "Stufe": ["3. Klasse"]}));
        assert_eq!(from_string.level, from_array.level);
        assert_eq!(from_string.level, vec!["3. Klasse".to_string()]);
    }

    #[test]
    fn numeric_isbn_is_stringified() {
        let raw = json!({"Titel": "X", "ISBN": 9783551551672u64});
        assert_eq!(normalize_record(&raw).isbn, "9783551551672");
    }

    #[test]
    fn year_as_string_is_parsed() {
        let raw = json!({"Titel": "X", "Erscheinungsjahr": "2019"});
        assert_eq!(normalize_record(&raw).year, Some(2019));
    }

    #[test]
    fn fenced_payloads_normalize_like_unfenced() {
        let plain: Value = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        let tagged = format!("```json\n{}\n```", SAMPLE_RESPONSE);
        let untagged = format!("```\n{}\n```", SAMPLE_RESPONSE);

        let from_tagged: Value = serde_json::from_str(strip_code_fence(&tagged)).unwrap();
        let from_untagged: Value = serde_json::from_str(strip_code_fence(&untagged)).unwrap();

        assert_eq!(normalize_record(&plain), normalize_record(&from_tagged));
        assert_eq!(normalize_record(&plain), normalize_record(&from_untagged));
    }

    #[test]
    fn strip_code_fence_leaves_plain_text_alone() {
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw: Value = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        assert_eq!(normalize_record(&raw), normalize_record(&raw));
    }
}
