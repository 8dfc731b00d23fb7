//! Query types for listing catalog records

use serde::{Deserialize, Serialize};

/// A query against the catalog.
///
/// Mirrors what the catalog pages actually ask for: one optional
/// column/operator/value filter, an optional free-text OR-search across
/// named columns, single-column ordering, and a result limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<TextSearch>,
    #[serde(default)]
    pub order_by: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            filter: None,
            search: None,
            order_by: SortOrder::default(),
            limit: None,
        }
    }
}

/// Column/operator/value filter triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOp,
    pub value: serde_json::Value,
}

/// Supported filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-sensitive pattern match (`%` wildcards in the value).
    Like,
    /// Case-insensitive pattern match.
    ILike,
    /// Set membership; value must be an array.
    In,
    /// Array overlap against an array-valued column; value must be an array.
    Overlaps,
}

/// Free-text OR-search: the term matches when any named column contains it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSearch {
    pub term: String,
    pub columns: Vec<String>,
}

impl TextSearch {
    pub fn new(term: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            term: term.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Single-column sort descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortOrder {
    pub column: String,
    pub ascending: bool,
}

impl Default for SortOrder {
    fn default() -> Self {
        // Newest entries first, like the catalog overview.
        Self {
            column: "created_at".to_string(),
            ascending: false,
        }
    }
}

impl BookQuery {
    pub fn with_filter(column: &str, operator: FilterOp, value: serde_json::Value) -> Self {
        Self {
            filter: Some(Filter {
                column: column.to_string(),
                operator,
                value,
            }),
            ..Self::default()
        }
    }

    pub fn with_search(term: &str, columns: &[&str]) -> Self {
        Self {
            search: Some(TextSearch::new(term, columns)),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_query_orders_by_created_at_desc() {
        let q = BookQuery::default();
        assert_eq!(q.order_by.column, "created_at");
        assert!(!q.order_by.ascending);
        assert!(q.filter.is_none());
        assert!(q.limit.is_none());
    }

    #[test]
    fn query_serde_round_trip() {
        let q = BookQuery {
            filter: Some(Filter {
                column: "subject".to_string(),
                operator: FilterOp::Eq,
                value: json!("Mathematik"),
            }),
            search: Some(TextSearch::new("raupe", &["title", "author"])),
            order_by: SortOrder {
                column: "year".to_string(),
                ascending: true,
            },
            limit: Some(20),
        };
        let text = serde_json::to_string(&q).unwrap();
        let back: BookQuery = serde_json::from_str(&text).unwrap();
        assert_eq!(q, back);
    }

    #[test]
    fn operators_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&FilterOp::ILike).unwrap(), "\"ilike\"");
        assert_eq!(serde_json::to_string(&FilterOp::Overlaps).unwrap(), "\"overlaps\"");
    }
}
