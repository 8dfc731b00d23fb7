use rusqlite::types::Value as SqlValue;

use crate::query::{BookQuery, Filter, FilterOp, SortOrder, TextSearch};
use crate::store::StoreError;

/// Compiled SQL fragments with bound parameters.
pub(crate) struct CompiledQuery {
    pub where_clause: String,
    pub params: Vec<SqlValue>,
    pub order_clause: String,
    pub limit_clause: String,
}

/// Translate a BookQuery into SQL fragments.
pub(crate) fn compile_query(q: &BookQuery) -> Result<CompiledQuery, StoreError> {
    let mut params = Vec::new();
    let mut conditions = Vec::new();

    if let Some(ref filter) = q.filter {
        let (sql, filter_params) = compile_filter(filter)?;
        conditions.push(sql);
        params.extend(filter_params);
    }
    if let Some(ref search) = q.search {
        let (sql, search_params) = compile_search(search)?;
        conditions.push(sql);
        params.extend(search_params);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let order_clause = compile_sort(&q.order_by)?;

    let limit_clause = match q.limit {
        Some(limit) => format!("LIMIT {}", limit),
        None => String::new(),
    };

    Ok(CompiledQuery {
        where_clause,
        params,
        order_clause,
        limit_clause,
    })
}

fn compile_filter(filter: &Filter) -> Result<(String, Vec<SqlValue>), StoreError> {
    let col = column(&filter.column)?;
    let mut params = Vec::new();

    let sql = match filter.operator {
        FilterOp::Eq => {
            params.push(value_to_sql(&filter.value)?);
            format!("{} = ?", col)
        }
        FilterOp::Neq => {
            params.push(value_to_sql(&filter.value)?);
            format!("{} != ?", col)
        }
        FilterOp::Gt => {
            params.push(value_to_sql(&filter.value)?);
            format!("{} > ?", col)
        }
        FilterOp::Gte => {
            params.push(value_to_sql(&filter.value)?);
            format!("{} >= ?", col)
        }
        FilterOp::Lt => {
            params.push(value_to_sql(&filter.value)?);
            format!("{} < ?", col)
        }
        FilterOp::Lte => {
            params.push(value_to_sql(&filter.value)?);
            format!("{} <= ?", col)
        }
        FilterOp::Like => {
            params.push(value_to_sql(&filter.value)?);
            format!("{} LIKE ?", col)
        }
        FilterOp::ILike => {
            params.push(value_to_sql(&filter.value)?);
            format!("LOWER({}) LIKE LOWER(?)", col)
        }
        FilterOp::In => {
            let values = array_values(&filter.value)?;
            let placeholders: Vec<&str> = values
                .iter()
                .map(|v| {
                    params.push(v.clone());
                    "?"
                })
                .collect();
            format!("{} IN ({})", col, placeholders.join(", "))
        }
        FilterOp::Overlaps => {
            // Array-valued columns are stored as JSON arrays; overlap means
            // any requested value appears among the stored elements.
            if col != "level" {
                return Err(StoreError::Query(format!(
                    "overlaps is only supported on array columns, not {}",
                    filter.column
                )));
            }
            let values = array_values(&filter.value)?;
            let placeholders: Vec<&str> = values
                .iter()
                .map(|v| {
                    params.push(v.clone());
                    "?"
                })
                .collect();
            format!(
                "EXISTS (SELECT 1 FROM json_each(books.level) WHERE json_each.value IN ({}))",
                placeholders.join(", ")
            )
        }
    };

    Ok((sql, params))
}

fn compile_search(search: &TextSearch) -> Result<(String, Vec<SqlValue>), StoreError> {
    if search.columns.is_empty() {
        return Err(StoreError::Query("search needs at least one column".into()));
    }
    let mut params = Vec::new();
    let mut parts = Vec::new();
    for requested in &search.columns {
        let col = column(requested)?;
        params.push(SqlValue::Text(format!("%{}%", search.term)));
        parts.push(format!("LOWER({}) LIKE LOWER(?)", col));
    }
    Ok((format!("({})", parts.join(" OR ")), params))
}

fn compile_sort(order: &SortOrder) -> Result<String, StoreError> {
    let col = column(&order.column)?;
    let direction = if order.ascending { "ASC" } else { "DESC" };
    Ok(format!("ORDER BY {} {}", col, direction))
}

/// Map an external column name to a real column. Whitelisting here keeps
/// caller-supplied names out of the SQL text.
fn column(name: &str) -> Result<&'static str, StoreError> {
    Ok(match name {
        "id" => "id",
        "title" => "title",
        "author" => "author",
        "isbn" => "isbn",
        "publisher" => "publisher",
        "subject" => "subject",
        "description" => "description",
        "year" => "year",
        "level" => "level",
        "type" | "media_type" => "media_type",
        "school" => "school",
        "location" => "location",
        "available" => "available",
        "has_pdf" => "has_pdf",
        "created_at" => "created_at",
        other => {
            return Err(StoreError::Query(format!("unknown column: {}", other)));
        }
    })
}

fn value_to_sql(value: &serde_json::Value) -> Result<SqlValue, StoreError> {
    Ok(match value {
        serde_json::Value::Null => SqlValue::Null,
        serde_json::Value::Bool(b) => SqlValue::Integer(*b as i64),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::Real(f)
            } else {
                return Err(StoreError::Query(format!("unsupported number: {}", n)));
            }
        }
        serde_json::Value::String(s) => SqlValue::Text(s.clone()),
        other => {
            return Err(StoreError::Query(format!(
                "unsupported filter value: {}",
                other
            )));
        }
    })
}

fn array_values(value: &serde_json::Value) -> Result<Vec<SqlValue>, StoreError> {
    let items = value
        .as_array()
        .ok_or_else(|| StoreError::Query("operator needs an array value".into()))?;
    if items.is_empty() {
        return Err(StoreError::Query("operator needs a non-empty array".into()));
    }
    items.iter().map(value_to_sql).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compiles_equality_filter() {
        let q = BookQuery::with_filter("subject", FilterOp::Eq, json!("Mathematik"));
        let compiled = compile_query(&q).unwrap();
        assert_eq!(compiled.where_clause, "WHERE subject = ?");
        assert_eq!(compiled.params.len(), 1);
        assert_eq!(compiled.order_clause, "ORDER BY created_at DESC");
    }

    #[test]
    fn compiles_or_search_across_columns() {
        let q = BookQuery::with_search("raupe", &["title", "author"]);
        let compiled = compile_query(&q).unwrap();
        assert_eq!(
            compiled.where_clause,
            "WHERE (LOWER(title) LIKE LOWER(?) OR LOWER(author) LIKE LOWER(?))"
        );
        assert_eq!(compiled.params.len(), 2);
    }

    #[test]
    fn overlaps_compiles_to_json_each() {
        let q = BookQuery::with_filter("level", FilterOp::Overlaps, json!(["1. Klasse"]));
        let compiled = compile_query(&q).unwrap();
        assert!(compiled.where_clause.contains("json_each(books.level)"));
    }

    #[test]
    fn overlaps_rejected_on_scalar_columns() {
        let q = BookQuery::with_filter("title", FilterOp::Overlaps, json!(["x"]));
        assert!(matches!(compile_query(&q), Err(StoreError::Query(_))));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let q = BookQuery::with_filter("borrowed_by; DROP TABLE", FilterOp::Eq, json!("x"));
        assert!(matches!(compile_query(&q), Err(StoreError::Query(_))));
    }

    #[test]
    fn type_maps_to_media_type_column() {
        let q = BookQuery::with_filter("type", FilterOp::Eq, json!("Buch"));
        let compiled = compile_query(&q).unwrap();
        assert_eq!(compiled.where_clause, "WHERE media_type = ?");
    }
}
