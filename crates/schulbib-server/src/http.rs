//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use schulbib_domain::{Book, NewBook};
use schulbib_lookup::api::messages;
use schulbib_lookup::{BackendError, LookupError, LookupResponse};
use schulbib_store::{BookQuery, Filter, FilterOp, StoreError, TextSearch};

use crate::AppState;

const DEFAULT_LIST_LIMIT: usize = 10;

/// Derive the rate-limit identifier for a caller.
///
/// First hop of `x-forwarded-for`, then `x-real-ip`, then a shared
/// anonymous bucket. The headers are client/proxy supplied and the
/// anonymous bucket lumps all unproxied callers together - acceptable for
/// advisory abuse protection on an internal tool, not a security control.
pub fn client_identifier(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
        })
        .unwrap_or("anonymous")
        .to_string()
}

/// Request body for the lookup endpoint.
///
/// `query` is the generic search; `isbn` is kept for older clients.
#[derive(Debug, Deserialize)]
pub struct BookLookupRequest {
    pub query: Option<String>,
    pub isbn: Option<String>,
}

/// Look up a book via the generative backend.
pub async fn book_lookup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<BookLookupRequest>,
) -> Response {
    let identifier = client_identifier(&headers);
    let decision = state.limiter.check(&identifier);
    if !decision.allowed {
        tracing::warn!(%identifier, "lookup throttled");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [
                ("x-ratelimit-remaining", "0".to_string()),
                ("x-ratelimit-reset", "60".to_string()),
            ],
            Json(LookupResponse::failure(messages::RATE_LIMITED)),
        )
            .into_response();
    }

    let query = request.query.or(request.isbn).unwrap_or_default();
    if query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(LookupResponse::failure(messages::QUERY_REQUIRED)),
        )
            .into_response();
    }

    let Some(lookup) = &state.lookup else {
        tracing::error!("book lookup requested but no backend credential configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LookupResponse::failure(messages::CONFIG_MISSING)),
        )
            .into_response();
    };

    match lookup.lookup(&query).await {
        Ok(outcome) => (
            StatusCode::OK,
            [("x-ratelimit-remaining", decision.remaining.to_string())],
            Json(LookupResponse::from_outcome(outcome)),
        )
            .into_response(),
        Err(error) => {
            tracing::error!(%query, %error, "book lookup failed");
            let status = match &error {
                LookupError::InvalidQuery => StatusCode::BAD_REQUEST,
                LookupError::Backend(BackendError::MissingCredential) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                // Quota and transport failures stay structured results so
                // the client keeps its manual-entry path.
                LookupError::Backend(_) => StatusCode::OK,
            };
            (status, Json(LookupResponse::from_error(&error))).into_response()
        }
    }
}

/// Query parameters for listing the catalog.
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksParams {
    pub limit: Option<usize>,
    /// Free-text search across title, author, and ISBN.
    pub search: Option<String>,
    pub subject: Option<String>,
    pub order: Option<String>,
    pub ascending: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct BookListResponse {
    pub success: bool,
    pub data: Vec<Book>,
    pub count: usize,
}

/// List catalog entries.
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListBooksParams>,
) -> Result<Json<BookListResponse>, (StatusCode, String)> {
    let mut query = BookQuery::default();
    query.limit = Some(params.limit.unwrap_or(DEFAULT_LIST_LIMIT));

    if let Some(subject) = params.subject {
        query.filter = Some(Filter {
            column: "subject".to_string(),
            operator: FilterOp::Eq,
            value: json!(subject),
        });
    }
    if let Some(term) = params.search {
        let term = term.trim().to_string();
        if !term.is_empty() {
            query.search = Some(TextSearch::new(term, &["title", "author", "isbn"]));
        }
    }
    if let Some(order) = params.order {
        query.order_by.column = order;
    }
    if let Some(ascending) = params.ascending {
        query.order_by.ascending = ascending;
    }

    let books = state.store.list(&query).map_err(store_error)?;
    Ok(Json(BookListResponse {
        success: true,
        count: books.len(),
        data: books,
    }))
}

/// Create a catalog entry.
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), (StatusCode, String)> {
    let book = state.store.create(new).map_err(store_error)?;
    tracing::info!(id = %book.id, title = %book.title, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

/// Delete a catalog entry.
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    state.store.delete(id).map_err(store_error)?;
    tracing::info!(%id, "book deleted");
    Ok(Json(json!({ "success": true, "id": id.to_string() })))
}

fn store_error(error: StoreError) -> (StatusCode, String) {
    let status = match &error {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::DuplicateIsbn(_) => StatusCode::CONFLICT,
        StoreError::Validation(_) | StoreError::Query(_) => StatusCode::BAD_REQUEST,
        StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string())
}
