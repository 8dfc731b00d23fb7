//! Schulbib Server - catalog API
//!
//! HTTP server for the school-library catalog: the AI book-lookup
//! endpoint plus catalog CRUD, guarded by a fixed-window rate limiter and
//! optional bearer-token auth.

pub mod auth;
pub mod config;
pub mod http;
pub mod ratelimit;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use schulbib_lookup::{BookLookup, GeminiBackend, GeminiConfig};
use schulbib_store::{BookStore, SqliteBookStore};

use crate::config::ServerConfig;
use crate::ratelimit::RateLimiter;

/// Shared application state
pub struct AppState {
    /// Absent when no backend credential is configured; the lookup
    /// endpoint then answers 500 instead of calling out.
    pub lookup: Option<BookLookup>,
    pub limiter: RateLimiter,
    pub store: Arc<dyn BookStore>,
    pub api_token: Option<String>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = SqliteBookStore::open(&config.db_path)?;

        let lookup = match &config.gemini_api_key {
            Some(key) => {
                let gemini = GeminiConfig {
                    timeout: config.lookup_timeout,
                    ..GeminiConfig::new(key.clone())
                };
                Some(BookLookup::new(Arc::new(GeminiBackend::new(gemini)?)))
            }
            None => {
                tracing::warn!("GOOGLE_GEMINI_API_KEY not set, book lookup disabled");
                None
            }
        };

        Ok(Self {
            lookup,
            limiter: RateLimiter::new(),
            store: Arc::new(store),
            api_token: config.api_token.clone(),
        })
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Lookup endpoint
        .route("/api/book-lookup", post(http::book_lookup))
        // Catalog endpoints
        .route("/api/books", get(http::list_books))
        .route("/api/books", post(http::create_book))
        .route("/api/books/{id}", delete(http::delete_book))
        // Middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("schulbib server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
