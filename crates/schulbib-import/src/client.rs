//! Lookup dependency of the import queue
//!
//! The queue only needs "query in, structured reply out". The HTTP client
//! posts to a running server's lookup endpoint; the local client drives
//! the orchestrator in-process (used by the CLI when no server runs).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use schulbib_lookup::{BookLookup, GenerativeBackend, LookupResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Netzwerkfehler: {message}")]
    Network { message: String },
    #[error("Ungültige Antwort: {message}")]
    InvalidResponse { message: String },
}

#[async_trait]
pub trait BookLookupClient: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<LookupResponse, ClientError>;
}

/// Client for a running schulbib server.
pub struct HttpLookupClient {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpLookupClient {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl BookLookupClient for HttpLookupClient {
    async fn lookup(&self, query: &str) -> Result<LookupResponse, ClientError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": query }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ClientError::Network {
            message: e.to_string(),
        })?;

        // Throttled and failed lookups still carry the structured body.
        response
            .json::<LookupResponse>()
            .await
            .map_err(|e| ClientError::InvalidResponse {
                message: e.to_string(),
            })
    }
}

/// In-process client wrapping the orchestrator directly.
pub struct LocalLookupClient {
    lookup: BookLookup,
}

impl LocalLookupClient {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            lookup: BookLookup::new(backend),
        }
    }
}

#[async_trait]
impl BookLookupClient for LocalLookupClient {
    async fn lookup(&self, query: &str) -> Result<LookupResponse, ClientError> {
        match self.lookup.lookup(query).await {
            Ok(outcome) => Ok(LookupResponse::from_outcome(outcome)),
            Err(error) => Ok(LookupResponse::from_error(&error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schulbib_lookup::ScriptedBackend;

    #[tokio::test]
    async fn local_client_maps_outcomes_to_wire_replies() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_text(r#"{"Titel":"Herr der Diebe","Autor":"Cornelia Funke"}"#);
        let client = LocalLookupClient::new(backend);

        let reply = client.lookup("Herr der Diebe").await.unwrap();
        assert!(reply.success);
        assert_eq!(reply.data.unwrap().title, "Herr der Diebe");
    }

    #[tokio::test]
    async fn local_client_returns_structured_failures() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_text("");
        let client = LocalLookupClient::new(backend);

        let reply = client.lookup("unbekanntes Buch").await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.fallback_urls.unwrap().len(), 2);
    }
}
