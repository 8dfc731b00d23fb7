//! AI-assisted book lookup
//!
//! Turns a free-text or ISBN query into a normalized catalog record by way
//! of a web-search-capable generative backend:
//! - `backend`: the streaming backend contract and its error taxonomy
//! - `gemini`: the default backend implementation (Gemini SSE streaming)
//! - `prompt`: deterministic prompt construction
//! - `normalize`: fence stripping and bilingual field mapping
//! - `lookup`: the bounded-retry orchestrator with manual-search fallback
//! - `api`: the endpoint wire shape shared with the import client
//! - `scripted`: an offline backend for tests and demos

pub mod api;
pub mod backend;
pub mod gemini;
pub mod lookup;
pub mod normalize;
pub mod prompt;
pub mod scripted;

pub use api::LookupResponse;
pub use backend::{
    BackendError, GenerationRequest, GenerationStream, GenerativeBackend, TextChunk, TokenUsage,
};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use lookup::{fallback_urls, BookLookup, LookupError, LookupOutcome, MAX_ATTEMPTS};
pub use normalize::{normalize_record, strip_code_fence};
pub use prompt::build_lookup_prompt;
pub use scripted::ScriptedBackend;
