//! Scripted backend for tests and offline demos
//!
//! Responses are queued ahead of time and consumed one per `generate`
//! call. Multi-line texts are emitted line by line so consumers exercise
//! real chunk accumulation.

use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;

use crate::backend::{
    BackendError, GenerationRequest, GenerationStream, GenerativeBackend, TextChunk,
};

enum ScriptedResponse {
    Chunks(Vec<TextChunk>),
    Error(BackendError),
}

#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<std::collections::VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a plain-text response, split into line chunks.
    pub fn push_text(&self, text: &str) {
        let chunks: Vec<TextChunk> = text
            .split_inclusive('\n')
            .map(TextChunk::text)
            .collect();
        self.responses
            .lock()
            .unwrap()
            .push_back(ScriptedResponse::Chunks(chunks));
    }

    /// Queue a response with explicit chunks.
    pub fn push_chunks(&self, chunks: Vec<TextChunk>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(ScriptedResponse::Chunks(chunks));
    }

    /// Queue a failing call.
    pub fn push_error(&self, error: BackendError) {
        self.responses
            .lock()
            .unwrap()
            .push_back(ScriptedResponse::Error(error));
    }

    /// Number of `generate` calls observed so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Prompt of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|r| r.prompt.clone())
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationStream, BackendError> {
        self.requests.lock().unwrap().push(request);

        let response = self.responses.lock().unwrap().pop_front();
        match response {
            Some(ScriptedResponse::Chunks(chunks)) => {
                Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok))))
            }
            Some(ScriptedResponse::Error(error)) => Err(error),
            // Nothing scripted: behave like a silent backend.
            None => Ok(Box::pin(stream::empty())),
        }
    }
}
