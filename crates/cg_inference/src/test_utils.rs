//! Scriptable capabilities for tests in this and downstream crates.

use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use cg_core::{Embedder, Error, GenerationRequest, Result, TextGenerator};

type Responder = Box<dyn Fn(&GenerationRequest) -> Result<String> + Send + Sync>;

/// Text generator driven by a closure; records every request it receives.
pub struct FnGenerator {
    responder: Responder,
    requests: Mutex<Vec<GenerationRequest>>,
    max_input_tokens: usize,
}

impl FnGenerator {
    pub fn new(responder: impl Fn(&GenerationRequest) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            max_input_tokens: 16_000,
        }
    }

    /// Always answers with `text`.
    pub fn constant(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Always fails with an inference error.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(Error::Inference(message.clone())))
    }

    pub fn with_max_input_tokens(mut self, max_input_tokens: usize) -> Self {
        self.max_input_tokens = max_input_tokens;
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

impl fmt::Debug for FnGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGenerator")
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl TextGenerator for FnGenerator {
    fn name(&self) -> &str {
        "FnGenerator"
    }

    fn max_input_tokens(&self) -> usize {
        self.max_input_tokens
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        (self.responder)(request)
    }
}

/// Embeds text as a vector of letter frequencies.
#[derive(Debug, Default)]
pub struct LetterEmbedder;

#[async_trait]
impl Embedder for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; 26];
        for c in text.chars().filter(char::is_ascii_alphabetic) {
            embedding[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        Ok(embedding)
    }
}
