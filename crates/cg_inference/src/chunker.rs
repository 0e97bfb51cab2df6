use std::sync::Arc;

use cg_core::config::ChunkSettings;
use cg_core::{Chunk, Error, Result, SourceDocument};

use crate::tokenizer::{Tokenizer, WordTokenizer};

/// Cuts documents into token-bounded, overlapping chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
    tokenizer: Arc<dyn Tokenizer>,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("Chunk size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "Chunk overlap ({}) must be smaller than the chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            tokenizer,
        })
    }

    pub fn from_settings(settings: ChunkSettings, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
        Self::new(settings.chunk_size, settings.overlap, tokenizer)
    }

    pub fn with_word_tokens(chunk_size: usize, overlap: usize) -> Result<Self> {
        Self::new(chunk_size, overlap, Arc::new(WordTokenizer))
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    pub fn chunk(&self, document: &SourceDocument) -> Vec<Chunk> {
        let text = document.content.as_str();
        if text.trim().is_empty() {
            return Vec::new();
        }

        let spans = self.tokenizer.encode(text);
        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut previous_end = 0usize;

        loop {
            let end = (start + self.chunk_size).min(spans.len());
            let from = spans[start].start;
            let to = spans[end - 1].end;
            chunks.push(Chunk {
                text: text[from..to].to_string(),
                index: chunks.len(),
                offset: from,
                overlap_len: previous_end.saturating_sub(from),
                metadata: document.metadata.clone(),
            });
            if end == spans.len() {
                break;
            }
            previous_end = to;
            start += step;
        }

        chunks
    }

    pub fn chunk_all(&self, documents: &[SourceDocument]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.chunk(d)).collect()
    }
}
