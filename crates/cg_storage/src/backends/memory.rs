use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};

use cg_core::{Chunk, Embedder, Error, Result, RetrievalIndex};

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Brute-force cosine index held in process memory.
pub struct InMemoryIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(Chunk, Vec<f32>)>,
    dimension: usize,
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex")
            .field("entries", &self.entries.len())
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl InMemoryIndex {
    /// Embeds every chunk, at most `concurrency` at a time.
    pub async fn build(embedder: Arc<dyn Embedder>, chunks: Vec<Chunk>, concurrency: usize) -> Result<Self> {
        let embeddings: Vec<Vec<f32>> = stream::iter(chunks.iter())
            .map(|chunk| embedder.embed(&chunk.text))
            .buffered(concurrency.max(1))
            .try_collect()
            .await?;

        let dimension = embeddings.first().map_or(0, Vec::len);
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(Error::Storage(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                dimension,
                bad.len()
            )));
        }

        Ok(Self {
            embedder,
            entries: chunks.into_iter().zip(embeddings).collect(),
            dimension,
        })
    }
}

#[async_trait]
impl RetrievalIndex for InMemoryIndex {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Chunk>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| Error::Retrieval(format!("Failed to embed query: {}", e)))?;
        if query.len() != self.dimension {
            return Err(Error::Retrieval(format!(
                "Query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(f32, &Chunk)> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| (cosine_similarity(&query, embedding), chunk))
            .collect();
        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored.into_iter().take(k).map(|(_, chunk)| chunk.clone()).collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
