use async_trait::async_trait;

use crate::types::Chunk;
use crate::Result;

/// Embedding-backed chunk collection, read-only once built.
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Up to `k` chunks ordered by decreasing relevance to `text`.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Chunk>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases whatever the index holds outside the process.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
