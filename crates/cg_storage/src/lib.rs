use std::sync::Arc;

use cg_core::{Chunk, Embedder, Result, RetrievalIndex};

pub mod backends;
pub mod retry;

pub use backends::*;
pub use retry::{query_degrading, Backoff, DegradingRetry, Retrieved};

/// Where the retrieval index lives for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IndexBackend {
    #[default]
    Memory,
    #[cfg(feature = "qdrant")]
    Qdrant { url: String },
}

/// Embeds `chunks` into a fresh index. The index is read-only afterwards.
pub async fn build_index(
    backend: &IndexBackend,
    embedder: Arc<dyn Embedder>,
    chunks: Vec<Chunk>,
    concurrency: usize,
) -> Result<Arc<dyn RetrievalIndex>> {
    tracing::info!("🔢 Embedding {} chunks into the retrieval index", chunks.len());
    match backend {
        IndexBackend::Memory => Ok(Arc::new(InMemoryIndex::build(embedder, chunks, concurrency).await?)),
        #[cfg(feature = "qdrant")]
        IndexBackend::Qdrant { url } => Ok(Arc::new(QdrantIndex::build(url, embedder, chunks).await?)),
    }
}

pub mod prelude {
    pub use super::retry::{query_degrading, DegradingRetry};
    pub use super::{build_index, IndexBackend};
}
