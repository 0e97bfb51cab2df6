pub mod memory;

#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use memory::InMemoryIndex;

#[cfg(feature = "qdrant")]
pub use qdrant::QdrantIndex;
