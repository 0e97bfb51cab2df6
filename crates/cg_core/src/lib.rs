pub mod collect;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use collect::{AnswerProvider, DocumentCollector};
pub use config::Config;
pub use error::{Error, Result};
pub use models::{ChatMessage, Embedder, GenerationRequest, OutputSchema, Role, TextGenerator};
pub use storage::RetrievalIndex;
pub use types::*;
