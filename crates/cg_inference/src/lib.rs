pub mod chunker;
pub mod interview;
pub mod models;
pub mod outline;
pub mod structured;
pub mod summarizer;
pub mod tokenizer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use chunker::Chunker;
pub use interview::QuestionSynthesizer;
pub use models::{create_models, Models};
pub use outline::OutlineBuilder;
pub use structured::{parse_structured, StructuredOutput};
pub use summarizer::Summarizer;
pub use tokenizer::{Tokenizer, WordTokenizer};

pub mod prelude {
    pub use super::{Chunker, OutlineBuilder, QuestionSynthesizer, Summarizer};
    pub use cg_core::{Error, Result};
}
