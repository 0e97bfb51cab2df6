use async_trait::async_trait;

use crate::types::{InterviewQuestion, SourceDocument};
use crate::Result;

#[async_trait]
pub trait DocumentCollector: Send + Sync {
    fn name(&self) -> &str;

    /// Gathers source documents for `topic`. Fails with `Error::Collection`
    /// when nothing usable was found.
    async fn collect(&self, topic: &str) -> Result<Vec<SourceDocument>>;
}

/// Supplies the human answers to the synthesized interview questions.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    async fn answers(&self, questions: &[InterviewQuestion]) -> Result<Vec<String>>;
}
