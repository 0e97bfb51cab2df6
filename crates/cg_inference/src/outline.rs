use std::sync::Arc;

use tracing::info;

use cg_core::{
    ChatMessage, DocumentSummary, GenerationRequest, InterviewQuestion, Outline, Result,
    TextGenerator,
};

use crate::structured::{parse_structured, StructuredOutput};

#[derive(Debug, Clone)]
pub struct OutlineBuilder {
    generator: Arc<dyn TextGenerator>,
}

impl OutlineBuilder {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// One structured call; a malformed response is returned as `SchemaParse`
    /// without retrying.
    pub async fn build_outline(
        &self,
        topic: &str,
        summaries: &[DocumentSummary],
        answered_questions: &[InterviewQuestion],
    ) -> Result<Outline> {
        info!("🗂️ Generating the outline for {}", topic);

        let prompt = format!(
            "Based on my answers and the summaries, generate an outline for a blog article.\n\
             Topic: {}\n\
             Document summaries: {}\n\
             ---\n\
             Here is the interview which I answered: {}\n\
             ---\n\
             {}",
            topic,
            serde_json::to_string(summaries)?,
            serde_json::to_string(answered_questions)?,
            Outline::format_instructions()
        );
        let request = GenerationRequest::new(vec![ChatMessage::system(prompt)])
            .with_schema(Outline::output_schema());

        let raw = self.generator.generate(&request).await?;
        let outline: Outline = parse_structured(&raw)?;

        info!("✨ Outline \"{}\" with {} sections", outline.title, outline.sections.len());
        Ok(outline)
    }
}
