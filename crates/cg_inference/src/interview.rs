use std::sync::Arc;

use tracing::info;

use cg_core::{
    ChatMessage, DocumentSummary, GenerationRequest, InterviewQuestion, InterviewQuestions, Result,
    TextGenerator, QUESTION_BATCH_SIZE,
};

use crate::structured::{parse_structured, StructuredOutput};

const QUESTION_TEMPERATURE: f32 = 0.6;

/// Asks the model for the expert-interview questions.
#[derive(Debug, Clone)]
pub struct QuestionSynthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl QuestionSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Exactly `QUESTION_BATCH_SIZE` unanswered questions, or `SchemaParse`.
    pub async fn synthesize_questions(
        &self,
        topic: &str,
        summaries: &[DocumentSummary],
    ) -> Result<Vec<InterviewQuestion>> {
        info!("❓ Synthesizing interview questions for {}", topic);

        let summaries_json = serde_json::to_string(summaries)?;
        let system = format!(
            "You are a content SEO researcher. You have already summarized and extracted key points \
             from the top search results for a topic. You are now going to interview a content expert \
             about that topic.\n\
             Topic: {topic}\n\
             Document summaries: {summaries_json}\n\
             ---\n\
             You must follow these rules:\n\
             - Return a list of questions you would ask a content expert about the topic.\n\
             - Ask exactly {count} questions.\n\
             - Look for information gain and unique insights not already covered by the document summaries.\n\
             - Ask open-ended questions, never yes/no questions.\n\
             {instructions}",
            topic = topic,
            summaries_json = summaries_json,
            count = QUESTION_BATCH_SIZE,
            instructions = InterviewQuestions::format_instructions(),
        );
        let request = GenerationRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(format!("Give me the first {} questions", QUESTION_BATCH_SIZE)),
        ])
        .with_schema(InterviewQuestions::output_schema())
        .with_temperature(QUESTION_TEMPERATURE);

        let raw = self.generator.generate(&request).await?;
        let parsed: InterviewQuestions = parse_structured(&raw)?;

        Ok(parsed
            .questions
            .into_iter()
            .map(|q| InterviewQuestion::new(q.question.trim()))
            .collect())
    }
}
