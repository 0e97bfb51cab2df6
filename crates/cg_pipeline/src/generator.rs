use std::sync::Arc;

use tracing::{debug, info};

use cg_core::config::MemoryConfig;
use cg_core::{
    ChatMessage, Chunk, Error, GeneratedArticle, GenerationRequest, InterviewQuestion, Outline,
    OutlineSection, Result, RetrievalIndex, TextGenerator,
};
use cg_storage::{query_degrading, DegradingRetry};

use crate::memory::GenerationMemory;

/// Writes article sections one after another, feeding each call the text
/// already written so that later sections build on earlier ones.
#[derive(Debug, Clone)]
pub struct SectionGenerator {
    generator: Arc<dyn TextGenerator>,
    retry: DegradingRetry,
    memory: MemoryConfig,
}

fn system_prompt(topic: &str, outline: &Outline) -> Result<String> {
    Ok(format!(
        "You are a content SEO specialist writing a blog article.\n\
         Topic: {}\n\
         Article outline: {}\n\
         Use the previous messages to avoid repeating yourself while writing each section.",
        topic,
        serde_json::to_string(outline)?
    ))
}

fn format_evidence(evidence: &[Chunk]) -> String {
    if evidence.is_empty() {
        return "No relevant documents were found.".to_string();
    }
    evidence
        .iter()
        .map(|chunk| chunk.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_interview(questions: &[InterviewQuestion]) -> String {
    questions
        .iter()
        .map(|q| format!("Q: {}\nA: {}", q.question, q.answer.as_deref().unwrap_or("(no answer)")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn section_prompt(section: &OutlineSection, evidence: &[Chunk], questions: &[InterviewQuestion]) -> String {
    format!(
        "You are currently writing the section: {title}\n\
         ---\n\
         Relevant documents, to use only as optional context. Never copy them word for word, \
         that would be plagiarism:\n\
         {evidence}\n\
         ---\n\
         Interview questions and my answers:\n\
         {interview}\n\
         ---\n\
         Write the section in markdown, starting with the heading `## {title}`. Use bullet or \
         numbered lists where they help and keep paragraphs short. Only write this section.",
        title = section.title,
        evidence = format_evidence(evidence),
        interview = format_interview(questions),
    )
}

impl SectionGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, retry: DegradingRetry, memory: MemoryConfig) -> Self {
        Self {
            generator,
            retry,
            memory,
        }
    }

    /// Fresh memory for one article run.
    pub fn new_memory(&self) -> GenerationMemory {
        GenerationMemory::from_config(self.generator.clone(), &self.memory)
    }

    /// Writes one section. Retrieval problems only shrink the evidence; a
    /// failed generation call is returned as `Error::Generation`.
    pub async fn generate_section(
        &self,
        system: &str,
        section: &OutlineSection,
        questions: &[InterviewQuestion],
        index: &dyn RetrievalIndex,
        memory: &mut GenerationMemory,
    ) -> Result<String> {
        let retrieved = query_degrading(index, &section.title, &self.retry).await;
        debug!(
            "Section {:?}: {} evidence chunks after {} attempts",
            section.title,
            retrieved.chunks.len(),
            retrieved.attempts
        );

        let mut messages = vec![ChatMessage::system(system)];
        messages.extend(memory.as_messages());
        messages.push(ChatMessage::user(section_prompt(section, &retrieved.chunks, questions)));

        let text = self
            .generator
            .generate(&GenerationRequest::new(messages))
            .await
            .map_err(Error::into_generation)?;

        memory.record_output(&text).await;
        Ok(text)
    }

    /// Writes every section of `outline` in order with a memory of its own.
    pub async fn generate_article(
        &self,
        topic: &str,
        outline: &Outline,
        questions: &[InterviewQuestion],
        index: &dyn RetrievalIndex,
    ) -> Result<GeneratedArticle> {
        let mut memory = self.new_memory();
        self.write_sections(topic, outline, questions, index, &mut memory).await
    }

    pub async fn write_sections(
        &self,
        topic: &str,
        outline: &Outline,
        questions: &[InterviewQuestion],
        index: &dyn RetrievalIndex,
        memory: &mut GenerationMemory,
    ) -> Result<GeneratedArticle> {
        let system = system_prompt(topic, outline)?;
        let total = outline.sections.len();
        let mut article = GeneratedArticle {
            sections: Vec::with_capacity(total),
        };

        for (i, section) in outline.sections.iter().enumerate() {
            info!("✍️ Writing section {}/{}: {}", i + 1, total, section.title);
            let text = self
                .generate_section(&system, section, questions, index, memory)
                .await?;
            article.sections.push(text);
        }

        info!("✨ Wrote {} sections for \"{}\"", article.len(), outline.title);
        Ok(article)
    }
}
