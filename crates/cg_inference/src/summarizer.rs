use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use cg_core::{
    ChatMessage, DocumentSummary, Error, GenerationRequest, Result, SourceDocument, TextGenerator,
};

use crate::chunker::Chunker;
use crate::structured::{parse_structured, StructuredOutput};

const SUMMARY_TEMPERATURE: f32 = 0.0;

/// Writes one structured summary per source document.
#[derive(Debug, Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    chunker: Chunker,
    max_concurrency: usize,
}

fn summary_prompt(text: &str) -> String {
    format!(
        "Act as a content SEO researcher. You are summarizing and extracting key points from the \
         text below. The insights will be compared across several articles on the same subject.\n\
         ---\n\
         - Analyze the text and extract its key points and opinions.\n\
         - Quote expert opinions only when the text attributes them to someone.\n\
         Text: {}\n\
         ---\n\
         {}",
        text,
        DocumentSummary::format_instructions()
    )
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, chunker: Chunker) -> Self {
        Self {
            generator,
            chunker,
            max_concurrency: 10,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Summarizes the leading chunk of `document`.
    ///
    /// Returns `Ok(None)` for documents that produce no chunks.
    pub async fn summarize(&self, document: &SourceDocument) -> Result<Option<DocumentSummary>> {
        let chunks = self.chunker.chunk(document);
        let Some(first) = chunks.first() else {
            debug!("Skipping empty document {:?}", document.source());
            return Ok(None);
        };

        let tokenizer = self.chunker.tokenizer();
        let overhead = tokenizer.count(&summary_prompt(""));
        let budget = self.generator.max_input_tokens().saturating_sub(overhead);
        let text = tokenizer.truncate(&first.text, budget);
        if text.trim().is_empty() {
            return Err(Error::Config(format!(
                "Model input limit ({} tokens) leaves no room for document text",
                self.generator.max_input_tokens()
            )));
        }

        let request = GenerationRequest::new(vec![ChatMessage::user(summary_prompt(text))])
            .with_schema(DocumentSummary::output_schema())
            .with_temperature(SUMMARY_TEMPERATURE);

        let started = Instant::now();
        let raw = self.generator.generate(&request).await?;
        debug!("Summary generated in {:?}", started.elapsed());

        let mut summary: DocumentSummary = parse_structured(&raw)?;
        summary.metadata = document.metadata.clone();
        Ok(Some(summary))
    }

    /// Summarizes every document concurrently, in completion order.
    ///
    /// Failing or empty documents are dropped; the call only fails when no
    /// document produced a summary.
    pub async fn summarize_all(&self, documents: &[SourceDocument]) -> Result<Vec<DocumentSummary>> {
        info!("📝 Summarizing {} documents", documents.len());

        let outcomes: Vec<_> = stream::iter(documents)
            .map(|document| async move { (document, self.summarize(document).await) })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut summaries = Vec::with_capacity(outcomes.len());
        for (document, outcome) in outcomes {
            match outcome {
                Ok(Some(summary)) => summaries.push(summary),
                Ok(None) => {}
                Err(e) => warn!(
                    "⚠️ Summary failed for {}: {}",
                    document.source().unwrap_or("<unknown source>"),
                    e
                ),
            }
        }

        if summaries.is_empty() {
            return Err(Error::EmptyResult(format!(
                "No summaries were created from {} documents",
                documents.len()
            )));
        }

        info!("✨ Created {}/{} summaries", summaries.len(), documents.len());
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FnGenerator;
    use crate::tokenizer::Tokenizer;
    use serde_json::json;

    fn summary_json(text: &str) -> String {
        json!({
            "concise_summary": text,
            "writing_style": "casual",
            "key_points": ["one", "two"],
            "metadata": { "source": "invented-by-model" }
        })
        .to_string()
    }

    /// Answers with a summary of the prompt's text line, or fails when the
    /// text mentions "explode".
    fn echo_generator() -> Arc<FnGenerator> {
        Arc::new(FnGenerator::new(|request| {
            let prompt = request.prompt_text();
            let text = prompt
                .lines()
                .find_map(|l| l.strip_prefix("Text: "))
                .unwrap_or_default()
                .to_string();
            if text.contains("explode") {
                return Err(Error::Inference("rate limited".to_string()));
            }
            Ok(summary_json(&text))
        }))
    }

    fn summarizer(generator: Arc<FnGenerator>) -> Summarizer {
        Summarizer::new(generator, Chunker::with_word_tokens(7000, 0).unwrap())
    }

    fn doc(text: &str, source: &str) -> SourceDocument {
        SourceDocument::new(text).with_metadata("source", source)
    }

    #[tokio::test]
    async fn test_summary_metadata_comes_from_document() {
        let generator = echo_generator();
        let summary = summarizer(generator.clone())
            .summarize(&doc("Memes are units of culture.", "https://a.example"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.concise_summary, "Memes are units of culture.");
        assert_eq!(summary.metadata.get("source").unwrap(), "https://a.example");
        assert_eq!(summary.metadata.len(), 1);

        let request = &generator.requests()[0];
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.schema.as_ref().unwrap().name, "DocumentSummary");
    }

    #[tokio::test]
    async fn test_empty_document_is_absent_without_calling_model() {
        let generator = echo_generator();
        let result = summarizer(generator.clone()).summarize(&doc("   ", "x")).await.unwrap();
        assert!(result.is_none());
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_only_leading_chunk_is_summarized() {
        let generator = echo_generator();
        let summarizer = Summarizer::new(generator.clone(), Chunker::with_word_tokens(5, 0).unwrap());
        let summary = summarizer
            .summarize(&doc("alpha beta gamma delta epsilon zeta", "x"))
            .await
            .unwrap()
            .unwrap();
        // 5 tokens: "alpha", " ", "beta", " ", "gamma"
        assert_eq!(summary.concise_summary, "alpha beta gamma");
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_text_is_cut_to_model_input_limit() {
        let overhead = crate::tokenizer::WordTokenizer.count(&summary_prompt(""));
        let generator = Arc::new(
            FnGenerator::new(|request| {
                let prompt = request.prompt_text();
                let text = prompt.lines().find_map(|l| l.strip_prefix("Text: ")).unwrap_or_default();
                Ok(summary_json(text))
            })
            .with_max_input_tokens(overhead + 3),
        );
        let summary = summarizer(generator)
            .summarize(&doc("alpha beta gamma delta", "x"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.concise_summary, "alpha beta");
    }

    #[tokio::test]
    async fn test_malformed_output_is_schema_error() {
        let generator = Arc::new(FnGenerator::constant("{\"concise_summary\": 3}"));
        let err = summarizer(generator).summarize(&doc("text", "x")).await.unwrap_err();
        assert!(matches!(err, Error::SchemaParse { schema: "DocumentSummary", .. }));
    }

    #[tokio::test]
    async fn test_summarize_all_drops_failures_and_empties() {
        let documents = vec![
            doc("Memes replicate.", "a"),
            doc("", "b"),
            doc("This one will explode.", "c"),
            doc("Memes compete for attention.", "d"),
            doc("Memes mutate.", "e"),
        ];
        let summaries = summarizer(echo_generator()).summarize_all(&documents).await.unwrap();

        assert_eq!(summaries.len(), 3);
        let mut sources: Vec<_> = summaries
            .iter()
            .map(|s| s.metadata["source"].as_str())
            .collect();
        sources.sort();
        assert_eq!(sources, vec!["a", "d", "e"]);
    }

    #[tokio::test]
    async fn test_summarize_all_fails_when_nothing_survives() {
        let documents = vec![doc("", "a"), doc("explode", "b")];
        let err = summarizer(echo_generator()).summarize_all(&documents).await.unwrap_err();
        assert!(matches!(err, Error::EmptyResult(_)));

        let err = summarizer(echo_generator()).summarize_all(&[]).await.unwrap_err();
        assert!(matches!(err, Error::EmptyResult(_)));
    }
}
