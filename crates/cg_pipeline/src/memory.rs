use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use cg_core::config::MemoryConfig;
use cg_core::{ChatMessage, GenerationRequest, Result, TextGenerator};
use cg_inference::{Tokenizer, WordTokenizer};

const CONDENSE_PROMPT: &str = "Progressively summarize the article sections written so far, \
adding onto the previous summary and returning a new summary. Keep the facts, names and \
claims already covered so later sections do not repeat them.";

const SUMMARY_HEADER: &str = "Summary of the sections written so far:\n";

/// Bounded history of the text the writer has already produced.
///
/// Only model outputs can be recorded. Once the messages returned by
/// [`as_messages`](Self::as_messages) exceed `max_tokens`, the oldest outputs
/// are folded into a rolling summary written by the same generator. The
/// summary message, header included, counts against the budget.
pub struct GenerationMemory {
    generator: Arc<dyn TextGenerator>,
    tokenizer: Arc<dyn Tokenizer>,
    max_tokens: usize,
    summary: Option<String>,
    outputs: VecDeque<String>,
}

impl fmt::Debug for GenerationMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationMemory")
            .field("max_tokens", &self.max_tokens)
            .field("tokens", &self.token_count())
            .field("outputs", &self.outputs.len())
            .field("has_summary", &self.summary.is_some())
            .finish()
    }
}

impl GenerationMemory {
    pub fn new(generator: Arc<dyn TextGenerator>, tokenizer: Arc<dyn Tokenizer>, max_tokens: usize) -> Self {
        Self {
            generator,
            tokenizer,
            max_tokens,
            summary: None,
            outputs: VecDeque::new(),
        }
    }

    pub fn from_config(generator: Arc<dyn TextGenerator>, config: &MemoryConfig) -> Self {
        Self::new(generator, Arc::new(WordTokenizer), config.max_tokens)
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Recorded outputs still held verbatim, oldest first.
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.outputs.is_empty()
    }

    /// Tokens in the messages handed to the next call.
    pub fn token_count(&self) -> usize {
        self.summary.as_deref().map_or(0, |s| self.tokenizer.count(&summary_message(s)))
            + self.outputs_token_count()
    }

    fn outputs_token_count(&self) -> usize {
        self.outputs.iter().map(|o| self.tokenizer.count(o)).sum()
    }

    /// Conversation context for the next call: the rolling summary as a
    /// system message, then every held output as an assistant message.
    pub fn as_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.outputs.len() + 1);
        if let Some(summary) = &self.summary {
            messages.push(ChatMessage::system(summary_message(summary)));
        }
        messages.extend(self.outputs.iter().map(ChatMessage::assistant));
        messages
    }

    /// Stores one generated text, evicting the oldest ones if the budget is
    /// exceeded. Never fails: a failed condensation drops the evicted text.
    pub async fn record_output(&mut self, output: &str) {
        let output = output.trim();
        if output.is_empty() {
            return;
        }
        self.outputs.push_back(output.to_string());
        self.prune().await;
    }

    async fn prune(&mut self) {
        if self.token_count() <= self.max_tokens {
            return;
        }

        let mut evicted = Vec::new();
        while self.token_count() > self.max_tokens {
            match self.outputs.pop_front() {
                Some(output) => evicted.push(output),
                None => break,
            }
        }

        let previous = self.summary.take();
        let condensed = if evicted.is_empty() {
            previous
        } else {
            match self.condense(previous.as_deref(), &evicted).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!("⚠️ Could not condense {} older sections, dropping them: {}", evicted.len(), e);
                    previous
                }
            }
        };

        let room = self.max_tokens.saturating_sub(self.outputs_token_count());
        let summary_room = room.saturating_sub(self.tokenizer.count(SUMMARY_HEADER));
        self.summary = condensed
            .map(|s| self.tokenizer.truncate(s.trim(), summary_room).trim_end().to_string())
            .filter(|s| !s.is_empty() && self.tokenizer.count(&summary_message(s)) <= room);

        debug!(
            "Memory pruned {} outputs, now {}/{} tokens",
            evicted.len(),
            self.token_count(),
            self.max_tokens
        );
    }

    async fn condense(&self, previous: Option<&str>, evicted: &[String]) -> Result<String> {
        let request = GenerationRequest::new(vec![
            ChatMessage::system(CONDENSE_PROMPT),
            ChatMessage::user(format!(
                "Current summary:\n{}\n\nNew sections:\n{}\n\nNew summary:",
                previous.unwrap_or(""),
                evicted.join("\n\n")
            )),
        ])
        .with_temperature(0.0);
        self.generator.generate(&request).await
    }
}

fn summary_message(summary: &str) -> String {
    format!("{}{}", SUMMARY_HEADER, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_core::Role;
    use cg_inference::test_utils::FnGenerator;

    fn words(n: usize, word: &str) -> String {
        vec![word; n].join(" ")
    }

    #[tokio::test]
    async fn test_outputs_are_kept_under_budget() {
        let generator = Arc::new(FnGenerator::constant("unused"));
        let mut memory = GenerationMemory::new(generator.clone(), Arc::new(WordTokenizer), 100);

        memory.record_output("## Origins\n\nMemes were named in 1976.").await;
        memory.record_output("   ").await;
        memory.record_output("## Spread\n\nThey copy themselves.").await;

        let outputs: Vec<_> = memory.outputs().collect();
        assert_eq!(outputs.len(), 2);
        assert!(outputs[0].starts_with("## Origins"));
        assert!(memory.summary().is_none());
        assert_eq!(generator.call_count(), 0);

        let messages = memory.as_messages();
        assert!(messages.iter().all(|m| m.role == Role::Assistant));
    }

    fn serialized_tokens(memory: &GenerationMemory) -> usize {
        memory
            .as_messages()
            .iter()
            .map(|m| WordTokenizer.count(&m.content))
            .sum()
    }

    #[tokio::test]
    async fn test_eviction_condenses_oldest_outputs() {
        let generator = Arc::new(FnGenerator::constant("Covered origins."));
        let mut memory = GenerationMemory::new(generator.clone(), Arc::new(WordTokenizer), 45);

        // 39 + 5 tokens
        memory.record_output(&words(20, "first")).await;
        memory.record_output(&words(3, "second")).await;
        assert_eq!(generator.call_count(), 0);
        memory.record_output(&words(3, "third")).await;

        assert!(memory.token_count() <= 45);
        assert_eq!(memory.summary(), Some("Covered origins."));
        let outputs: Vec<_> = memory.outputs().collect();
        assert_eq!(outputs, vec![words(3, "second"), words(3, "third")]);

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt_text().contains("first"));
        assert!(!requests[0].prompt_text().contains("second"));

        let messages = memory.as_messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Covered origins."));
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_failed_condensation_drops_evicted_outputs() {
        let generator = Arc::new(FnGenerator::failing("rate limited"));
        let mut memory = GenerationMemory::new(generator, Arc::new(WordTokenizer), 25);

        memory.record_output(&words(10, "first")).await;
        memory.record_output(&words(10, "second")).await;

        assert!(memory.summary().is_none());
        assert!(memory.token_count() <= 25);
        assert_eq!(memory.outputs().count(), 1);
    }

    #[tokio::test]
    async fn test_oversized_summary_is_truncated() {
        let generator = Arc::new(FnGenerator::constant(words(500, "recap")));
        let mut memory = GenerationMemory::new(generator, Arc::new(WordTokenizer), 30);

        memory.record_output(&words(50, "huge")).await;

        assert_eq!(memory.outputs().count(), 0);
        assert!(memory.summary().is_some());
        assert!(memory.token_count() <= 30);
    }

    #[tokio::test]
    async fn test_context_sent_to_model_fits_budget() {
        let generator = Arc::new(FnGenerator::constant(words(500, "recap")));
        let mut memory = GenerationMemory::new(generator, Arc::new(WordTokenizer), 30);

        memory.record_output(&words(50, "huge")).await;
        assert_eq!(serialized_tokens(&memory), memory.token_count());
        assert!(serialized_tokens(&memory) <= memory.max_tokens());

        memory.record_output(&words(4, "short")).await;
        assert_eq!(serialized_tokens(&memory), memory.token_count());
        assert!(serialized_tokens(&memory) <= memory.max_tokens());
    }

    #[tokio::test]
    async fn test_summary_without_room_for_header_is_dropped() {
        let generator = Arc::new(FnGenerator::constant("Covered origins."));
        let mut memory = GenerationMemory::new(generator, Arc::new(WordTokenizer), 10);

        memory.record_output(&words(10, "first")).await;

        assert!(memory.summary().is_none());
        assert!(memory.is_empty());
    }
}
