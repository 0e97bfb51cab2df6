use std::fmt;

use cg_core::{Embedder, GenerationRequest, Result, Role, TextGenerator, QUESTION_BATCH_SIZE};
use serde_json::json;

const EMBEDDING_SIZE: usize = 256;

/// Offline backend: canned, schema-shaped answers and bag-of-words embeddings.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of the first `label: value` line found in the prompt.
fn find_field(prompt: &str, label: &str) -> Option<String> {
    prompt.lines().find_map(|line| {
        let line = line.trim();
        let (key, value) = line.split_once(':')?;
        (key.trim().eq_ignore_ascii_case(label) && !value.trim().is_empty())
            .then(|| value.trim().to_string())
    })
}

fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

impl DummyModel {
    fn respond(&self, request: &GenerationRequest) -> String {
        let prompt = request.prompt_text();
        let topic = find_field(&prompt, "topic").unwrap_or_else(|| "the topic".to_string());

        match request.schema.as_ref().map(|s| s.name) {
            Some("DocumentSummary") => {
                let text = find_field(&prompt, "text").unwrap_or_else(|| first_words(&prompt, 20));
                json!({
                    "concise_summary": first_words(&text, 20),
                    "writing_style": "informative",
                    "key_points": text
                        .split(['.', '!', '?'])
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .take(3)
                        .collect::<Vec<_>>(),
                })
                .to_string()
            }
            Some("InterviewQuestions") => {
                let questions: Vec<_> = [
                    "What first drew you to",
                    "What do most people misunderstand about",
                    "How has your view changed on",
                    "What would you tell a newcomer about",
                    "Where do you see the future of",
                ]
                .iter()
                .take(QUESTION_BATCH_SIZE)
                .map(|lead| json!({ "question": format!("{} {}?", lead, topic) }))
                .collect();
                json!({ "questions": questions }).to_string()
            }
            Some("Outline") => json!({
                "title": format!("A Practical Guide to {}", topic),
                "sections": [
                    { "title": format!("What is {}?", topic) },
                    { "title": "Where it came from" },
                    { "title": "How it works in practice" },
                    { "title": "What comes next" },
                ],
            })
            .to_string(),
            Some(other) => json!({ "error": format!("unsupported schema {}", other) }).to_string(),
            None => {
                let section = find_field(&prompt, "You are currently writing the section")
                    .unwrap_or_else(|| topic.clone());
                let continued = request.messages.iter().any(|m| m.role == Role::Assistant);
                format!(
                    "## {}\n\n{} is discussed here in the context of {}.\n\n- Key idea one\n- Key idea two{}",
                    section,
                    section,
                    topic,
                    if continued { "\n\nThis builds on the previous sections." } else { "" }
                )
            }
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    fn max_input_tokens(&self) -> usize {
        16_000
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        Ok(self.respond(request))
    }
}

#[async_trait::async_trait]
impl Embedder for DummyModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; EMBEDDING_SIZE];

        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            // FNV-1a keeps buckets stable across runs.
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.to_lowercase().bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x100000001b3);
            }
            embedding[(hash % EMBEDDING_SIZE as u64) as usize] += 1.0;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::{parse_structured, StructuredOutput};
    use cg_core::{ChatMessage, DocumentSummary, InterviewQuestions, Outline};

    fn structured<T: StructuredOutput>(prompt: &str) -> GenerationRequest {
        GenerationRequest::new(vec![ChatMessage::user(prompt)]).with_schema(T::output_schema())
    }

    #[tokio::test]
    async fn test_dummy_model_structured_outputs_parse() {
        let model = DummyModel::new();

        let raw = model
            .generate(&structured::<DocumentSummary>("text: Memes spread. Memes mutate."))
            .await
            .unwrap();
        let summary: DocumentSummary = parse_structured(&raw).unwrap();
        assert_eq!(summary.key_points, vec!["Memes spread", "Memes mutate"]);

        let raw = model
            .generate(&structured::<InterviewQuestions>("topic: Memetics"))
            .await
            .unwrap();
        let questions: InterviewQuestions = parse_structured(&raw).unwrap();
        assert_eq!(questions.questions.len(), 5);
        assert!(questions.questions[0].question.ends_with("Memetics?"));

        let raw = model.generate(&structured::<Outline>("topic: Memetics")).await.unwrap();
        let outline: Outline = parse_structured(&raw).unwrap();
        assert_eq!(outline.sections.len(), 4);
    }

    #[tokio::test]
    async fn test_dummy_model_writes_requested_section() {
        let model = DummyModel::new();
        let request = GenerationRequest::new(vec![ChatMessage::user(
            "You are currently writing the section: Origins\nSection text:",
        )]);
        let text = model.generate(&request).await.unwrap();
        assert!(text.starts_with("## Origins"));
    }

    #[tokio::test]
    async fn test_dummy_embeddings_are_stable_and_normalized() {
        let model = DummyModel::new();
        let a = model.embed("Memes spread between minds").await.unwrap();
        let b = model.embed("Memes spread between minds").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), EMBEDDING_SIZE);
        let norm = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(model.embed("").await.unwrap().iter().all(|x| *x == 0.0));
    }
}
