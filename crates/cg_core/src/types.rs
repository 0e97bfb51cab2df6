use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of interview questions asked per topic.
pub const QUESTION_BATCH_SIZE: usize = 5;

pub type Metadata = BTreeMap<String, String>;

/// Plain text of a collected web page (or local file) plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub collected_at: DateTime<Utc>,
}

impl SourceDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
            collected_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").map(String::as_str)
    }
}

/// A contiguous slice of a document's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Position of the chunk within its parent document.
    pub index: usize,
    /// Byte offset of `text` in the parent document.
    pub offset: usize,
    /// Leading bytes of `text` shared with the previous chunk.
    pub overlap_len: usize,
    pub metadata: Metadata,
}

impl Chunk {
    /// The part of the chunk not already covered by its predecessor.
    pub fn fresh_text(&self) -> &str {
        &self.text[self.overlap_len..]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentSummary {
    /// A concise summary of the whole text.
    pub concise_summary: String,
    /// The tone and writing style of the text.
    pub writing_style: String,
    /// The unique key points made in the text.
    pub key_points: Vec<String>,
    /// Opinions attributed to experts, if any are quoted.
    #[serde(default)]
    pub expert_opinions: Option<Vec<String>>,
    #[serde(default)]
    #[schemars(skip)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InterviewQuestion {
    /// An open-ended interview question to ask.
    pub question: String,
    #[serde(default)]
    #[schemars(skip)]
    pub answer: Option<String>,
}

impl InterviewQuestion {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InterviewQuestions {
    /// Exactly five interview questions.
    #[schemars(length(min = 5, max = 5))]
    pub questions: Vec<InterviewQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutlineSection {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Outline {
    /// The article title.
    pub title: String,
    /// Section headings, in reading order.
    #[serde(alias = "sub_headings")]
    pub sections: Vec<OutlineSection>,
}

/// Section texts, index-aligned with `Outline::sections`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub sections: Vec<String>,
}

impl GeneratedArticle {
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
