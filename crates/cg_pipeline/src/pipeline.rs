use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cg_core::{
    AnswerProvider, Config, DocumentCollector, DocumentSummary, Embedder, Error, GeneratedArticle,
    InterviewQuestion, Outline, Result, RetrievalIndex, SourceDocument, QUESTION_BATCH_SIZE,
};
use cg_inference::{Chunker, Models, OutlineBuilder, QuestionSynthesizer, Summarizer, WordTokenizer};
use cg_storage::{build_index, DegradingRetry, IndexBackend};

use crate::generator::SectionGenerator;

/// Everything gathered before the interview: sources, their summaries and
/// the questions to put to the author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Research {
    pub topic: String,
    pub documents: Vec<SourceDocument>,
    pub summaries: Vec<DocumentSummary>,
    pub questions: Vec<InterviewQuestion>,
}

impl Research {
    /// Attaches the author's answers. All questions must be answered.
    pub fn answer(mut self, answers: Vec<String>) -> Result<Interview> {
        let answers: Vec<String> = answers.into_iter().map(|a| a.trim().to_string()).collect();
        let got = answers.iter().filter(|a| !a.is_empty()).count();
        if got != QUESTION_BATCH_SIZE || answers.len() != self.questions.len() {
            return Err(Error::IncompleteAnswers {
                expected: QUESTION_BATCH_SIZE,
                got,
            });
        }

        for (question, answer) in self.questions.iter_mut().zip(answers) {
            question.answer = Some(answer);
        }
        Ok(Interview { research: self })
    }

    pub async fn answer_with(self, provider: &dyn AnswerProvider) -> Result<Interview> {
        let answers = provider.answers(&self.questions).await?;
        self.answer(answers)
    }
}

/// Research whose every question carries an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Interview {
    research: Research,
}

impl Interview {
    pub fn topic(&self) -> &str {
        &self.research.topic
    }

    pub fn documents(&self) -> &[SourceDocument] {
        &self.research.documents
    }

    pub fn summaries(&self) -> &[DocumentSummary] {
        &self.research.summaries
    }

    pub fn questions(&self) -> &[InterviewQuestion] {
        &self.research.questions
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub outline: Outline,
    pub article: GeneratedArticle,
}

impl Draft {
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n", self.outline.title.trim());
        for section in &self.article.sections {
            out.push('\n');
            out.push_str(section.trim());
            out.push('\n');
        }
        out
    }
}

pub fn save_research(research: &Research, path: &Path) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(research)?)?;
    info!("💾 Saved research on {} to {}", research.topic, path.display());
    Ok(())
}

pub fn load_research(path: &Path) -> Result<Research> {
    let research: Research = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    info!("📂 Loaded research on {} from {}", research.topic, path.display());
    Ok(research)
}

/// Research, interview and writing stages wired to one set of models.
pub struct Pipeline {
    collector: Arc<dyn DocumentCollector>,
    embedder: Arc<dyn Embedder>,
    summarizer: Summarizer,
    questions: QuestionSynthesizer,
    outliner: OutlineBuilder,
    sections: SectionGenerator,
    retrieval_chunker: Chunker,
    backend: IndexBackend,
    embedding_concurrency: usize,
}

impl Pipeline {
    pub fn new(config: &Config, models: Models, collector: Arc<dyn DocumentCollector>) -> Result<Self> {
        let tokenizer = Arc::new(WordTokenizer);
        let summary_chunker = Chunker::from_settings(config.chunking.summary, tokenizer.clone())?;
        let retrieval_chunker = Chunker::from_settings(config.chunking.retrieval, tokenizer)?;

        Ok(Self {
            collector,
            embedder: models.embedder,
            summarizer: Summarizer::new(models.generator.clone(), summary_chunker)
                .with_max_concurrency(config.summarizer.max_concurrency),
            questions: QuestionSynthesizer::new(models.generator.clone()),
            outliner: OutlineBuilder::new(models.generator.clone()),
            sections: SectionGenerator::new(
                models.generator,
                DegradingRetry::from_config(&config.retrieval),
                config.memory.clone(),
            ),
            retrieval_chunker,
            backend: IndexBackend::default(),
            embedding_concurrency: config.retrieval.embedding_concurrency,
        })
    }

    pub fn with_index_backend(mut self, backend: IndexBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Collects sources, summarizes them and drafts the interview questions.
    pub async fn research(&self, topic: &str) -> Result<Research> {
        info!("🚀 Researching {} with the {} collector", topic, self.collector.name());

        let documents = self.collector.collect(topic).await?;
        if documents.is_empty() {
            return Err(Error::Collection(format!("No sources found for {}", topic)));
        }
        info!("📚 Collected {} documents", documents.len());

        let summaries = self.summarizer.summarize_all(&documents).await?;
        let questions = self.questions.synthesize_questions(topic, &summaries).await?;

        Ok(Research {
            topic: topic.to_string(),
            documents,
            summaries,
            questions,
        })
    }

    /// Outlines the article, indexes the sources and writes every section.
    pub async fn write(&self, interview: &Interview) -> Result<Draft> {
        let topic = interview.topic();
        let outline = self
            .outliner
            .build_outline(topic, interview.summaries(), interview.questions())
            .await?;

        let chunks = self.retrieval_chunker.chunk_all(interview.documents());
        let index = build_index(&self.backend, self.embedder.clone(), chunks, self.embedding_concurrency).await?;

        let article = self
            .write_article(topic, &outline, interview.questions(), index.as_ref())
            .await?;

        info!("🎉 Finished \"{}\"", outline.title);
        Ok(Draft { outline, article })
    }

    /// Writes the sections, then closes `index` whether or not writing succeeded.
    async fn write_article(
        &self,
        topic: &str,
        outline: &Outline,
        questions: &[InterviewQuestion],
        index: &dyn RetrievalIndex,
    ) -> Result<GeneratedArticle> {
        let article = self.sections.generate_article(topic, outline, questions, index).await;
        if let Err(e) = index.close().await {
            warn!("⚠️ Failed to close the retrieval index: {}", e);
        }
        article
    }

    pub async fn run(&self, topic: &str, answers: &dyn AnswerProvider) -> Result<Draft> {
        let interview = self.research(topic).await?.answer_with(answers).await?;
        self.write(&interview).await
    }
}
