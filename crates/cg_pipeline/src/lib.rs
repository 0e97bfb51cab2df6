//! Article pipeline: research, interview and section-by-section writing.

pub mod answers;
pub mod generator;
pub mod memory;
pub mod pipeline;

pub use answers::{FileAnswers, StaticAnswers};
pub use generator::SectionGenerator;
pub use memory::GenerationMemory;
pub use pipeline::{load_research, save_research, Draft, Interview, Pipeline, Research};

pub mod prelude {
    pub use super::{Draft, Pipeline, Research, StaticAnswers};
    pub use cg_core::{AnswerProvider, Config, DocumentCollector, Error, Result};
}
