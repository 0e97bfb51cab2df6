use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Collection error: {0}")]
    Collection(String),

    #[error("Could not parse {schema} from model output: {reason}")]
    SchemaParse { schema: &'static str, reason: String },

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Expected {expected} answers, got {got}")]
    IncompleteAnswers { expected: usize, got: usize },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn schema_parse(schema: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::SchemaParse {
            schema,
            reason: reason.to_string(),
        }
    }

    /// Re-tags a capability failure raised while writing article text.
    pub fn into_generation(self) -> Self {
        match self {
            Error::Generation(_) => self,
            other => Error::Generation(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
