use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Deserializer, Value};

use cg_core::{
    DocumentSummary, Error, InterviewQuestions, Outline, OutputSchema, Result, QUESTION_BATCH_SIZE,
};

/// A data shape a structured-generation call is asked to produce.
pub trait StructuredOutput: DeserializeOwned + JsonSchema + Sized {
    const SCHEMA_NAME: &'static str;

    /// Checks what the JSON shape alone does not guarantee.
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    fn output_schema() -> OutputSchema {
        let schema = serde_json::to_value(schema_for!(Self)).unwrap_or_default();
        OutputSchema {
            name: Self::SCHEMA_NAME,
            schema,
        }
    }

    fn format_instructions() -> String {
        let schema = Self::output_schema().schema;
        let rendered = serde_json::to_string(&schema).unwrap_or_default();
        format!(
            "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\
             Return only the JSON object, with no surrounding prose.\n\
             Here is the output schema:\n```\n{}\n```",
            rendered
        )
    }
}

impl StructuredOutput for DocumentSummary {
    const SCHEMA_NAME: &'static str = "DocumentSummary";

    fn validate(&self) -> std::result::Result<(), String> {
        if self.concise_summary.trim().is_empty() {
            return Err("concise_summary is empty".to_string());
        }
        Ok(())
    }
}

impl StructuredOutput for InterviewQuestions {
    const SCHEMA_NAME: &'static str = "InterviewQuestions";

    fn validate(&self) -> std::result::Result<(), String> {
        if self.questions.len() != QUESTION_BATCH_SIZE {
            return Err(format!(
                "expected exactly {} questions, got {}",
                QUESTION_BATCH_SIZE,
                self.questions.len()
            ));
        }
        if self.questions.iter().any(|q| q.question.trim().is_empty()) {
            return Err("questions must not be empty".to_string());
        }
        Ok(())
    }
}

impl StructuredOutput for Outline {
    const SCHEMA_NAME: &'static str = "Outline";

    fn validate(&self) -> std::result::Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is empty".to_string());
        }
        if self.sections.is_empty() {
            return Err("outline has no sections".to_string());
        }
        if self.sections.iter().any(|s| s.title.trim().is_empty()) {
            return Err("section titles must not be empty".to_string());
        }
        Ok(())
    }
}

/// Parses model output into `T`, tolerating code fences and surrounding prose.
///
/// Every `{` in the output is tried as the start of a JSON object; the first
/// object that deserializes into `T` is validated and returned.
pub fn parse_structured<T: StructuredOutput>(raw: &str) -> Result<T> {
    let mut first_error = None;
    for object in json_objects(raw) {
        match serde_json::from_value::<T>(object) {
            Ok(value) => {
                value
                    .validate()
                    .map_err(|reason| Error::schema_parse(T::SCHEMA_NAME, reason))?;
                return Ok(value);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    Err(match first_error {
        Some(e) => Error::schema_parse(T::SCHEMA_NAME, e),
        None => Error::schema_parse(T::SCHEMA_NAME, "no JSON object found in output"),
    })
}

fn json_objects(raw: &str) -> impl Iterator<Item = Value> + '_ {
    raw.match_indices('{').filter_map(move |(start, _)| {
        match Deserializer::from_str(&raw[start..]).into_iter::<Value>().next() {
            Some(Ok(object @ Value::Object(_))) => Some(object),
            _ => None,
        }
    })
}
