use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use cg_core::{AnswerProvider, Error, InterviewQuestion, Result};

/// Answers fixed up front, handed out in question order.
#[derive(Debug, Clone, Default)]
pub struct StaticAnswers(pub Vec<String>);

impl StaticAnswers {
    pub fn new<S: Into<String>>(answers: impl IntoIterator<Item = S>) -> Self {
        Self(answers.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl AnswerProvider for StaticAnswers {
    async fn answers(&self, _questions: &[InterviewQuestion]) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Answers read from a JSON file, either a list in question order or an
/// object keyed by question text.
#[derive(Debug, Clone)]
pub struct FileAnswers {
    path: PathBuf,
}

impl FileAnswers {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn answers_from_json(value: Value, questions: &[InterviewQuestion]) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(Error::Config(format!("Answer must be a string, got {}", other))),
            })
            .collect(),
        Value::Object(map) => {
            let answers: Vec<String> = questions
                .iter()
                .filter_map(|q| map.get(q.question.trim()).and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            if answers.len() != questions.len() {
                return Err(Error::IncompleteAnswers {
                    expected: questions.len(),
                    got: answers.len(),
                });
            }
            Ok(answers)
        }
        _ => Err(Error::Config(
            "Answers file must hold a JSON list or an object keyed by question".to_string(),
        )),
    }
}

#[async_trait]
impl AnswerProvider for FileAnswers {
    async fn answers(&self, questions: &[InterviewQuestion]) -> Result<Vec<String>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        answers_from_json(serde_json::from_str(&raw)?, questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn questions() -> Vec<InterviewQuestion> {
        vec![
            InterviewQuestion::new("Why do memes spread?"),
            InterviewQuestion::new("Who coined the term?"),
        ]
    }

    #[tokio::test]
    async fn test_list_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        std::fs::write(&path, r#"["Memorability", "Dawkins"]"#).unwrap();

        let answers = FileAnswers::new(&path).answers(&questions()).await.unwrap();
        assert_eq!(answers, vec!["Memorability", "Dawkins"]);
    }

    #[test]
    fn test_object_keyed_by_question() {
        let value = json!({
            "Who coined the term?": "Dawkins",
            "Why do memes spread?": "Memorability",
        });
        assert_eq!(
            answers_from_json(value, &questions()).unwrap(),
            vec!["Memorability", "Dawkins"]
        );

        let partial = json!({ "Who coined the term?": "Dawkins" });
        assert!(matches!(
            answers_from_json(partial, &questions()),
            Err(Error::IncompleteAnswers { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(matches!(answers_from_json(json!("yes"), &questions()), Err(Error::Config(_))));
        assert!(matches!(answers_from_json(json!([1, 2]), &questions()), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_static_answers() {
        let answers = StaticAnswers::new(["a", "b"]).answers(&questions()).await.unwrap();
        assert_eq!(answers, vec!["a", "b"]);
    }
}
