use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

use cg_core::{AnswerProvider, InterviewQuestion, Result};

/// Asks each question on stderr and reads one answer per line. Blank lines
/// ask again; end of input stops early and leaves the rest unanswered.
pub struct PromptAnswers<R> {
    input: Mutex<R>,
}

impl PromptAnswers<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> PromptAnswers<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> AnswerProvider for PromptAnswers<R> {
    async fn answers(&self, questions: &[InterviewQuestion]) -> Result<Vec<String>> {
        let mut input = self.input.lock().await;
        let mut answers = Vec::with_capacity(questions.len());

        'questions: for (i, question) in questions.iter().enumerate() {
            eprintln!("\n❓ [{}/{}] {}", i + 1, questions.len(), question.question);
            loop {
                eprint!("> ");
                let mut line = String::new();
                if input.read_line(&mut line).await? == 0 {
                    break 'questions;
                }
                let answer = line.trim();
                if !answer.is_empty() {
                    answers.push(answer.to_string());
                    break;
                }
            }
        }
        Ok(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<InterviewQuestion> {
        vec![
            InterviewQuestion::new("Why do memes spread?"),
            InterviewQuestion::new("Who coined the term?"),
        ]
    }

    #[tokio::test]
    async fn test_reads_one_answer_per_question() {
        let provider = PromptAnswers::new(&b"Memorability\n\n  \nDawkins\nextra\n"[..]);
        let answers = provider.answers(&questions()).await.unwrap();
        assert_eq!(answers, vec!["Memorability", "Dawkins"]);
    }

    #[tokio::test]
    async fn test_end_of_input_stops_early() {
        let provider = PromptAnswers::new(&b"Memorability\n"[..]);
        let answers = provider.answers(&questions()).await.unwrap();
        assert_eq!(answers, vec!["Memorability"]);
    }
}
