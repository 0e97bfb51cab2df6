use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use cg_core::config::ModelConfig;
use cg_core::{ChatMessage, Embedder, Error, GenerationRequest, Result, TextGenerator};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for OpenAI-compatible chat-completion and embedding endpoints
/// (OpenAI, DeepSeek, local gateways).
pub struct OpenAiModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    max_input_tokens: usize,
}

impl OpenAiModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("An API key is required for the openai provider".to_string()))?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            max_input_tokens: config.max_input_tokens,
        })
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<R> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "{} /{} returned {}: {}",
                self.base_url, path, status, text
            )));
        }
        Ok(response.json::<R>().await?)
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

#[async_trait]
impl TextGenerator for OpenAiModel {
    fn name(&self) -> &str {
        &self.chat_model
    }

    fn max_input_tokens(&self) -> usize {
        self.max_input_tokens
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.chat_model,
            messages: &request.messages,
            temperature: request.temperature,
            response_format: request
                .schema
                .as_ref()
                .map(|_| ResponseFormat { kind: "json_object" }),
        };

        let response: ChatResponse = self.post("chat/completions", &body).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Inference(format!("{} returned no completion", self.chat_model)))
    }
}

#[async_trait]
impl Embedder for OpenAiModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            input: text,
            model: &self.embedding_model,
        };

        let response: EmbeddingResponse = self.post("embeddings", &body).await?;
        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Inference(format!("{} returned no embedding", self.embedding_model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_core::OutputSchema;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> ModelConfig {
        ModelConfig {
            base_url,
            api_key: Some("sk-test".to_string()),
            chat_model: "test-chat".to_string(),
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_model_requires_api_key() {
        let result = OpenAiModel::new(&ModelConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));

        let model = OpenAiModel::new(&config("http://localhost/v1/".to_string())).unwrap();
        assert_eq!(model.base_url, "http://localhost/v1");
        assert!(!format!("{:?}", model).contains("sk-test"));
    }

    #[tokio::test]
    async fn test_structured_request_asks_for_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-chat",
                "response_format": { "type": "json_object" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "{\"title\":\"x\"}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        let model = OpenAiModel::new(&config(format!("{}/v1", server.uri()))).unwrap();

        let request = GenerationRequest::new(vec![ChatMessage::system("Outline please")])
            .with_schema(OutputSchema {
                name: "Outline",
                schema: json!({}),
            })
            .with_temperature(0.0);
        let output = model.generate(&request).await.unwrap();
        assert_eq!(output, r#"{"title":"x"}"#);

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = received[0].body_json().unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Outline please");
    }

    #[tokio::test]
    async fn test_error_status_is_inference_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "error": "slow down" })))
            .mount(&server)
            .await;
        let model = OpenAiModel::new(&config(format!("{}/v1", server.uri()))).unwrap();

        let err = model.embed("memes").await.unwrap_err();
        assert!(matches!(err, Error::Inference(ref msg) if msg.contains("429")));
    }
}
