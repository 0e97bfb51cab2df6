use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use cg_core::config::CollectionConfig;
use cg_core::{DocumentCollector, Error, Result, SourceDocument};

use crate::web::UrlCollector;

#[derive(Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    link: String,
}

/// Links of the first `count` organic results.
fn top_links(response: SerpResponse, count: usize) -> Vec<String> {
    response
        .organic_results
        .into_iter()
        .map(|r| r.link)
        .take(count)
        .collect()
}

/// Searches the web for the topic and fetches the top organic results.
pub struct SerpCollector {
    client: Client,
    api_key: String,
    endpoint: String,
    location: String,
    result_count: usize,
}

impl fmt::Debug for SerpCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerpCollector")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("location", &self.location)
            .field("result_count", &self.result_count)
            .finish()
    }
}

impl SerpCollector {
    pub fn new(client: Client, config: &CollectionConfig) -> Result<Self> {
        let api_key = config
            .serp_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("A SerpAPI key is required for web search".to_string()))?;
        Ok(Self {
            client,
            api_key,
            endpoint: config.serp_endpoint.clone(),
            location: config.serp_location.clone(),
            result_count: config.result_count,
        })
    }

    pub async fn search(&self, topic: &str) -> Result<Vec<String>> {
        info!("🔍 Searching the web for {}", topic);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", topic),
                ("location", self.location.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<SerpResponse>()
            .await?;

        Ok(top_links(response, self.result_count))
    }
}

#[async_trait]
impl DocumentCollector for SerpCollector {
    fn name(&self) -> &str {
        "serp"
    }

    async fn collect(&self, topic: &str) -> Result<Vec<SourceDocument>> {
        let links = self.search(topic).await?;
        if links.iter().all(|l| l.trim().is_empty()) {
            return Err(Error::Collection(format!("No search results for {}", topic)));
        }
        UrlCollector::new(self.client.clone(), links).collect(topic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn collector(server: &MockServer) -> SerpCollector {
        let config = CollectionConfig {
            serp_api_key: Some("serp-secret".to_string()),
            serp_endpoint: format!("{}/search.json", server.uri()),
            result_count: 2,
            ..CollectionConfig::default()
        };
        SerpCollector::new(Client::new(), &config).unwrap()
    }

    async fn mount_search(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "Memetics"))
            .and(query_param("location", "Austin,Texas"))
            .and(query_param("api_key", "serp-secret"))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_top_links() {
        let response: SerpResponse = serde_json::from_str(
            r#"{"organic_results": [
                {"position": 1, "link": "https://a.example"},
                {"position": 2, "link": "https://b.example"},
                {"position": 3},
                {"position": 4, "link": "https://d.example"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(top_links(response, 3), vec!["https://a.example", "https://b.example", ""]);

        let empty: SerpResponse = serde_json::from_str(r#"{"search_metadata": {}}"#).unwrap();
        assert!(top_links(empty, 3).is_empty());
    }

    #[test]
    fn test_requires_api_key() {
        let err = SerpCollector::new(Client::new(), &CollectionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = CollectionConfig {
            serp_api_key: Some("serp-secret".to_string()),
            ..CollectionConfig::default()
        };
        let collector = SerpCollector::new(Client::new(), &config).unwrap();
        assert!(!format!("{:?}", collector).contains("serp-secret"));
    }

    #[tokio::test]
    async fn test_search_fetches_top_results() {
        let server = MockServer::start().await;
        let page = format!("{}/memetics", server.uri());
        mount_search(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "organic_results": [
                    { "link": page },
                    { "link": format!("{}/gone", server.uri()) },
                    { "link": "https://ignored.example" },
                ]
            })),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/memetics"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><head><title>Memetics</title></head><body><p>Memes are units of culture.</p></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let collector = collector(&server);
        let documents = collector.collect("Memetics").await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, "Memes are units of culture.");
        assert_eq!(documents[0].source(), Some(page.as_str()));
    }

    #[tokio::test]
    async fn test_empty_search_is_collection_error() {
        let server = MockServer::start().await;
        mount_search(&server, ResponseTemplate::new(200).set_body_json(json!({ "organic_results": [] }))).await;

        let err = collector(&server).collect("Memetics").await.unwrap_err();
        assert!(matches!(err, Error::Collection(_)));
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let server = MockServer::start().await;
        mount_search(&server, ResponseTemplate::new(401)).await;

        let err = collector(&server).search("Memetics").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
