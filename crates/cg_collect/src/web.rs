use std::collections::HashSet;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use cg_core::{DocumentCollector, Error, Result, SourceDocument};

use crate::html::html_to_text;

/// Drops empty entries and duplicates, keeping first-seen order.
pub fn clean_urls(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .filter(|u| seen.insert(u.to_string()))
        .map(str::to_string)
        .collect()
}

/// Fetches a fixed list of pages and keeps their readable text.
#[derive(Debug, Clone)]
pub struct UrlCollector {
    client: Client,
    urls: Vec<String>,
}

impl UrlCollector {
    pub fn new(client: Client, urls: Vec<String>) -> Self {
        Self { client, urls }
    }

    async fn fetch(&self, url: &str) -> Result<SourceDocument> {
        let parsed = Url::parse(url).map_err(|e| Error::Collection(format!("Invalid URL {}: {}", url, e)))?;
        let response = self.client.get(parsed).send().await?.error_for_status()?;
        let html = response.text().await?;
        let (title, text) = html_to_text(&html);

        let mut document = SourceDocument::new(text).with_metadata("source", url);
        if let Some(title) = title {
            document = document.with_metadata("title", title);
        }
        Ok(document)
    }

    /// Fetches every URL concurrently; failed pages are skipped.
    pub async fn fetch_all(&self, urls: &[String]) -> Result<Vec<SourceDocument>> {
        let urls = clean_urls(urls);
        if urls.is_empty() {
            return Err(Error::Collection("No URLs found".to_string()));
        }

        info!("🌐 Fetching {} pages", urls.len());
        let results = join_all(urls.iter().map(|url| self.fetch(url))).await;

        let mut documents = Vec::with_capacity(results.len());
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(document) if document.content.trim().is_empty() => {
                    warn!("⚠️ {} has no readable text", url)
                }
                Ok(document) => documents.push(document),
                Err(e) => warn!("⚠️ Failed to fetch {}: {}", url, e),
            }
        }

        if documents.is_empty() {
            return Err(Error::Collection(format!(
                "None of the {} pages could be fetched",
                urls.len()
            )));
        }
        info!("✨ Collected {} documents", documents.len());
        Ok(documents)
    }
}

#[async_trait]
impl DocumentCollector for UrlCollector {
    fn name(&self) -> &str {
        "urls"
    }

    async fn collect(&self, _topic: &str) -> Result<Vec<SourceDocument>> {
        self.fetch_all(&self.urls).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Serves `/good` with an HTML page and anything else with a 404.
    async fn serve() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/good"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><head><title>Good</title></head><body><p>Memes spread.</p></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_clean_urls() {
        let urls = vec![
            "https://a.example".to_string(),
            "".to_string(),
            " https://b.example ".to_string(),
            "https://a.example".to_string(),
        ];
        assert_eq!(clean_urls(&urls), vec!["https://a.example", "https://b.example"]);
    }

    #[tokio::test]
    async fn test_no_urls_is_collection_error() {
        let collector = UrlCollector::new(Client::new(), vec!["".to_string(), "  ".to_string()]);
        let err = collector.collect("Memetics").await.unwrap_err();
        assert!(matches!(err, Error::Collection(_)));
    }

    #[tokio::test]
    async fn test_failed_pages_are_skipped() {
        let server = serve().await;
        let base = server.uri();
        let collector = UrlCollector::new(
            Client::new(),
            vec![format!("{}/good", base), format!("{}/missing", base)],
        );
        let documents = collector.collect("Memetics").await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, "Memes spread.");
        assert_eq!(documents[0].metadata["title"], "Good");
        assert_eq!(documents[0].source(), Some(format!("{}/good", base).as_str()));
    }
}
