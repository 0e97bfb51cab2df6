use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, warn};

use cg_core::{DocumentCollector, Error, Result, SourceDocument};

use crate::html::html_to_text;

/// Reads source documents from local text, markdown or HTML files.
#[derive(Debug, Clone)]
pub struct FileCollector {
    paths: Vec<PathBuf>,
}

impl FileCollector {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    async fn read(path: &PathBuf) -> Result<SourceDocument> {
        let raw = tokio::fs::read_to_string(path).await?;
        let is_html = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));

        let source = path.display().to_string();
        if is_html {
            let (title, text) = html_to_text(&raw);
            let mut document = SourceDocument::new(text).with_metadata("source", source);
            if let Some(title) = title {
                document = document.with_metadata("title", title);
            }
            Ok(document)
        } else {
            Ok(SourceDocument::new(raw).with_metadata("source", source))
        }
    }
}

#[async_trait]
impl DocumentCollector for FileCollector {
    fn name(&self) -> &str {
        "files"
    }

    async fn collect(&self, _topic: &str) -> Result<Vec<SourceDocument>> {
        let mut documents = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            match Self::read(path).await {
                Ok(document) => documents.push(document),
                Err(e) => warn!("⚠️ Failed to read {}: {}", path.display(), e),
            }
        }
        if documents.is_empty() {
            return Err(Error::Collection("No readable source files".to_string()));
        }
        info!("📂 Loaded {} local documents", documents.len());
        Ok(documents)
    }
}
