use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use cg_core::{DocumentCollector, Error, Result, SourceDocument};

/// Chains several collectors. A failing collector is skipped as long as
/// another one returns documents.
#[derive(Default)]
pub struct Sources {
    collectors: Vec<Arc<dyn DocumentCollector>>,
}

impl Sources {
    pub fn push(&mut self, collector: Arc<dyn DocumentCollector>) {
        self.collectors.push(collector);
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}

#[async_trait]
impl DocumentCollector for Sources {
    fn name(&self) -> &str {
        match self.collectors.as_slice() {
            [only] => only.name(),
            _ => "sources",
        }
    }

    async fn collect(&self, topic: &str) -> Result<Vec<SourceDocument>> {
        let mut documents = Vec::new();
        let mut last_error = None;

        for collector in &self.collectors {
            match collector.collect(topic).await {
                Ok(found) => documents.extend(found),
                Err(e) => {
                    warn!("⚠️ The {} collector failed: {}", collector.name(), e);
                    last_error = Some(e);
                }
            }
        }

        if documents.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| Error::Collection("No document sources were given".to_string())));
        }
        Ok(documents)
    }
}
