use std::sync::Arc;

use cg_core::config::{ModelConfig, Provider};
use cg_core::{Embedder, Result, TextGenerator};

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::OpenAiModel;

/// The two capabilities the pipeline needs from a backend.
#[derive(Debug, Clone)]
pub struct Models {
    pub generator: Arc<dyn TextGenerator>,
    pub embedder: Arc<dyn Embedder>,
}

pub fn create_models(config: &ModelConfig) -> Result<Models> {
    match config.provider {
        Provider::OpenAi => {
            let model = Arc::new(OpenAiModel::new(config)?);
            tracing::info!("🧠 Using OpenAI-compatible backend at {}", config.base_url);
            Ok(Models {
                generator: model.clone(),
                embedder: model,
            })
        }
        Provider::Dummy => {
            let model = Arc::new(DummyModel::new());
            tracing::info!("🧠 Using offline dummy backend");
            Ok(Models {
                generator: model.clone(),
                embedder: model,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_models_by_provider() {
        let config = ModelConfig {
            provider: Provider::Dummy,
            ..ModelConfig::default()
        };
        let models = create_models(&config).unwrap();
        assert_eq!(models.generator.name(), "Dummy");

        assert!(create_models(&ModelConfig::default()).is_err());
    }
}
