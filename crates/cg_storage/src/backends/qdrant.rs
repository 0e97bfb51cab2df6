use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        vectors_config::Config, CreateCollection, DeleteCollection, Distance, PointStruct,
        SearchPoints, UpsertPoints, Value, VectorParams, Vectors, VectorsConfig, WithPayloadSelector,
    },
    Qdrant,
};
use uuid::Uuid;

use cg_core::{Chunk, Embedder, Error, Result, RetrievalIndex};

fn external(e: qdrant_client::QdrantError) -> Error {
    Error::External(e.into())
}

/// Retrieval index stored in a per-run Qdrant collection.
pub struct QdrantIndex {
    client: Arc<Qdrant>,
    embedder: Arc<dyn Embedder>,
    collection_name: String,
    len: usize,
}

impl QdrantIndex {
    pub async fn build(url: &str, embedder: Arc<dyn Embedder>, chunks: Vec<Chunk>) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(external)?;
        let client = Arc::new(client);
        let collection_name = format!("chunks-{}", Uuid::new_v4());

        let mut points = Vec::with_capacity(chunks.len());
        let mut vector_size = None;
        for chunk in &chunks {
            let embedding = embedder.embed(&chunk.text).await?;
            vector_size.get_or_insert(embedding.len() as u64);

            let mut payload: HashMap<String, Value> = HashMap::new();
            payload.insert("chunk".to_string(), serde_json::to_string(chunk)?.into());
            points.push(PointStruct {
                id: Some(Uuid::new_v4().to_string().into()),
                vectors: Some(Vectors::from(embedding)),
                payload,
            });
        }

        let vector_config = VectorsConfig {
            config: Some(Config::Params(VectorParams {
                size: vector_size.unwrap_or(1),
                distance: Distance::Cosine.into(),
                ..Default::default()
            })),
        };
        client
            .create_collection(CreateCollection {
                collection_name: collection_name.clone(),
                vectors_config: Some(vector_config),
                ..Default::default()
            })
            .await
            .map_err(external)?;

        if !points.is_empty() {
            client
                .upsert_points(UpsertPoints {
                    collection_name: collection_name.clone(),
                    points,
                    wait: Some(true),
                    ..Default::default()
                })
                .await
                .map_err(external)?;
        }

        tracing::info!("🗄️ Stored {} chunks in Qdrant collection {}", chunks.len(), collection_name);
        Ok(Self {
            client,
            embedder,
            collection_name,
            len: chunks.len(),
        })
    }
}

#[async_trait]
impl RetrievalIndex for QdrantIndex {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Chunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let vector = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| Error::Retrieval(format!("Failed to embed query: {}", e)))?;

        let search_request = SearchPoints {
            collection_name: self.collection_name.clone(),
            vector,
            limit: k as u64,
            with_payload: Some(WithPayloadSelector::from(true)),
            ..Default::default()
        };
        let results = self
            .client
            .search_points(search_request)
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;

        let mut chunks = Vec::new();
        for point in results.result {
            if let Some(raw) = point.payload.get("chunk").and_then(|v| v.as_str()) {
                chunks.push(serde_json::from_str::<Chunk>(raw)?);
            }
        }
        Ok(chunks)
    }

    fn len(&self) -> usize {
        self.len
    }

    /// Deletes the run's collection.
    async fn close(&self) -> Result<()> {
        self.client
            .delete_collection(DeleteCollection {
                collection_name: self.collection_name.clone(),
                ..Default::default()
            })
            .await
            .map_err(external)?;
        tracing::info!("🧹 Dropped Qdrant collection {}", self.collection_name);
        Ok(())
    }
}
