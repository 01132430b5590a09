//! Index construction.

use super::{Index, IndexedPassage};
use crate::embedding::Embedder;
use crate::error::{ConsultaError, ProviderError, Result};
use crate::ingest::Passage;
use crate::retry::RetryPolicy;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Embeds passages and assembles an [`Index`].
#[derive(Clone)]
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    retry: RetryPolicy,
    batch_size: usize,
}

impl IndexBuilder {
    /// Create a new index builder.
    pub fn new(embedder: Arc<dyn Embedder>, retry: RetryPolicy) -> Self {
        Self {
            embedder,
            retry,
            batch_size: 64,
        }
    }

    /// Set how many passages go into one embedding request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embed every passage and build the index.
    ///
    /// Fails as a whole if any batch exhausts its retries; no partial index
    /// is ever returned.
    #[instrument(skip(self, passages), fields(passages = passages.len()))]
    pub async fn build(&self, passages: Vec<Passage>) -> Result<Index> {
        let model = self.embedder.model_id();
        if passages.is_empty() {
            info!("No passages to index");
            return Ok(Index::empty(model));
        }

        let mut entries = Vec::with_capacity(passages.len());

        for (i, batch) in passages.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|p| p.content.clone()).collect();

            let vectors = self
                .retry
                .run("embed_batch", || self.embedder.embed_batch(&texts))
                .await
                .map_err(ConsultaError::EmbeddingProvider)?;

            if vectors.len() != batch.len() {
                return Err(malformed(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            debug!("Embedded batch {} ({} passages)", i + 1, batch.len());

            entries.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(vectors)
                    .map(|(passage, embedding)| IndexedPassage { passage, embedding }),
            );
        }

        let index = Index::new(entries, model)
            .ok_or_else(|| malformed("embeddings have inconsistent dimensions"))?;
        if index.dimensions() == 0 {
            return Err(malformed("embeddings are empty"));
        }

        info!(
            "Built index with {} passages ({} dimensions, {})",
            index.len(),
            index.dimensions(),
            index.embedding_model()
        );
        Ok(index)
    }
}

fn malformed(message: impl Into<String>) -> ConsultaError {
    ConsultaError::EmbeddingProvider(ProviderError::Malformed(message.into()))
}
