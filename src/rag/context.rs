//! Retrieval of ranked context passages for a question.

use crate::embedding::Embedder;
use crate::error::{ConsultaError, Result};
use crate::index::{Index, ScoredPassage};
use crate::retry::RetryPolicy;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Passages judged most similar to a question, best first.
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    pub passages: Vec<ScoredPassage>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }
}

/// Embeds questions and looks them up in an [`Index`].
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    retry: RetryPolicy,
    min_score: Option<f32>,
}

impl Retriever {
    /// Create a new retriever. `embedder` must be the one the index was built with.
    pub fn new(embedder: Arc<dyn Embedder>, retry: RetryPolicy) -> Self {
        Self {
            embedder,
            retry,
            min_score: None,
        }
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Top `k` passages for `question`.
    ///
    /// An empty index yields an empty context without calling the provider.
    #[instrument(skip(self, index, question), fields(k, passages = index.len()))]
    pub async fn retrieve(&self, index: &Index, question: &str, k: usize) -> Result<RetrievedContext> {
        if index.is_empty() || k == 0 {
            return Ok(RetrievedContext::default());
        }

        let query_model = self.embedder.model_id();
        if query_model != index.embedding_model() {
            return Err(ConsultaError::EmbeddingSpaceMismatch {
                index: index.embedding_model().to_string(),
                query: query_model,
            });
        }

        // Generate query embedding
        let query_embedding = self
            .retry
            .run("embed_query", || self.embedder.embed(question))
            .await
            .map_err(ConsultaError::EmbeddingProvider)?;

        if query_embedding.len() != index.dimensions() {
            return Err(ConsultaError::EmbeddingSpaceMismatch {
                index: format!("{} ({} dimensions)", index.embedding_model(), index.dimensions()),
                query: format!("{} ({} dimensions)", query_model, query_embedding.len()),
            });
        }

        let passages = index.search(&query_embedding, k, self.min_score);
        debug!("Retrieved {} passages", passages.len());

        Ok(RetrievedContext { passages })
    }
}

/// Format context passages for inclusion in a prompt, in ranked order.
pub fn format_context_for_prompt(context: &RetrievedContext) -> String {
    context
        .passages
        .iter()
        .enumerate()
        .map(|(i, scored)| format!("[{}] {}\n{}", i + 1, scored.passage.location(), scored.passage.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use crate::testing::{passages, FailingEmbedder, StubEmbedder};
    use std::time::Duration;

    fn retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            request_timeout: Duration::from_secs(1),
        }
    }

    async fn build(embedder: Arc<StubEmbedder>, texts: &[&str]) -> Index {
        IndexBuilder::new(embedder, retry()).build(passages(texts)).await.unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_ranks_by_similarity() {
        let embedder = Arc::new(StubEmbedder::new());
        let index = build(
            embedder.clone(),
            &[
                "seguridad ciudadana y policía",
                "educación pública gratuita",
                "salud pública y hospitales",
                "educación técnica y universidades",
            ],
        )
        .await;

        let retriever = Retriever::new(embedder, retry());
        let context = retriever.retrieve(&index, "educación", 2).await.unwrap();

        assert_eq!(context.len(), 2);
        let ordinals: Vec<usize> = context.passages.iter().map(|p| p.passage.ordinal).collect();
        assert_eq!(ordinals, vec![1, 3]);
        assert!(context.passages[0].score >= context.passages[1].score);
    }

    #[tokio::test]
    async fn test_retrieve_never_exceeds_k() {
        let embedder = Arc::new(StubEmbedder::new());
        let index = build(embedder.clone(), &["uno", "dos", "tres", "cuatro", "cinco"]).await;
        let retriever = Retriever::new(embedder, retry());

        for k in 1..=7 {
            let context = retriever.retrieve(&index, "tres cuatro", k).await.unwrap();
            assert!(context.len() <= k);
            assert!(context.passages.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty_context() {
        let embedder = Arc::new(StubEmbedder::new());
        let index = Index::empty(embedder.model_id());
        let retriever = Retriever::new(embedder.clone(), retry());

        let context = retriever.retrieve(&index, "¿qué proponen?", 4).await.unwrap();
        assert!(context.is_empty());
        assert_eq!(embedder.single_calls(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_embedding_space_is_rejected() {
        let index = build(Arc::new(StubEmbedder::new()), &["empleo"]).await;
        let other = Arc::new(StubEmbedder::with_model("other/model"));
        let retriever = Retriever::new(other.clone(), retry());

        let err = retriever.retrieve(&index, "empleo", 4).await.unwrap_err();
        assert!(matches!(err, ConsultaError::EmbeddingSpaceMismatch { .. }));
        assert_eq!(other.single_calls(), 0);
    }

    #[tokio::test]
    async fn test_question_embedding_failure_surfaces() {
        let index = build(Arc::new(StubEmbedder::new()), &["empleo"]).await;
        let failing = Arc::new(FailingEmbedder::permanent());
        let retriever = Retriever::new(failing.clone(), retry());

        let err = retriever.retrieve(&index, "empleo", 4).await.unwrap_err();
        assert!(matches!(err, ConsultaError::EmbeddingProvider(_)));
        assert_eq!(failing.calls(), 1);
    }

    #[tokio::test]
    async fn test_same_text_embeds_identically() {
        let embedder = StubEmbedder::new();
        let a = embedder.embed("plan de gobierno").await.unwrap();
        let b = embedder.embed("plan de gobierno").await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_format_context_keeps_rank_order() {
        let context = RetrievedContext {
            passages: passages(&["segundo", "primero"])
                .into_iter()
                .rev()
                .enumerate()
                .map(|(i, passage)| ScoredPassage {
                    passage,
                    score: 1.0 - i as f32 * 0.1,
                })
                .collect(),
        };

        let formatted = format_context_for_prompt(&context);
        assert!(formatted.starts_with("[1] plan.pdf, page 2\nprimero"));
        assert!(formatted.contains("\n\n---\n\n[2] plan.pdf, page 1\nsegundo"));
    }
}
