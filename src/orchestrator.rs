//! Question-answering orchestrator for Consulta.
//!
//! Owns the process-wide index and coordinates ingestion, index building,
//! retrieval and answer synthesis for every incoming question.

use crate::completion::{create_completer, Completer};
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{ConsultaError, Result};
use crate::index::{Index, IndexBuilder, IndexCell, IndexStatus};
use crate::ingest::{PassageSource, PdfIngestor};
use crate::rag::{Answer, RetrievedContext, Retriever, Synthesizer};
use crate::retry::RetryPolicy;
use futures::FutureExt;
use std::sync::Arc;
use tracing::{info, instrument};

/// Tunables for an [`Orchestrator`] built from explicit components.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub top_k: usize,
    pub min_score: Option<f32>,
    pub temperature: f32,
    pub batch_size: usize,
    pub retry: RetryPolicy,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: None,
            temperature: 0.2,
            batch_size: 64,
            retry: RetryPolicy::default(),
        }
    }
}

impl OrchestratorOptions {
    /// Options taken from configuration.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            top_k: settings.retrieval.top_k,
            min_score: settings.retrieval.min_score,
            temperature: settings.completion.temperature,
            batch_size: settings.embedding.batch_size,
            retry: RetryPolicy::from_settings(&settings.retry),
        }
    }
}

/// The main orchestrator for Consulta.
pub struct Orchestrator {
    source: Arc<dyn PassageSource>,
    builder: IndexBuilder,
    retriever: Retriever,
    synthesizer: Synthesizer,
    index: IndexCell,
    top_k: usize,
}

impl Orchestrator {
    /// Create a new orchestrator with the configured providers and documents.
    pub fn new(settings: &Settings) -> Result<Self> {
        settings.validate()?;

        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder = create_embedder(&settings.embedding, &settings.retry)?;
        let completer = create_completer(&settings.completion, &settings.retry)?;
        info!(
            "Using {} for embeddings and {} for answers",
            embedder.model_id(),
            completer.model_id()
        );

        let source = Arc::new(PdfIngestor::new(settings.document_paths()));

        Ok(Self::with_components(
            source,
            embedder,
            completer,
            prompts,
            OrchestratorOptions::from_settings(settings),
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        source: Arc<dyn PassageSource>,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
        prompts: Prompts,
        options: OrchestratorOptions,
    ) -> Self {
        let builder = IndexBuilder::new(embedder.clone(), options.retry.clone())
            .with_batch_size(options.batch_size);
        let retriever = Retriever::new(embedder, options.retry.clone()).with_min_score(options.min_score);
        let synthesizer = Synthesizer::new(completer, options.retry)
            .with_prompts(prompts)
            .with_temperature(options.temperature);

        Self {
            source,
            builder,
            retriever,
            synthesizer,
            index: IndexCell::new(),
            top_k: options.top_k,
        }
    }

    /// Current index lifecycle state.
    pub fn status(&self) -> IndexStatus {
        self.index.status()
    }

    /// Number of index builds started so far.
    pub fn builds_started(&self) -> u64 {
        self.index.builds_started()
    }

    /// Return the index, building it on first use.
    ///
    /// Concurrent callers share a single build.
    pub async fn ensure_index(&self) -> Result<Arc<Index>> {
        let source = self.source.clone();
        let builder = self.builder.clone();

        self.index
            .get_or_build(move || {
                async move {
                    let passages = source.load().await?;
                    builder.build(passages).await
                }
                .boxed()
            })
            .await
    }

    /// Build the index ahead of the first question.
    pub async fn warm_up(&self) -> Result<()> {
        let index = self.ensure_index().await?;
        info!("Index warmed up with {} passages", index.len());
        Ok(())
    }

    /// Retrieve the `k` passages most relevant to `question`.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<RetrievedContext> {
        let question = validate_question(question)?;
        let index = self.ensure_index().await?;
        self.retriever.retrieve(&index, question, k).await
    }

    /// Answer a question from the indexed documents.
    #[instrument(skip(self, question))]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = validate_question(question)?;
        let index = self.ensure_index().await?;

        let context = self.retriever.retrieve(&index, question, self.top_k).await?;
        info!("Answering from {} passages", context.len());

        let text = self.synthesizer.synthesize(question, &context).await?;

        Ok(Answer {
            text,
            sources: context.passages,
        })
    }
}

fn validate_question(question: &str) -> Result<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ConsultaError::Validation("Question is required".to_string()));
    }
    Ok(question)
}
