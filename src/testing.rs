//! Deterministic stand-ins for hosted providers and document sources.

use crate::completion::{Completer, CompletionRequest};
use crate::embedding::Embedder;
use crate::error::{ConsultaError, ProviderError, Result};
use crate::ingest::{Passage, PassageSource};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Passages from a single `plan.pdf`, one per text.
pub fn passages(texts: &[&str]) -> Vec<Passage> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| Passage::new("plan.pdf", i as u32 + 1, i, *text))
        .collect()
}

/// Bag-of-words hashing embedder: same text, same vector.
#[derive(Default)]
pub struct StubEmbedder {
    batch_calls: AtomicUsize,
    single_calls: AtomicUsize,
    model: Option<String>,
}

impl StubEmbedder {
    pub const DIMENSIONS: usize = 32;

    pub fn new() -> Self {
        Self::default()
    }

    /// A stub reporting a different embedding space.
    pub fn with_model(model: &str) -> Self {
        Self {
            model: Some(model.to_string()),
            ..Self::default()
        }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; Self::DIMENSIONS];
        for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            // FNV-1a
            let hash = word
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            vector[(hash % Self::DIMENSIONS as u64) as usize] += 1.0;
        }
        vector
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model_id(&self) -> String {
        self.model.clone().unwrap_or_else(|| "stub/bag-of-words".to_string())
    }
}

/// Fails the first `failures` calls, then behaves like [`StubEmbedder`].
pub struct FailingEmbedder {
    failures: usize,
    calls: AtomicUsize,
    error: ProviderError,
}

impl FailingEmbedder {
    pub fn transient(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
            error: ProviderError::Transport("connection reset".to_string()),
        }
    }

    pub fn permanent() -> Self {
        Self {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
            error: ProviderError::Status {
                status: 401,
                message: "invalid key".to_string(),
            },
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn attempt(&self) -> std::result::Result<(), ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(self.error.clone())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        self.attempt()?;
        Ok(StubEmbedder::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
        self.attempt()?;
        Ok(texts.iter().map(|t| StubEmbedder::vector(t)).collect())
    }

    fn model_id(&self) -> String {
        "stub/bag-of-words".to_string()
    }
}

/// Returns a fixed answer and records every request it receives.
pub struct StubCompleter {
    answer: String,
    failures: usize,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubCompleter {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            failures: 0,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail the first `failures` calls with a 503.
    pub fn failing(answer: &str, failures: usize) -> Self {
        Self {
            failures,
            ..Self::new(answer)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completer for StubCompleter {
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if n < self.failures {
            return Err(ProviderError::Status {
                status: 503,
                message: "overloaded".to_string(),
            });
        }
        Ok(self.answer.clone())
    }

    fn model_id(&self) -> String {
        "stub/completer".to_string()
    }
}

/// In-memory passage source that counts loads.
pub struct StubSource {
    passages: Vec<Passage>,
    delay: Duration,
    failures: usize,
    loads: AtomicUsize,
}

impl StubSource {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self {
            passages,
            delay: Duration::ZERO,
            failures: 0,
            loads: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every load.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the first `failures` loads with a document error.
    pub fn failing(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PassageSource for StubSource {
    async fn load(&self) -> Result<Vec<Passage>> {
        let n = self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if n < self.failures {
            return Err(ConsultaError::DocumentLoad {
                path: "data/pt_adn.pdf".into(),
                message: "corrupt".to_string(),
            });
        }
        Ok(self.passages.clone())
    }
}
