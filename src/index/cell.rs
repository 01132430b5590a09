//! Process-wide index lifecycle: `Uninitialized -> Building -> Ready`.
//!
//! The first caller starts a build; callers arriving while it runs await the
//! same shared future, so at most one build is ever in flight. A failed build
//! returns the cell to `Uninitialized` so a later call can try again.

use super::Index;
use crate::error::{ConsultaError, Result};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info};

type BuildOutcome = std::result::Result<Arc<Index>, Arc<ConsultaError>>;
type SharedBuild = Shared<BoxFuture<'static, BuildOutcome>>;

enum State {
    Uninitialized,
    Building { generation: u64, build: SharedBuild },
    Ready(Arc<Index>),
}

/// Build status as reported by `/health`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IndexStatus {
    Uninitialized,
    Building,
    Ready {
        passages: usize,
        dimensions: usize,
        embedding_model: String,
        built_at: DateTime<Utc>,
    },
}

/// Holds the index and guarantees a single in-flight build.
pub struct IndexCell {
    state: Mutex<State>,
    builds_started: AtomicU64,
}

impl Default for IndexCell {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexCell {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Uninitialized),
            builds_started: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle state.
    pub fn status(&self) -> IndexStatus {
        match &*self.lock() {
            State::Uninitialized => IndexStatus::Uninitialized,
            State::Building { .. } => IndexStatus::Building,
            State::Ready(index) => IndexStatus::Ready {
                passages: index.len(),
                dimensions: index.dimensions(),
                embedding_model: index.embedding_model().to_string(),
                built_at: index.built_at(),
            },
        }
    }

    /// Number of builds started over the cell's lifetime.
    pub fn builds_started(&self) -> u64 {
        self.builds_started.load(Ordering::SeqCst)
    }

    /// Return the ready index, joining or starting a build as needed.
    ///
    /// `build` is only invoked when no build is ready or in flight.
    pub async fn get_or_build<F>(&self, build: F) -> Result<Arc<Index>>
    where
        F: FnOnce() -> BoxFuture<'static, Result<Index>>,
    {
        let (generation, shared) = {
            let mut state = self.lock();
            match &*state {
                State::Ready(index) => return Ok(index.clone()),
                State::Building { generation, build: pending } => (*generation, pending.clone()),
                State::Uninitialized => {
                    let generation = self.builds_started.fetch_add(1, Ordering::SeqCst) + 1;
                    info!(generation, "Index build started");
                    let shared = build()
                        .map(|outcome| outcome.map(Arc::new).map_err(Arc::new))
                        .boxed()
                        .shared();
                    *state = State::Building {
                        generation,
                        build: shared.clone(),
                    };
                    (generation, shared)
                }
            }
        };

        let outcome = shared.await;

        {
            let mut state = self.lock();
            let current = matches!(&*state, State::Building { generation: g, .. } if *g == generation);
            if current {
                *state = match &outcome {
                    Ok(index) => {
                        info!(generation, passages = index.len(), "Index ready");
                        State::Ready(index.clone())
                    }
                    Err(e) => {
                        error!(generation, "Index build failed: {}", e);
                        State::Uninitialized
                    }
                };
            }
        }

        outcome.map_err(ConsultaError::IndexBuild)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexedPassage;
    use crate::ingest::Passage;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn ready_build() -> BoxFuture<'static, Result<Index>> {
        async { Ok(small_index()) }.boxed()
    }

    fn failing_build() -> BoxFuture<'static, Result<Index>> {
        async {
            Err(ConsultaError::DocumentLoad {
                path: "data/pt_adn.pdf".into(),
                message: "corrupt".to_string(),
            })
        }
        .boxed()
    }

    fn small_index() -> Index {
        Index::new(
            vec![IndexedPassage {
                passage: Passage::new("plan.pdf", 1, 0, "texto"),
                embedding: vec![1.0, 0.0],
            }],
            "stub",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_build() {
        let cell = Arc::new(IndexCell::new());
        let invocations = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cell = cell.clone();
                let invocations = invocations.clone();
                tokio::spawn(async move {
                    cell.get_or_build(move || {
                        invocations.fetch_add(1, Ordering::SeqCst);
                        async move {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            ready_build().await
                        }
                        .boxed()
                    })
                    .await
                })
            })
            .collect();

        let indexes: Vec<Arc<Index>> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert_eq!(cell.builds_started(), 1);
        assert!(indexes.iter().all(|i| Arc::ptr_eq(i, &indexes[0])));
        assert!(matches!(cell.status(), IndexStatus::Ready { passages: 1, .. }));
    }

    #[tokio::test]
    async fn test_failed_build_can_be_retried() {
        let cell = IndexCell::new();

        let err = cell.get_or_build(failing_build).await.unwrap_err();
        assert!(matches!(err, ConsultaError::IndexBuild(_)));
        assert_eq!(cell.status(), IndexStatus::Uninitialized);

        let index = cell.get_or_build(ready_build).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(cell.builds_started(), 2);
    }

    #[tokio::test]
    async fn test_all_waiters_see_failed_build() {
        let cell = Arc::new(IndexCell::new());
        let invocations = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cell = cell.clone();
                let invocations = invocations.clone();
                tokio::spawn(async move {
                    cell.get_or_build(move || {
                        invocations.fetch_add(1, Ordering::SeqCst);
                        async move {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            failing_build().await
                        }
                        .boxed()
                    })
                    .await
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            let err = result.unwrap().unwrap_err();
            assert!(matches!(err, ConsultaError::IndexBuild(_)));
        }

        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert_eq!(cell.builds_started(), 1);
        assert_eq!(cell.status(), IndexStatus::Uninitialized);
    }

    #[tokio::test]
    async fn test_ready_index_is_never_rebuilt() {
        let cell = IndexCell::new();
        cell.get_or_build(ready_build).await.unwrap();

        let again = cell.get_or_build(failing_build).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(cell.builds_started(), 1);
    }

    #[tokio::test]
    async fn test_status_while_building() {
        let cell = Arc::new(IndexCell::new());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let waiter = {
            let cell = cell.clone();
            tokio::spawn(async move {
                cell.get_or_build(move || {
                    async move {
                        let _ = rx.await;
                        ready_build().await
                    }
                    .boxed()
                })
                .await
            })
        };

        // Wait for the build to register
        while cell.status() == IndexStatus::Uninitialized {
            tokio::task::yield_now().await;
        }
        assert_eq!(cell.status(), IndexStatus::Building);

        tx.send(()).unwrap();
        waiter.await.unwrap().unwrap();
        assert!(matches!(cell.status(), IndexStatus::Ready { .. }));
    }
}
