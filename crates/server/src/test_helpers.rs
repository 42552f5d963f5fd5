//! Fixtures shared by unit and integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use view_counter::{CounterStore, MemoryStore, StoreError};

use crate::api::server::build_api_router;
use crate::state::AppState;

/// In-memory counter store that records how often each operation ran.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    mgets: AtomicUsize,
    incrs: AtomicUsize,
    pings: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counts<I, K>(counts: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        Self {
            inner: MemoryStore::with_counts(counts),
            ..Self::default()
        }
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn mget_calls(&self) -> usize {
        self.mgets.load(Ordering::SeqCst)
    }

    pub fn incr_calls(&self) -> usize {
        self.incrs.load(Ordering::SeqCst)
    }

    pub fn ping_calls(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CounterStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<i64>>, StoreError> {
        self.mgets.fetch_add(1, Ordering::SeqCst);
        self.inner.mget(keys).await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.incrs.fetch_add(1, Ordering::SeqCst);
        self.inner.incr(key).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        self.inner.ping().await
    }
}

/// Counter store that is configured but never answers.
pub struct FailingStore;

impl FailingStore {
    fn unavailable() -> StoreError {
        StoreError::Status {
            status: 503,
            body: "store unavailable".to_string(),
        }
    }
}

#[async_trait]
impl CounterStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<i64>, StoreError> {
        Err(Self::unavailable())
    }

    async fn mget(&self, _keys: &[String]) -> Result<Vec<Option<i64>>, StoreError> {
        Err(Self::unavailable())
    }

    async fn incr(&self, _key: &str) -> Result<i64, StoreError> {
        Err(Self::unavailable())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(Self::unavailable())
    }
}

/// Serve the full API on an ephemeral local port. Cancel the token to stop.
pub async fn spawn_app(state: AppState) -> Result<(SocketAddr, CancellationToken)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let shutdown = CancellationToken::new();

    let token = shutdown.clone();
    tokio::spawn(async move {
        let served = axum::serve(listener, build_api_router(state))
            .with_graceful_shutdown(token.cancelled_owned())
            .await;
        if let Err(err) = served {
            tracing::error!("test server failed: {err}");
        }
    });

    Ok((addr, shutdown))
}

/// Write a post file with minimal frontmatter.
pub fn write_post(dir: &Path, file_name: &str, title: &str, date: &str, body: &str) -> Result<()> {
    let content = format!("---\ntitle: \"{title}\"\ndate: {date}\n---\n{body}\n");
    std::fs::write(dir.join(file_name), content)?;
    Ok(())
}
