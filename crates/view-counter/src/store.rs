use async_trait::async_trait;

/// Errors raised by a counter store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("counter store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("counter store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("counter store rejected command: {0}")]
    Command(String),

    #[error("unexpected counter store reply: {0}")]
    Decode(String),
}

/// Remote key-value store providing atomic integer counters.
///
/// Implementations must apply `incr` atomically on the store side; callers
/// never read-modify-write.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a single counter. `None` when the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// Read many counters in one round trip. The reply has the same length
    /// and order as `keys`.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<i64>>, StoreError>;

    /// Atomically add one to a counter, returning the new value.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Round trip used for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Build the store key for a slug: `{prefix}:{slug}`.
pub fn counter_key(prefix: &str, slug: &str) -> String {
    format!("{prefix}:{slug}")
}
