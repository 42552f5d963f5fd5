//! Per-slug view counters backed by a remote key-value store.

pub mod errors;
pub mod handlers;
pub mod memory;
pub mod service;
pub mod state;
pub mod store;
pub mod upstash;

pub use errors::ViewCounterError;
pub use memory::MemoryStore;
pub use service::{DEFAULT_KEY_PREFIX, IncrementOutcome, StoreStatus, ViewCounter};
pub use state::ViewCounterState;
pub use store::{CounterStore, StoreError};
pub use upstash::{StoreCredentials, UpstashStore};
