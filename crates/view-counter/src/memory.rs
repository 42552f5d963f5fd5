use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::{CounterStore, StoreError};

/// In-process counter store for local development and tests.
#[derive(Default)]
pub struct MemoryStore {
    counters: Mutex<HashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing counts.
    pub fn with_counts<I, K>(counts: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        let counters = counts.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            counters: Mutex::new(counters),
        }
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.counters.lock().await.get(key).copied())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<i64>>, StoreError> {
        let counters = self.counters.lock().await;
        Ok(keys.iter().map(|key| counters.get(key).copied()).collect())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut counters = self.counters.lock().await;
        let value = counters.entry(key.to_string()).or_insert(0);
        *value = value.checked_add(1).ok_or_else(|| {
            StoreError::Command("ERR increment or decrement would overflow".to_string())
        })?;
        Ok(*value)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_incr_starts_at_one() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("pageviews:a").await.unwrap(), 1);
        assert_eq!(store.incr("pageviews:a").await.unwrap(), 2);
        assert_eq!(store.get("pageviews:a").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_incr_overflow_is_an_error() {
        let store = MemoryStore::with_counts([("pageviews:max", i64::MAX)]);
        let err = store.incr("pageviews:max").await.unwrap_err();
        assert!(matches!(err, StoreError::Command(msg) if msg.contains("overflow")));
        assert_eq!(store.get("pageviews:max").await.unwrap(), Some(i64::MAX));
    }

    #[tokio::test]
    async fn test_mget_preserves_order_and_gaps() {
        let store = MemoryStore::with_counts([("k:a", 10), ("k:c", 30)]);
        let keys = vec!["k:a".to_string(), "k:b".to_string(), "k:c".to_string()];
        let values = store.mget(&keys).await.unwrap();
        assert_eq!(values, vec![Some(10), None, Some(30)]);
    }
}
