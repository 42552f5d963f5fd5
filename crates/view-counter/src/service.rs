use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;

use crate::store::{CounterStore, counter_key};

pub const DEFAULT_KEY_PREFIX: &str = "pageviews";

/// Result of recording a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// The store applied the increment and returned the new count.
    Counted(u64),
    /// No counter store is configured; nothing was attempted.
    Disabled,
    /// The store is configured but the increment did not go through.
    Failed,
}

impl IncrementOutcome {
    /// Collapse to the legacy integer convention: the new count, `0` when
    /// counters are disabled, `-1` when the increment failed.
    pub fn legacy_count(self) -> i64 {
        match self {
            IncrementOutcome::Counted(n) => i64::try_from(n).unwrap_or(i64::MAX),
            IncrementOutcome::Disabled => 0,
            IncrementOutcome::Failed => -1,
        }
    }
}

/// Health of the backing store as seen by [`ViewCounter::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Disabled,
    Healthy,
    Unreachable,
}

impl StoreStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreStatus::Disabled => "disabled",
            StoreStatus::Healthy => "healthy",
            StoreStatus::Unreachable => "unreachable",
        }
    }
}

/// Per-slug view counters over a remote counter store.
///
/// Holds no counts of its own. Reads degrade to zero on any failure;
/// increments report failure through [`IncrementOutcome::Failed`].
#[derive(Clone)]
pub struct ViewCounter {
    store: Option<Arc<dyn CounterStore>>,
    prefix: String,
}

impl ViewCounter {
    pub fn new(store: Arc<dyn CounterStore>, prefix: impl Into<String>) -> Self {
        Self {
            store: Some(store),
            prefix: prefix.into(),
        }
    }

    /// A counter with no backing store. Reads return 0 and increments
    /// return [`IncrementOutcome::Disabled`].
    pub fn disabled() -> Self {
        Self::disabled_with_prefix(DEFAULT_KEY_PREFIX)
    }

    fn disabled_with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            store: None,
            prefix: prefix.into(),
        }
    }

    /// Build a counter from optional credentials. `connect` is only invoked
    /// when credentials are present.
    pub fn from_credentials<C, F>(
        credentials: Option<C>,
        prefix: impl Into<String>,
        connect: F,
    ) -> anyhow::Result<Self>
    where
        F: FnOnce(C) -> anyhow::Result<Arc<dyn CounterStore>>,
    {
        match credentials {
            Some(credentials) => Ok(Self::new(connect(credentials)?, prefix)),
            None => {
                tracing::info!("counter store not configured, view counts disabled");
                Ok(Self::disabled_with_prefix(prefix))
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, slug: &str) -> String {
        counter_key(&self.prefix, slug)
    }

    /// Current view count for `slug`. Never-incremented, disabled and failed
    /// reads all yield 0.
    pub async fn get(&self, slug: &str) -> u64 {
        let Some(store) = &self.store else {
            return 0;
        };

        match store.get(&self.key(slug)).await {
            Ok(value) => clamp(value),
            Err(err) => {
                tracing::warn!("view count read for {slug} failed: {err}");
                counter!("site_views_read_fallback_total").increment(1);
                0
            }
        }
    }

    /// View counts for several slugs in one store round trip.
    ///
    /// The returned map has exactly the requested slugs as keys. On store
    /// failure every slug maps to 0.
    pub async fn get_many(&self, slugs: &[String]) -> HashMap<String, u64> {
        if slugs.is_empty() {
            return HashMap::new();
        }

        let Some(store) = &self.store else {
            return zeroed(slugs);
        };

        let keys: Vec<String> = slugs.iter().map(|slug| self.key(slug)).collect();
        match store.mget(&keys).await {
            Ok(values) => slugs
                .iter()
                .cloned()
                .zip(values.into_iter().chain(std::iter::repeat(None)))
                .map(|(slug, value)| (slug, clamp(value)))
                .collect(),
            Err(err) => {
                tracing::warn!("batch view count read for {} slugs failed: {err}", slugs.len());
                counter!("site_views_read_fallback_total").increment(1);
                zeroed(slugs)
            }
        }
    }

    /// Record one view of `slug` using the store's atomic increment.
    pub async fn increment(&self, slug: &str) -> IncrementOutcome {
        let Some(store) = &self.store else {
            counter!("site_views_increment_total", "outcome" => "disabled").increment(1);
            return IncrementOutcome::Disabled;
        };

        match store.incr(&self.key(slug)).await {
            Ok(value) => {
                counter!("site_views_increment_total", "outcome" => "counted").increment(1);
                IncrementOutcome::Counted(u64::try_from(value).unwrap_or(0))
            }
            Err(err) => {
                tracing::error!("view increment for {slug} failed: {err}");
                counter!("site_views_increment_total", "outcome" => "failed").increment(1);
                IncrementOutcome::Failed
            }
        }
    }

    /// Probe the store. Used by health reporting only; counts never carry
    /// health information.
    pub async fn status(&self) -> StoreStatus {
        let Some(store) = &self.store else {
            return StoreStatus::Disabled;
        };

        match store.ping().await {
            Ok(()) => StoreStatus::Healthy,
            Err(err) => {
                tracing::warn!("counter store health check failed: {err}");
                StoreStatus::Unreachable
            }
        }
    }
}

fn clamp(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}

fn zeroed(slugs: &[String]) -> HashMap<String, u64> {
    slugs.iter().map(|slug| (slug.clone(), 0)).collect()
}
