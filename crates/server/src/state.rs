use std::sync::Arc;

use serde_json::Value;
use view_counter::{CounterStore, MemoryStore, UpstashStore, ViewCounter, ViewCounterState};

use crate::config::{CounterBackend, ViewsSettings};
use crate::content::ContentLibrary;
use crate::validation::slug::normalize_slug_value;

/// Shared state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub views: ViewCounter,
    pub content: Arc<ContentLibrary>,
}

impl AppState {
    pub fn new(views: ViewCounter, content: ContentLibrary) -> Self {
        Self {
            views,
            content: Arc::new(content),
        }
    }
}

impl ViewCounterState for AppState {
    fn views(&self) -> &ViewCounter {
        &self.views
    }

    fn normalize_slug(&self, raw: &Value) -> Option<String> {
        normalize_slug_value(raw)
    }
}

/// Construct the view counter selected by configuration.
///
/// The Upstash backend only connects when both credentials resolve;
/// otherwise counting is disabled without error.
pub fn build_view_counter(settings: &ViewsSettings) -> anyhow::Result<ViewCounter> {
    match settings.backend {
        CounterBackend::Disabled => {
            tracing::info!("view counting disabled by configuration");
            Ok(ViewCounter::disabled())
        }
        CounterBackend::Memory => {
            tracing::warn!("using in-memory view counters; counts reset on restart");
            Ok(ViewCounter::new(Arc::new(MemoryStore::new()), &settings.prefix))
        }
        CounterBackend::Upstash => {
            let credentials = settings.resolve_credentials()?;
            let timeout = settings.timeout();
            ViewCounter::from_credentials(credentials, &settings.prefix, |credentials| {
                tracing::info!("view counters backed by {}", credentials.url);
                let store = UpstashStore::new(credentials, timeout)?;
                Ok(Arc::new(store) as Arc<dyn CounterStore>)
            })
        }
    }
}
