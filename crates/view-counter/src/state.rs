use serde_json::Value;

use crate::service::ViewCounter;

/// Abstraction over the state required by the view HTTP handlers.
pub trait ViewCounterState: Clone + Send + Sync + 'static {
    fn views(&self) -> &ViewCounter;

    /// Turn untrusted input into a canonical slug, or reject it.
    fn normalize_slug(&self, raw: &Value) -> Option<String>;
}
