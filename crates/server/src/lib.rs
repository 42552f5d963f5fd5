//! Site server: blog content, view counters and their HTTP API.

pub mod api;
pub mod config;
pub mod content;
pub mod metrics_exporter;
pub mod state;
pub mod store_monitor;
pub mod supervisor;
pub mod validation;

pub mod test_helpers;
