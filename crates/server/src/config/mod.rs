//! Configuration management for the site server
//!
//! Configuration is stored in RON. Secrets (counter store URL and token) are
//! never written to the file; the file names the environment variables that
//! carry them.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use view_counter::StoreCredentials;

use crate::validation::slug::normalize_slug;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub content: ContentSettings,

    #[serde(default)]
    pub views: ViewsSettings,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.views.validate()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerSettings {
    /// Socket address the HTTP API binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ContentSettings {
    /// Directory holding `.md` / `.mdx` posts
    #[serde(default = "default_posts_dir")]
    pub posts_dir: PathBuf,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            posts_dir: default_posts_dir(),
        }
    }
}

fn default_posts_dir() -> PathBuf {
    PathBuf::from("content/posts")
}

/// Which counter store backs the view counts
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Default)]
pub enum CounterBackend {
    /// Upstash-style REST endpoint; enabled only when credentials resolve
    #[default]
    Upstash,

    /// Process-local counters, lost on restart
    Memory,

    /// View counting switched off
    Disabled,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ViewsSettings {
    #[serde(default)]
    pub backend: CounterBackend,

    /// Key namespace; counters live at `{prefix}:{slug}`
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Environment variable name containing the store REST URL
    #[serde(default = "default_url_env")]
    pub url_env: String,

    /// Environment variable name containing the store access token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout for store calls
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Seconds between background store health checks; 0 turns them off
    #[serde(default = "default_health_check_secs")]
    pub health_check_secs: u64,
}

impl Default for ViewsSettings {
    fn default() -> Self {
        Self {
            backend: CounterBackend::default(),
            prefix: default_prefix(),
            url_env: default_url_env(),
            token_env: default_token_env(),
            timeout_ms: default_timeout_ms(),
            health_check_secs: default_health_check_secs(),
        }
    }
}

fn default_prefix() -> String {
    view_counter::DEFAULT_KEY_PREFIX.to_string()
}

fn default_url_env() -> String {
    "UPSTASH_REDIS_REST_URL".to_string()
}

fn default_token_env() -> String {
    "UPSTASH_REDIS_REST_TOKEN".to_string()
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_health_check_secs() -> u64 {
    30
}

impl ViewsSettings {
    pub fn validate(&self) -> Result<(), String> {
        if normalize_slug(&self.prefix).as_deref() != Some(self.prefix.as_str()) {
            return Err(format!(
                "Counter key prefix '{}' must contain only lowercase letters, numbers, and hyphens",
                self.prefix
            ));
        }

        if self.timeout_ms == 0 {
            return Err("Counter store timeout must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Interval for the background store health check, if enabled.
    pub fn health_check_interval(&self) -> Option<Duration> {
        (self.health_check_secs > 0).then(|| Duration::from_secs(self.health_check_secs))
    }

    /// Resolve store credentials from environment variables.
    ///
    /// Returns `Ok(None)` when either variable is unset or blank, which is the
    /// supported "counters disabled" mode. A present but malformed URL is an
    /// error.
    pub fn resolve_credentials(&self) -> anyhow::Result<Option<StoreCredentials>> {
        let url = non_empty_env(&self.url_env);
        let token = non_empty_env(&self.token_env);

        match (url, token) {
            (Some(url), Some(token)) => StoreCredentials::parse(&url, &token).map(Some),
            _ => Ok(None),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
