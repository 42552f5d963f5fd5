//! Configuration file loading and parsing
//!
//! Loads site configuration from RON files, searching standard locations
//! when no explicit path is given.

use super::Config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Standard config file names to search for
const CONFIG_FILENAMES: &[&str] = &["site.ron", ".site/config.ron"];

/// Load configuration from a specific file path
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_ron(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config
        .validate()
        .map_err(|msg| anyhow::anyhow!("Invalid config file {}: {}", path.display(), msg))?;
    Ok(config)
}

/// Load configuration with automatic file discovery
///
/// Searches, in order:
/// 1. Path in the SITE_CONFIG_PATH environment variable
/// 2. site.ron in the current directory
/// 3. .site/config.ron relative to the current directory
///
/// Falls back to defaults when nothing is found.
pub fn load_with_discovery() -> Result<Config> {
    if let Ok(env_path) = std::env::var("SITE_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            tracing::info!("Loading config from SITE_CONFIG_PATH: {}", path.display());
            return load_from_file(&path);
        } else {
            tracing::warn!(
                "SITE_CONFIG_PATH specified but file not found: {}",
                path.display()
            );
        }
    }

    for filename in CONFIG_FILENAMES {
        let path = PathBuf::from(filename);
        if path.exists() {
            tracing::info!("Loading config from: {}", path.display());
            return load_from_file(&path);
        }
    }

    tracing::info!("No config file found, using defaults");
    Ok(Config::default())
}

fn parse_ron(content: &str) -> Result<Config> {
    ron::from_str(content).context("Failed to parse RON configuration")
}
