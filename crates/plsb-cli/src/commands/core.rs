//! Shared command utilities
//!
//! This module contains:
//! - `resolve_config` - Layer command-line flags over the loaded config
//! - `resolve_config_with` - Same, with an explicit environment lookup
//! - `open_source` - Build the cached data source for a config

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use plsb_core::{CachedSource, DashboardConfig, SourceConfig};

/// Load config and apply command-line overrides
pub fn resolve_config(
    config_path: Option<&Path>,
    csv: Option<&Path>,
    sheet_url: Option<&str>,
    cache_ttl: Option<u64>,
) -> Result<DashboardConfig> {
    resolve_config_with(
        config_path,
        |key| std::env::var(key).ok(),
        csv,
        sheet_url,
        cache_ttl,
    )
}

/// Like `resolve_config`, reading environment overrides through `env`
pub fn resolve_config_with<F>(
    config_path: Option<&Path>,
    env: F,
    csv: Option<&Path>,
    sheet_url: Option<&str>,
    cache_ttl: Option<u64>,
) -> Result<DashboardConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config =
        DashboardConfig::load_with(config_path, env).context("Failed to load config")?;

    if let Some(path) = csv {
        config.source = Some(SourceConfig::Csv {
            path: path.to_path_buf(),
        });
    }
    if let Some(url) = sheet_url {
        config.source = Some(SourceConfig::Sheet {
            url: url.to_string(),
        });
    }
    if let Some(secs) = cache_ttl {
        config.cache_ttl = Duration::from_secs(secs);
    }

    Ok(config)
}

/// Build the cached data source for a config
pub fn open_source(config: &DashboardConfig) -> Result<CachedSource> {
    config
        .cached_source()
        .context("Failed to open data source")
}
