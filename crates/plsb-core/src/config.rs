//! Dashboard configuration
//!
//! ## Configuration Resolution
//!
//! Config is resolved in layers, later layers winning:
//! 1. Embedded defaults (compiled into binary)
//! 2. Override file (`--config`, or ~/.local/share/plsb/config/dashboard.toml)
//! 3. Environment variables (`PLSB_CSV_PATH`, `PLSB_SHEET_URL`, `PLSB_CACHE_TTL_SECS`)
//! 4. Command-line flags, applied by the caller
//!
//! The data source is an explicit value built from this config and handed to
//! whoever needs it; nothing here is global.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::source::{CachedSource, CsvFileSource, DataSource, SheetSource};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/dashboard.toml");

pub const ENV_CSV_PATH: &str = "PLSB_CSV_PATH";
pub const ENV_SHEET_URL: &str = "PLSB_SHEET_URL";
pub const ENV_CACHE_TTL_SECS: &str = "PLSB_CACHE_TTL_SECS";

/// Page chrome shown on every page
#[derive(Debug, Clone, PartialEq)]
pub struct PageConfig {
    pub title: String,
    pub icon: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "PLSB DASH".to_string(),
            icon: "👋".to_string(),
        }
    }
}

/// Body text of the welcome page
pub const WELCOME_BODY: &str = "A personal finance dashboard built on a monthly spreadsheet. \
Pick a month on the dashboard page to see income, spending per category and \
how each one moved against the month before.";

impl PageConfig {
    /// Heading of the welcome page
    pub fn welcome_heading(&self) -> String {
        format!("Welcome to {}! {}", self.title, self.icon)
    }
}

/// Where the finance sheet is read from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    Csv { path: PathBuf },
    Sheet { url: String },
}

impl SourceConfig {
    /// Build the data source this config describes
    pub fn build(&self, timeout: Duration) -> Arc<dyn DataSource> {
        match self {
            Self::Csv { path } => Arc::new(CsvFileSource::new(path.clone())),
            Self::Sheet { url } => Arc::new(SheetSource::new(url, timeout)),
        }
    }
}

/// Web server bind settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Full dashboard configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub page: PageConfig,
    pub source: Option<SourceConfig>,
    /// How long a fetched dataset is served before refetching
    pub cache_ttl: Duration,
    /// Timeout for spreadsheet fetches
    pub timeout: Duration,
    pub server: ServerSettings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            source: None,
            cache_ttl: Duration::from_secs(600),
            timeout: Duration::from_secs(30),
            server: ServerSettings::default(),
        }
    }
}

impl DashboardConfig {
    /// Load config from the override file (if any) and the environment
    ///
    /// An explicitly given path must exist; the default override location is
    /// optional.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        Self::load_with(override_path, |key| std::env::var(key).ok())
    }

    /// Like `load`, reading environment overrides through `lookup`
    pub fn load_with<F>(override_path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = match override_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                read_config(path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => read_config(&path)?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        let mut config = Self::parse(&content)?;
        config.apply_env_with(lookup)?;
        Ok(config)
    }

    /// Parse config from TOML content, starting from the defaults
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(page) = raw.page {
            if let Some(title) = page.title {
                config.page.title = title;
            }
            if let Some(icon) = page.icon {
                config.page.icon = icon;
            }
        }

        if let Some(source) = raw.source {
            if let Some(path) = source.csv_path {
                config.source = Some(SourceConfig::Csv { path });
            }
            // A sheet URL wins over a CSV path
            if let Some(url) = source.sheet_url {
                config.source = Some(SourceConfig::Sheet { url });
            }
            if let Some(ttl) = source.cache_ttl_secs {
                config.cache_ttl = Duration::from_secs(ttl);
            }
            if let Some(timeout) = source.timeout_secs {
                config.timeout = Duration::from_secs(timeout);
            }
        }

        if let Some(server) = raw.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
        }

        Ok(config)
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty(ENV_CSV_PATH) {
            self.source = Some(SourceConfig::Csv {
                path: PathBuf::from(path),
            });
        }
        if let Some(url) = non_empty(ENV_SHEET_URL) {
            self.source = Some(SourceConfig::Sheet { url });
        }
        if let Some(ttl) = non_empty(ENV_CACHE_TTL_SECS) {
            let secs: u64 = ttl.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a number of seconds", ENV_CACHE_TTL_SECS))
            })?;
            self.cache_ttl = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// The configured source, or an error telling the user how to set one
    pub fn source_config(&self) -> Result<&SourceConfig> {
        self.source.as_ref().ok_or_else(|| {
            Error::Config(format!(
                "No data source configured (use --csv, --sheet-url, {} or {})",
                ENV_CSV_PATH, ENV_SHEET_URL
            ))
        })
    }

    /// Build the cached data source for this config
    pub fn cached_source(&self) -> Result<CachedSource> {
        let source = self.source_config()?.build(self.timeout);
        Ok(CachedSource::new(source, self.cache_ttl))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("plsb").join("config").join("dashboard.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::Config(format!("Failed to read config: {}", e)))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    page: Option<RawPage>,
    source: Option<RawSource>,
    server: Option<RawServer>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    title: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    csv_path: Option<PathBuf>,
    sheet_url: Option<String>,
    cache_ttl_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_default_config() {
        let config = DashboardConfig::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.page.title, "PLSB DASH");
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.server.port, 3000);
        assert!(config.source.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config = DashboardConfig::parse(
            r#"
[source]
csv_path = "data/finance.csv"
cache_ttl_secs = 60
"#,
        )
        .unwrap();
        assert_eq!(
            config.source,
            Some(SourceConfig::Csv {
                path: PathBuf::from("data/finance.csv")
            })
        );
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.page, PageConfig::default());
    }

    #[test]
    fn test_sheet_url_wins_over_csv_path() {
        let config = DashboardConfig::parse(
            r#"
[source]
csv_path = "finance.csv"
sheet_url = "https://example.com/sheet.csv"
"#,
        )
        .unwrap();
        assert!(matches!(config.source, Some(SourceConfig::Sheet { .. })));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            DashboardConfig::parse("[source\ncsv_path ="),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_CSV_PATH, "/tmp/finance.csv"),
            (ENV_CACHE_TTL_SECS, "5"),
            (ENV_SHEET_URL, ""),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::default();
        config
            .apply_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(
            config.source,
            Some(SourceConfig::Csv {
                path: PathBuf::from("/tmp/finance.csv")
            })
        );
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
    }

    #[test]
    fn test_env_bad_ttl() {
        let mut config = DashboardConfig::default();
        let result = config.apply_env_with(|key| {
            (key == ENV_CACHE_TTL_SECS).then(|| "ten minutes".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_source_is_reported() {
        let config = DashboardConfig::default();
        let err = config.cached_source().err().unwrap();
        assert!(err.to_string().contains("No data source configured"));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(&path, "[page]\ntitle = \"My Money\"\n").unwrap();

        let config = DashboardConfig::load(Some(&path)).unwrap();
        assert_eq!(config.page.title, "My Money");

        let missing = dir.path().join("nope.toml");
        assert!(DashboardConfig::load(Some(&missing)).is_err());
    }
}
