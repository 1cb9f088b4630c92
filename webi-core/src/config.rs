//! Catalog configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. An explicit path passed by the caller (e.g. `--config`)
//! 2. `~/.config/webi/config.yaml` (platform config directory)
//! 3. Built-in defaults
//!
//! The GitHub token is never stored in the file. Only the *name* of the
//! environment variable holding it is configurable (`token_env`).
//!
//! ```yaml
//! owner: webinstall
//! repo: webi-installers
//! batch_size: 10
//! cache:
//!   files:
//!     max_entries: 500
//!     ttl_seconds: 3600
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::CacheOptions;
use crate::error::CatalogError;

/// Default GitHub REST API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default repository owner
pub const DEFAULT_OWNER: &str = "webinstall";

/// Default repository name
pub const DEFAULT_REPO: &str = "webi-installers";

/// Default environment variable holding the GitHub token
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

const ONE_DAY: u64 = 24 * 60 * 60;

/// Top-level catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// GitHub REST API base URL
    pub api_base: String,

    /// Repository owner
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Branch whose tree is listed
    pub branch: String,

    /// Base URL for package homepages that don't declare one
    pub homepage_base: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Environment variable name containing the GitHub token
    pub token_env: String,

    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,

    /// Number of README fetches issued concurrently
    pub batch_size: usize,

    /// Pause between batches, in milliseconds
    pub batch_delay_ms: u64,

    /// Per-class cache overrides
    pub cache: CacheConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            branch: "main".to_string(),
            homepage_base: format!("https://github.com/{DEFAULT_OWNER}/{DEFAULT_REPO}/tree/master"),
            user_agent: "webi-installers-ui".to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout_seconds: 30,
            batch_size: 10,
            batch_delay_ms: 100,
            cache: CacheConfig::default(),
        }
    }
}

/// The data classes that get their own cache instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheClass {
    /// The recursive repository tree listing
    Tree,
    /// Individual file contents, keyed by path
    Files,
    /// Repository metadata (stars, forks)
    Metadata,
    /// The assembled package catalog
    Catalog,
}

impl CacheClass {
    /// Built-in options for this class
    ///
    /// Ages count from the fetch, not the last read; reads only refresh the
    /// LRU position.
    pub fn defaults(self) -> CacheOptions {
        let options = match self {
            CacheClass::Tree => CacheOptions::new(1, Duration::from_secs(ONE_DAY)),
            CacheClass::Files => CacheOptions::new(1000, Duration::from_secs(ONE_DAY)),
            CacheClass::Metadata => CacheOptions::new(1, Duration::from_secs(ONE_DAY)),
            CacheClass::Catalog => CacheOptions::new(1, Duration::from_secs(30 * 60)),
        };
        options.with_update_age_on_get(false)
    }
}

/// Optional overrides for every cache class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub tree: CacheOverride,
    pub files: CacheOverride,
    pub metadata: CacheOverride,
    pub catalog: CacheOverride,
}

/// Partial cache settings; unset keys keep the class default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOverride {
    pub max_entries: Option<usize>,
    pub ttl_seconds: Option<u64>,
    pub allow_stale: Option<bool>,
    pub update_age_on_get: Option<bool>,
}

impl CacheOverride {
    fn apply(&self, mut options: CacheOptions) -> CacheOptions {
        if let Some(max_entries) = self.max_entries {
            options.max_entries = max_entries;
        }
        if let Some(ttl) = self.ttl_seconds {
            options.ttl = Duration::from_secs(ttl);
        }
        if let Some(allow_stale) = self.allow_stale {
            options.allow_stale = allow_stale;
        }
        if let Some(update_age) = self.update_age_on_get {
            options.update_age_on_get = update_age;
        }
        options
    }
}

impl CatalogConfig {
    /// Load configuration, preferring an explicit path over the default location
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => match Self::default_config_path() {
                Some(path) => Self::load_from_path(&path),
                None => {
                    debug!("No config directory available, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load configuration from a YAML file; a missing file yields defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog config: {}", path.display()))?;

        let config: Self = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse catalog config: {}", path.display()))?;

        config.validate()?;
        debug!("Loaded catalog config from {}", path.display());
        Ok(config)
    }

    /// Default config file path (`<config dir>/webi/config.yaml`)
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "webinstall", "webi")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Check the settings that cannot be corrected silently
    pub fn validate(&self) -> Result<(), CatalogError> {
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(CatalogError::Config(format!(
                "api_base must start with http:// or https:// (got '{}')",
                self.api_base
            )));
        }
        if self.owner.is_empty() || self.repo.is_empty() {
            return Err(CatalogError::Config(
                "owner and repo must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the GitHub token from the configured environment variable
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Batch size clamped to at least one
    pub fn effective_batch_size(&self) -> usize {
        if self.batch_size == 0 {
            warn!("Configured batch_size=0 is invalid; using 1");
            1
        } else {
            self.batch_size
        }
    }

    /// Delay between README batches
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Effective cache options for a data class
    pub fn cache_options(&self, class: CacheClass) -> CacheOptions {
        let overrides = match class {
            CacheClass::Tree => &self.cache.tree,
            CacheClass::Files => &self.cache.files,
            CacheClass::Metadata => &self.cache.metadata,
            CacheClass::Catalog => &self.cache.catalog,
        };
        overrides.apply(class.defaults())
    }

    /// `/repos/{owner}/{repo}` endpoint prefix
    pub fn repo_endpoint(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }
}
