//! Catalog-level error types

use std::sync::Arc;
use thiserror::Error;

use crate::github::GitHubError;

/// Errors surfaced by the package catalog
///
/// Cloneable so that every caller waiting on one in-flight refresh
/// receives the same outcome.
#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    /// The repository tree could not be obtained and no earlier catalog
    /// was available to fall back on
    #[error("Failed to load package catalog: {0}")]
    TreeUnavailable(#[source] Arc<GitHubError>),

    /// A single package's README could not be fetched or parsed
    #[error("Failed to fetch package '{package}': {source}")]
    PackageFetch {
        package: String,
        #[source]
        source: Arc<GitHubError>,
    },

    /// Repository metadata could not be fetched
    #[error("Failed to fetch repository metadata: {0}")]
    Repository(#[source] Arc<GitHubError>),

    /// Invalid configuration
    #[error("Invalid catalog configuration: {0}")]
    Config(String),
}

impl CatalogError {
    /// The underlying upstream error, when there is one
    pub fn upstream(&self) -> Option<&GitHubError> {
        match self {
            CatalogError::TreeUnavailable(source) => Some(source),
            CatalogError::PackageFetch { source, .. } => Some(source),
            CatalogError::Repository(source) => Some(source),
            CatalogError::Config(_) => None,
        }
    }

    /// Whether this failure was caused by GitHub rate limiting
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.upstream(), Some(GitHubError::RateLimited { .. }))
    }
}
