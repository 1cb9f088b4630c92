//! Cache-aware GitHub client

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::transport::{ApiResponse, HttpTransport, ReqwestTransport};
use super::types::{FileContent, RepositoryInfo, RepositoryTree};
use super::{GitHubError, RateLimit};
use crate::cache::{get_cached, TtlCache};
use crate::config::{CacheClass, CatalogConfig};

/// Client for the package repository on GitHub
///
/// Every request goes through a per-class [`TtlCache`] keyed by endpoint,
/// so repeated calls inside the TTL never reach the network.
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    repo_endpoint: String,
    branch: String,
    tree_cache: TtlCache<Arc<RepositoryTree>>,
    file_cache: TtlCache<Arc<FileContent>>,
    metadata_cache: TtlCache<Arc<RepositoryInfo>>,
}

/// Error body returned by the API on failures
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GitHubClient {
    /// Create a client using the reqwest transport
    pub fn new(config: &CatalogConfig) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over any transport
    pub fn with_transport(config: &CatalogConfig, transport: Arc<dyn HttpTransport>) -> Self {
        debug!(
            "GitHub client for {}/{} via {} (authenticated: {})",
            config.owner,
            config.repo,
            transport.name(),
            transport.is_authenticated()
        );

        Self {
            transport,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repo_endpoint: config.repo_endpoint(),
            branch: config.branch.clone(),
            tree_cache: TtlCache::new("tree", config.cache_options(CacheClass::Tree)),
            file_cache: TtlCache::new("files", config.cache_options(CacheClass::Files)),
            metadata_cache: TtlCache::new("metadata", config.cache_options(CacheClass::Metadata)),
        }
    }

    /// Endpoint for the recursive tree of the configured branch
    pub fn tree_endpoint(&self) -> String {
        format!(
            "{}/git/trees/{}?recursive=1",
            self.repo_endpoint, self.branch
        )
    }

    /// Endpoint for one file's contents
    ///
    /// Each path segment is percent-encoded.
    pub fn contents_endpoint(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repo_endpoint, encode_path(path))
    }

    /// Endpoint for repository metadata
    pub fn repository_endpoint(&self) -> &str {
        &self.repo_endpoint
    }

    /// Full URL for an endpoint
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_base, endpoint)
    }

    /// Fetch the full recursive listing of the branch
    pub async fn get_tree(&self) -> Result<Arc<RepositoryTree>, GitHubError> {
        let endpoint = &self.tree_endpoint();
        get_cached(&self.tree_cache, endpoint, move || async move {
            let tree: RepositoryTree = self.request(endpoint).await?;
            if tree.truncated {
                warn!(
                    "Tree listing for {} is truncated ({} entries); some packages may be missing",
                    self.branch,
                    tree.tree.len()
                );
            }
            Ok(Arc::new(tree))
        })
        .await
    }

    /// Fetch one file; `content` is still base64
    pub async fn get_file_content(&self, path: &str) -> Result<Arc<FileContent>, GitHubError> {
        let endpoint = &self.contents_endpoint(path);
        get_cached(&self.file_cache, endpoint, move || async move {
            self.request::<FileContent>(endpoint).await.map(Arc::new)
        })
        .await
    }

    /// Fetch repository metadata (star count and friends)
    pub async fn get_repository_metadata(&self) -> Result<Arc<RepositoryInfo>, GitHubError> {
        let endpoint = self.repo_endpoint.as_str();
        get_cached(&self.metadata_cache, endpoint, move || async move {
            self.request::<RepositoryInfo>(endpoint).await.map(Arc::new)
        })
        .await
    }

    /// Drop every cached response
    pub fn clear_caches(&self) {
        self.tree_cache.clear();
        self.file_cache.clear();
        self.metadata_cache.clear();
    }

    /// Forget the cached tree so the next [`get_tree`](Self::get_tree) re-lists the branch
    pub fn invalidate_tree(&self) {
        if self.tree_cache.delete(&self.tree_endpoint()) {
            debug!("Invalidated cached tree for {}", self.branch);
        }
    }

    /// Number of cached file bodies
    pub fn cached_file_count(&self) -> usize {
        self.file_cache.len()
    }

    async fn request<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GitHubError> {
        let url = self.url_for(endpoint);
        debug!("GET {}", url);

        let response = self.transport.get(&url).await.inspect_err(|e| {
            debug!("Failed to fetch {}: {}", url, e);
        })?;

        let body = self.check_status(response).inspect_err(|e| {
            debug!("Failed to fetch {}: {}", url, e);
        })?;

        serde_json::from_str(&body).map_err(|e| GitHubError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    /// Turn a non-2xx response into the matching error
    fn check_status(&self, response: ApiResponse) -> Result<String, GitHubError> {
        if response.is_success() {
            return Ok(response.body);
        }

        if response.status == 403 || response.status == 429 {
            return Err(GitHubError::RateLimited(RateLimit::from_headers(
                &response.headers,
                self.transport.is_authenticated(),
            )));
        }

        let message = serde_json::from_str::<ErrorBody>(&response.body)
            .map(|b| b.message)
            .unwrap_or_else(|_| response.body.chars().take(200).collect());

        Err(GitHubError::Http {
            status: response.status,
            message,
        })
    }
}

/// Percent-encode every `/`-separated segment of a repository path
fn encode_path(path: &str) -> String {
    let Ok(mut url) = Url::parse("https://segments.invalid/") else {
        return path.to_string();
    };

    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .clear()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
    }

    url.path().trim_start_matches('/').to_string()
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .field("repo_endpoint", &self.repo_endpoint)
            .field("branch", &self.branch)
            .field("transport", &self.transport.name())
            .finish_non_exhaustive()
    }
}
