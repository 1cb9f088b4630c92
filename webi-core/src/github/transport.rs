//! HTTP transport abstraction
//!
//! The client only needs "GET this URL and give me status, headers and
//! body". Keeping that behind a trait lets tests serve canned responses
//! without a network.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::GitHubError;
use crate::config::CatalogConfig;

/// A completed HTTP response, whatever its status
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    /// Header names lower-cased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP transports
///
/// Implementations return `Err` only when no response was received;
/// non-2xx statuses come back as an [`ApiResponse`] for the client to
/// classify.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET request
    async fn get(&self, url: &str) -> Result<ApiResponse, GitHubError>;

    /// Whether requests carry a bearer token
    fn is_authenticated(&self) -> bool;

    /// Transport identifier for logging/debugging
    fn name(&self) -> &'static str;
}

/// reqwest-backed transport used in production
pub struct ReqwestTransport {
    client: reqwest::Client,
    authenticated: bool,
}

impl ReqwestTransport {
    /// Build a client with the identifying headers and optional token from `config`
    pub fn new(config: &CatalogConfig) -> Result<Self, GitHubError> {
        let token = config.token();
        let authenticated = token.is_some();

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                GitHubError::Transport {
                    url: config.api_base.clone(),
                    message: format!("invalid token in {}: {e}", config.token_env),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            debug!(
                "{} not set; using unauthenticated GitHub requests",
                config.token_env
            );
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GitHubError::Transport {
                url: config.api_base.clone(),
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            authenticated,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<ApiResponse, GitHubError> {
        let transport_error = |e: reqwest::Error| GitHubError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(transport_error)?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}
