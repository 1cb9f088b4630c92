//! GitHub API error types

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while talking to the GitHub API
#[derive(Error, Debug)]
pub enum GitHubError {
    /// 403/429 from the API; the request quota is exhausted
    #[error("{0}")]
    RateLimited(RateLimit),

    /// Any other non-2xx response
    #[error("GitHub API error: {status} {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("Failed to reach GitHub API at {url}: {message}")]
    Transport { url: String, message: String },

    /// A 2xx response whose body did not match the expected shape
    #[error("Unexpected response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },
}

/// Rate-limit state reported by the `x-ratelimit-*` headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<DateTime<Utc>>,
    /// Whether the rejected request carried a token
    pub authenticated: bool,
}

impl RateLimit {
    /// Read the rate-limit headers (names are expected lower-cased)
    pub fn from_headers(headers: &HashMap<String, String>, authenticated: bool) -> Self {
        let number = |name: &str| headers.get(name).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            limit: number("x-ratelimit-limit"),
            remaining: number("x-ratelimit-remaining"),
            reset: number("x-ratelimit-reset")
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            authenticated,
        }
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GitHub API rate limit exceeded")?;

        if let (Some(remaining), Some(limit)) = (self.remaining, self.limit) {
            write!(f, " ({remaining}/{limit} requests remaining)")?;
        }

        match self.reset {
            Some(reset) => write!(f, ". Resets at {}", reset.to_rfc3339())?,
            None => write!(f, ". Reset time unknown")?,
        }

        if self.authenticated {
            write!(f, ". The configured token has used its quota; wait for the reset")
        } else {
            write!(
                f,
                ". Requests are unauthenticated; set a GitHub token (GITHUB_TOKEN) for a higher limit"
            )
        }
    }
}
