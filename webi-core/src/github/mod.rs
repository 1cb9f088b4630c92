//! GitHub REST API access
//!
//! ```text
//! GitHubClient ──(cache miss)──▶ HttpTransport ──▶ api.github.com
//!      │
//!      ├── tree cache      /git/trees/{branch}?recursive=1
//!      ├── file cache      /contents/{path}
//!      └── metadata cache  /repos/{owner}/{repo}
//! ```
//!
//! Only three endpoints are used. There is no retry loop; a failed
//! refresh falls back on whatever stale entry the cache still holds.

mod client;
mod error;
mod transport;
mod types;

pub use client::GitHubClient;
pub use error::{GitHubError, RateLimit};
pub use transport::{ApiResponse, HttpTransport, ReqwestTransport};
pub use types::{
    decode_base64_content, EntryKind, FileContent, RepositoryInfo, RepositoryTree, TreeEntry,
};

#[cfg(test)]
pub(crate) use transport::mock;
