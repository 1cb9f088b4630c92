//! Wire types for the GitHub endpoints we consume

use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Kind of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Directory
    Tree,
    /// File
    Blob,
    /// Submodule
    Commit,
    #[serde(other)]
    Other,
}

/// One entry of a recursive tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the repository root, `/`-separated
    pub path: String,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    #[serde(default)]
    pub sha: String,

    /// File size in bytes (absent for directories)
    #[serde(default)]
    pub size: Option<u64>,

    #[serde(default)]
    pub mode: Option<String>,
}

impl TreeEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Tree
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::Blob
    }

    /// Whether the entry sits directly under the repository root
    pub fn is_top_level(&self) -> bool {
        !self.path.contains('/')
    }

    /// Final path segment
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Number of `/`-separated segments
    pub fn depth(&self) -> usize {
        self.path.split('/').count()
    }
}

/// Flat recursive listing of a branch (`GET /git/trees/{branch}?recursive=1`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryTree {
    #[serde(default)]
    pub sha: String,

    pub tree: Vec<TreeEntry>,

    /// GitHub stops listing after a size limit and sets this flag
    #[serde(default)]
    pub truncated: bool,
}

impl RepositoryTree {
    pub fn new(tree: Vec<TreeEntry>) -> Self {
        Self {
            sha: String::new(),
            tree,
            truncated: false,
        }
    }
}

/// A single file (`GET /contents/{path}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub name: String,

    pub path: String,

    #[serde(default)]
    pub sha: String,

    #[serde(default)]
    pub size: u64,

    /// Base64 body, wrapped at 60 columns by GitHub
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub encoding: String,

    #[serde(default)]
    pub html_url: Option<String>,

    #[serde(default)]
    pub download_url: Option<String>,
}

impl FileContent {
    /// Decoded file body; empty when the content is not valid base64
    pub fn decoded(&self) -> String {
        decode_base64_content(&self.content)
    }
}

/// Repository metadata (`GET /repos/{owner}/{repo}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub full_name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub html_url: String,

    #[serde(default)]
    pub default_branch: String,

    #[serde(default)]
    pub stargazers_count: u64,

    #[serde(default)]
    pub forks_count: u64,

    #[serde(default)]
    pub open_issues_count: u64,
}

/// Decode a base64 body as returned by the contents API
///
/// Line breaks are ignored. Malformed input yields an empty string and a
/// warning instead of an error; invalid UTF-8 is replaced lossily.
pub fn decode_base64_content(content: &str) -> String {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();

    match BASE64_STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
        Err(e) => {
            warn!("Failed to decode base64 content: {}", e);
            String::new()
        }
    }
}
