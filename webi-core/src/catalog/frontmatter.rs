//! README frontmatter and description extraction
//!
//! Installer READMEs open with a flat `key: value` block:
//!
//! ```text
//! ---
//! title: Node.js
//! homepage: https://nodejs.org
//! tagline: |
//!   JavaScript V8 runtime
//! windows: true
//! ---
//! ```
//!
//! Only single-line pairs are understood. Nested YAML, lists and block
//! scalars are not; their lines either fail to split or keep their raw text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// A frontmatter value after coercion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
    Bool(bool),
    Text(String),
}

impl FrontmatterValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FrontmatterValue::Bool(b) => Some(*b),
            FrontmatterValue::Text(_) => None,
        }
    }

    /// Textual form; booleans render as `true`/`false`
    pub fn to_text(&self) -> String {
        match self {
            FrontmatterValue::Bool(b) => b.to_string(),
            FrontmatterValue::Text(s) => s.clone(),
        }
    }
}

/// Typed view of the recognised frontmatter keys
///
/// | key | type | default |
/// |---|---|---|
/// | `title` | text | package name |
/// | `tagline` | text | the description |
/// | `description` | text | first paragraph, then a generated sentence |
/// | `homepage` | text | the package's directory on GitHub |
/// | `version` | text | none |
/// | `linux`, `macos` | bool | true when `install.sh` exists |
/// | `windows` | bool | true when `install.ps1` exists |
///
/// Empty text values count as unset. Anything else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub version: Option<String>,
    pub linux: Option<bool>,
    pub macos: Option<bool>,
    pub windows: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, FrontmatterValue>,
}

impl PackageMetadata {
    /// Parse the frontmatter of `content` into typed fields
    pub fn parse(content: &str) -> Self {
        Self::from_map(parse_frontmatter(content))
    }

    /// Sort raw pairs into the recognised fields
    pub fn from_map(map: BTreeMap<String, FrontmatterValue>) -> Self {
        let mut metadata = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "title" => metadata.title = non_empty(&value),
                "tagline" => metadata.tagline = non_empty(&value),
                "description" => metadata.description = non_empty(&value),
                "homepage" => metadata.homepage = non_empty(&value),
                "version" => metadata.version = non_empty(&value),
                "linux" => metadata.linux = platform_flag(&key, &value),
                "macos" => metadata.macos = platform_flag(&key, &value),
                "windows" => metadata.windows = platform_flag(&key, &value),
                _ => {
                    metadata.extra.insert(key, value);
                }
            }
        }

        metadata
    }
}

fn non_empty(value: &FrontmatterValue) -> Option<String> {
    Some(value.to_text()).filter(|s| !s.is_empty())
}

fn platform_flag(key: &str, value: &FrontmatterValue) -> Option<bool> {
    let flag = value.as_bool();
    if flag.is_none() {
        trace!("Ignoring non-boolean platform flag {}: {:?}", key, value);
    }
    flag
}

/// Split `content` into its frontmatter block and the remaining body
///
/// The block must start on the first line with a `---` line and end at the
/// next `---` line. Returns `None` when there is no complete block.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let (first, rest) = content.split_once('\n')?;
    if first.trim_end() != "---" {
        return None;
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

/// Parse the flat `key: value` pairs of the frontmatter block
///
/// Blank and `#` lines are skipped, lines without a colon are ignored, one
/// surrounding quote is stripped from each end of the value, and
/// `true`/`false` (any case) become booleans. Missing or unterminated
/// frontmatter yields an empty map.
pub fn parse_frontmatter(content: &str) -> BTreeMap<String, FrontmatterValue> {
    let mut map = BTreeMap::new();

    let Some((block, _)) = split_frontmatter(content) else {
        return map;
    };

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let value = strip_quotes(value.trim());
        let value = if value.eq_ignore_ascii_case("true") {
            FrontmatterValue::Bool(true)
        } else if value.eq_ignore_ascii_case("false") {
            FrontmatterValue::Bool(false)
        } else {
            FrontmatterValue::Text(value.to_string())
        };

        map.insert(key.to_string(), value);
    }

    map
}

fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix(['"', '\'']).unwrap_or(value);
    value.strip_suffix(['"', '\'']).unwrap_or(value)
}

/// First line of prose after the frontmatter
///
/// Skips blank lines, headings and code-fence markers. This is a line scan,
/// not a Markdown parse: text inside a fenced block still counts.
pub fn extract_description(content: &str) -> Option<String> {
    let body = split_frontmatter(content)
        .map(|(_, body)| body)
        .unwrap_or(content);

    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("```"))
        .map(str::to_string)
}
