//! Package record and its component types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed package categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "JavaScript Runtime")]
    JavaScriptRuntime,
    Python,
    Go,
    Rust,
    #[serde(rename = "Java/JVM")]
    JavaJvm,
    #[serde(rename = "Version Control")]
    VersionControl,
    Containers,
    Kubernetes,
    Infrastructure,
    Editors,
    #[serde(rename = "Build Tools")]
    BuildTools,
    #[serde(rename = "CLI Utilities")]
    CliUtilities,
    Databases,
    #[serde(rename = "Web Servers")]
    WebServers,
    Security,
    Monitoring,
    Other,
}

impl Category {
    /// Every category, in classification order
    pub const ALL: [Category; 17] = [
        Category::JavaScriptRuntime,
        Category::Python,
        Category::Go,
        Category::Rust,
        Category::JavaJvm,
        Category::VersionControl,
        Category::Containers,
        Category::Kubernetes,
        Category::Infrastructure,
        Category::Editors,
        Category::BuildTools,
        Category::CliUtilities,
        Category::Databases,
        Category::WebServers,
        Category::Security,
        Category::Monitoring,
        Category::Other,
    ];

    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::JavaScriptRuntime => "JavaScript Runtime",
            Category::Python => "Python",
            Category::Go => "Go",
            Category::Rust => "Rust",
            Category::JavaJvm => "Java/JVM",
            Category::VersionControl => "Version Control",
            Category::Containers => "Containers",
            Category::Kubernetes => "Kubernetes",
            Category::Infrastructure => "Infrastructure",
            Category::Editors => "Editors",
            Category::BuildTools => "Build Tools",
            Category::CliUtilities => "CLI Utilities",
            Category::Databases => "Databases",
            Category::WebServers => "Web Servers",
            Category::Security => "Security",
            Category::Monitoring => "Monitoring",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown category: {s}"))
    }
}

/// An operating system an installer can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Macos,
    Windows,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Linux, Platform::Macos, Platform::Windows];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::Macos),
            "windows" => Ok(Platform::Windows),
            _ => Err(format!(
                "Unknown platform: {s} (expected linux, macos or windows)"
            )),
        }
    }
}

/// Platform support flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platforms {
    pub linux: bool,
    pub macos: bool,
    pub windows: bool,
}

impl Platforms {
    pub fn supports(&self, platform: Platform) -> bool {
        match platform {
            Platform::Linux => self.linux,
            Platform::Macos => self.macos,
            Platform::Windows => self.windows,
        }
    }

    /// At least one platform is supported
    pub fn any(&self) -> bool {
        self.linux || self.macos || self.windows
    }

    /// Supported platforms, in `Platform::ALL` order
    pub fn list(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.supports(*p))
            .collect()
    }
}

/// One-line install commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallCommands {
    pub curl: String,
    pub wget: String,
    pub powershell: String,
}

/// A package in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    /// Repository directory name; unique
    pub name: String,

    pub title: String,

    pub tagline: String,

    pub description: String,

    pub homepage: String,

    pub category: Category,

    pub platforms: Platforms,

    pub install_command: InstallCommands,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Fetch time; the repository's last-modified date is not tracked
    pub updated_at: DateTime<Utc>,
}

/// Aggregate catalog counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_packages: usize,
    pub categories_count: usize,
    pub platform_counts: PlatformCounts,
}

/// Packages supporting each platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCounts {
    pub linux: usize,
    pub macos: usize,
    pub windows: usize,
}
