//! README to [`PackageRecord`] conversion

use chrono::{DateTime, Utc};
use std::borrow::Cow;

use super::frontmatter::{extract_description, PackageMetadata};
use super::package::{Category, InstallCommands, PackageRecord, Platforms};
use crate::config::CatalogConfig;
use crate::github::decode_base64_content;

/// Host serving the install scripts
pub const INSTALL_BASE_URL: &str = "https://webinstall.dev";

/// Names and titles of example/test entries that must never be listed
pub const EXCLUDED_PACKAGES: &[&str] = &["_npm", "Foo Bar", "vim-example"];

/// Category membership, checked in order; no name appears twice
const CATEGORY_MEMBERS: &[(Category, &[&str])] = &[
    (
        Category::JavaScriptRuntime,
        &["node", "npm", "yarn", "pnpm", "deno", "bun"],
    ),
    (
        Category::Python,
        &["python", "python3", "pip", "pip3", "poetry", "pipenv"],
    ),
    (Category::Go, &["go", "golang", "gofmt", "goimports"]),
    (Category::Rust, &["rust", "cargo", "rustc", "rustup"]),
    (
        Category::JavaJvm,
        &["java", "javac", "maven", "gradle", "kotlin"],
    ),
    (Category::VersionControl, &["git", "gh", "gitlab-cli", "hub"]),
    (
        Category::Containers,
        &["docker", "docker-compose", "podman", "containerd"],
    ),
    (
        Category::Kubernetes,
        &["kubectl", "helm", "k9s", "kubectx", "kustomize"],
    ),
    (
        Category::Infrastructure,
        &["terraform", "ansible", "vagrant", "packer"],
    ),
    (
        Category::Editors,
        &["vim", "nvim", "neovim", "emacs", "nano", "code", "cursor"],
    ),
    (
        Category::BuildTools,
        &["make", "cmake", "ninja", "bazel", "meson"],
    ),
    (
        Category::CliUtilities,
        &["curl", "wget", "jq", "yq", "fzf", "rg", "fd", "bat", "exa", "lsd"],
    ),
    (
        Category::Databases,
        &["postgres", "postgresql", "mysql", "redis", "mongodb", "sqlite"],
    ),
    (Category::WebServers, &["nginx", "apache", "caddy", "traefik"]),
    (Category::Security, &["gpg", "ssh", "openssl", "age", "sops"]),
    (
        Category::Monitoring,
        &["prometheus", "grafana", "jaeger", "zipkin"],
    ),
];

/// Hand-written descriptions for well-known tools
const KNOWN_DESCRIPTIONS: &[(&str, &str)] = &[
    ("node", "JavaScript runtime built on Chrome's V8 JavaScript engine"),
    ("npm", "Package manager for Node.js packages and modules"),
    ("yarn", "Fast, reliable, and secure dependency management for Node.js"),
    ("git", "Distributed version control system for tracking changes in source code"),
    ("docker", "Platform for developing, shipping, and running applications in containers"),
    ("python", "High-level programming language for general-purpose programming"),
    ("go", "Open source programming language that makes it easy to build simple, reliable, and efficient software"),
    ("rust", "Systems programming language focused on safety, speed, and concurrency"),
    ("vim", "Highly configurable text editor built to make creating and changing any kind of text very efficient"),
    ("nvim", "Hyperextensible Vim-based text editor"),
    ("code", "Free, open-source code editor developed by Microsoft"),
    ("kubectl", "Command line tool for controlling Kubernetes clusters"),
    ("terraform", "Infrastructure as code tool for building, changing, and versioning infrastructure"),
    ("ansible", "Simple IT automation platform that makes your applications and systems easier to deploy"),
    ("jq", "Lightweight and flexible command-line JSON processor"),
    ("curl", "Command line tool and library for transferring data with URLs"),
    ("wget", "Free software package for retrieving files using HTTP, HTTPS, FTP and FTPS"),
    ("make", "Build automation tool that automatically builds executable programs and libraries from source code"),
    ("cmake", "Cross-platform build system generator"),
    ("nginx", "High-performance HTTP server and reverse proxy"),
    ("postgres", "Advanced open source relational database system"),
    ("redis", "In-memory data structure store used as a database, cache, and message broker"),
    ("gh", "GitHub's official command line tool"),
    ("helm", "Package manager for Kubernetes"),
    ("k9s", "Terminal based UI to interact with your Kubernetes clusters"),
    ("fzf", "General-purpose command-line fuzzy finder"),
    ("bat", "Cat clone with syntax highlighting and Git integration"),
    ("fd", "Simple, fast and user-friendly alternative to find"),
    ("rg", "Recursively searches directories for a regex pattern while respecting your gitignore"),
    ("exa", "Modern replacement for ls with Git integration and color coding"),
];

/// How README text is handed to the parser
#[derive(Debug, Clone, Copy)]
pub enum ReadmeContent<'a> {
    /// Plain text
    Decoded(&'a str),
    /// Base64 as returned by the contents API
    Base64(&'a str),
}

impl<'a> ReadmeContent<'a> {
    /// Plain text; malformed base64 decodes to an empty string
    pub fn text(self) -> Cow<'a, str> {
        match self {
            ReadmeContent::Decoded(text) => Cow::Borrowed(text),
            ReadmeContent::Base64(encoded) => Cow::Owned(decode_base64_content(encoded)),
        }
    }
}

/// Map a package name to its category; unknown names are [`Category::Other`]
pub fn categorize_package(name: &str) -> Category {
    let name = name.to_lowercase();
    CATEGORY_MEMBERS
        .iter()
        .find(|(_, members)| members.contains(&name.as_str()))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Decide platform support
///
/// Linux and macOS are opt-out: supported whenever `install.sh` exists,
/// unless the frontmatter sets the flag to `false`. Windows is opt-in:
/// supported only with `windows: true` or an `install.ps1`.
pub fn detect_platforms(
    metadata: &PackageMetadata,
    has_install_sh: bool,
    has_install_ps1: bool,
) -> Platforms {
    Platforms {
        linux: has_install_sh && metadata.linux != Some(false),
        macos: has_install_sh && metadata.macos != Some(false),
        windows: metadata.windows == Some(true) || has_install_ps1,
    }
}

/// One-line install commands for a package name
///
/// Pure templating; the package is not checked to exist.
pub fn generate_install_commands(name: &str) -> InstallCommands {
    InstallCommands {
        curl: format!("curl -sS {INSTALL_BASE_URL}/{name} | bash"),
        wget: format!("wget -qO- {INSTALL_BASE_URL}/{name} | bash"),
        powershell: format!("curl.exe -A \"MS\" {INSTALL_BASE_URL}/{name} | powershell"),
    }
}

/// Description used when the README provides none
pub fn generate_fallback_description(name: &str, category: Category) -> String {
    let lower = name.to_lowercase();
    if let Some((_, description)) = KNOWN_DESCRIPTIONS.iter().find(|(n, _)| *n == lower) {
        return description.to_string();
    }

    let kind = match category {
        Category::JavaScriptRuntime => "JavaScript development tool",
        Category::Python => "Python development tool",
        Category::Go => "Go programming language tool",
        Category::Rust => "Rust programming language tool",
        Category::JavaJvm => "Java development tool",
        Category::VersionControl => "Version control tool",
        Category::Containers => "Container management tool",
        Category::Kubernetes => "Kubernetes tool",
        Category::Infrastructure => "Infrastructure automation tool",
        Category::Editors => "Text editor and development tool",
        Category::BuildTools => "Build automation tool",
        Category::CliUtilities => "Command line utility",
        Category::Databases => "Database system",
        Category::WebServers => "Web server",
        Category::Security => "Security tool",
        Category::Monitoring => "Monitoring and observability tool",
        Category::Other => "Development tool",
    };

    format!("{kind} for {name}")
}

/// Whether a record may be listed
///
/// Rejects the example/test entries in [`EXCLUDED_PACKAGES`] and any record
/// with an empty name or title or no supported platform.
pub fn is_valid_package(package: &PackageRecord) -> bool {
    if EXCLUDED_PACKAGES.contains(&package.name.as_str())
        || EXCLUDED_PACKAGES.contains(&package.title.as_str())
    {
        return false;
    }

    !package.name.is_empty() && !package.title.is_empty() && package.platforms.any()
}

/// Builds [`PackageRecord`]s from README content
#[derive(Debug, Clone)]
pub struct PackageParser {
    homepage_base: String,
}

impl Default for PackageParser {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

impl PackageParser {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            homepage_base: config.homepage_base.trim_end_matches('/').to_string(),
        }
    }

    /// Homepage used when the frontmatter declares none
    pub fn default_homepage(&self, name: &str) -> String {
        format!("{}/{}", self.homepage_base, name)
    }

    /// Compose a record from a package's README and install-script presence
    ///
    /// Description precedence: first prose line, then frontmatter
    /// `description`, then a generated sentence. `updated_at` defaults to now.
    pub fn parse_package(
        &self,
        name: &str,
        readme: ReadmeContent<'_>,
        has_install_sh: bool,
        has_install_ps1: bool,
        updated_at: Option<DateTime<Utc>>,
    ) -> PackageRecord {
        let text = readme.text();
        let metadata = PackageMetadata::parse(&text);
        let category = categorize_package(name);

        let description = extract_description(&text)
            .or_else(|| metadata.description.clone())
            .unwrap_or_else(|| generate_fallback_description(name, category));

        PackageRecord {
            name: name.to_string(),
            title: metadata.title.clone().unwrap_or_else(|| name.to_string()),
            tagline: metadata
                .tagline
                .clone()
                .unwrap_or_else(|| description.clone()),
            homepage: metadata
                .homepage
                .clone()
                .unwrap_or_else(|| self.default_homepage(name)),
            category,
            platforms: detect_platforms(&metadata, has_install_sh, has_install_ps1),
            install_command: generate_install_commands(name),
            version: metadata.version,
            updated_at: updated_at.unwrap_or_else(Utc::now),
            description,
        }
    }
}
