//! WebInstall package catalog
//!
//! Turns the `webi-installers` repository into a list of installable
//! packages.
//!
//! # Architecture
//!
//! ```text
//! GitHubClient::get_tree()
//!        │
//!        ▼
//! index        ← top-level directories, per-package files
//!        │
//!        ▼
//! GitHubClient::get_file_content(<pkg>/README.md)   (batched)
//!        │
//!        ▼
//! frontmatter  ← `---` block + first paragraph
//!        │
//!        ▼
//! parser       ← PackageRecord (category, platforms, install commands)
//!        │
//!        ▼
//! service      ← cached catalog, search, filters, stats
//! ```

mod frontmatter;
mod index;
mod package;
mod parser;
mod service;

pub use frontmatter::{
    extract_description, parse_frontmatter, split_frontmatter, FrontmatterValue, PackageMetadata,
};
pub use index::{
    extract_package_directories, find_package_files, PackageFiles, RESERVED_DIRECTORIES,
};
pub use package::{
    CatalogStats, Category, InstallCommands, PackageRecord, Platform, PlatformCounts, Platforms,
};
pub use parser::{
    categorize_package, detect_platforms, generate_fallback_description,
    generate_install_commands, is_valid_package, PackageParser, ReadmeContent, EXCLUDED_PACKAGES,
    INSTALL_BASE_URL,
};
pub use service::{categories_of, stats_of, Catalog, PackageCatalogService, PackageQuery};
