//! Package discovery from the repository tree
//!
//! The tree is a flat listing; package/file relationships are derived by
//! path prefix alone.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::github::RepositoryTree;

/// Top-level directories that never hold a package
pub const RESERVED_DIRECTORIES: &[&str] = &["docs", "scripts", "tests", "_webi"];

/// Sorted, de-duplicated package directory names
///
/// A package is any top-level directory that is not hidden and not in
/// [`RESERVED_DIRECTORIES`].
pub fn extract_package_directories(tree: &RepositoryTree) -> Vec<String> {
    tree.tree
        .iter()
        .filter(|entry| entry.is_dir() && entry.is_top_level())
        .map(|entry| entry.path.as_str())
        .filter(|path| !path.starts_with('.') && !RESERVED_DIRECTORIES.contains(path))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Paths of the well-known files inside one package directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageFiles {
    pub readme: Option<String>,
    pub releases: Option<String>,
    pub install_sh: Option<String>,
    pub install_ps1: Option<String>,
}

impl PackageFiles {
    pub fn has_install_sh(&self) -> bool {
        self.install_sh.is_some()
    }

    pub fn has_install_ps1(&self) -> bool {
        self.install_ps1.is_some()
    }

    fn slot(&mut self, basename: &str) -> Option<&mut Option<String>> {
        match basename.to_ascii_lowercase().as_str() {
            "readme.md" => Some(&mut self.readme),
            "releases.js" => Some(&mut self.releases),
            "install.sh" => Some(&mut self.install_sh),
            "install.ps1" => Some(&mut self.install_ps1),
            _ => None,
        }
    }
}

/// Locate `README.md`, `releases.js`, `install.sh` and `install.ps1` for a
/// package
///
/// Basenames match case-insensitively anywhere under `{package}/`. When the
/// same basename occurs more than once, the shallowest path wins; among
/// equally deep paths the first one listed wins.
pub fn find_package_files(tree: &RepositoryTree, package: &str) -> PackageFiles {
    let prefix = format!("{package}/");
    let mut files = PackageFiles::default();

    for entry in tree.tree.iter().filter(|e| e.is_file()) {
        if !entry.path.starts_with(&prefix) {
            continue;
        }

        let Some(slot) = files.slot(entry.basename()) else {
            continue;
        };

        let shallower = match slot.as_deref() {
            Some(existing) => entry.depth() < existing.split('/').count(),
            None => true,
        };
        if shallower {
            *slot = Some(entry.path.clone());
        }
    }

    files
}
