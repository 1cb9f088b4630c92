//! Package catalog service
//!
//! Lifecycle of the assembled catalog:
//!
//! ```text
//! Empty ──get_all_packages──▶ Populating ──ok──▶ Populated
//!                                 ▲                  │
//!                                 └── TTL expiry / force_refresh
//! ```
//!
//! At most one population pipeline runs at a time; concurrent callers
//! await the same one.

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::index::{extract_package_directories, find_package_files};
use super::package::{Category, CatalogStats, PackageRecord, Platform, PlatformCounts};
use super::parser::{is_valid_package, PackageParser, ReadmeContent};
use crate::cache::{InFlight, TtlCache};
use crate::config::{CacheClass, CatalogConfig};
use crate::error::CatalogError;
use crate::github::{GitHubClient, RepositoryInfo, RepositoryTree};

/// A shared, immutable snapshot of the catalog
pub type Catalog = Arc<Vec<PackageRecord>>;

const CATALOG_KEY: &str = "packages";

/// Combined filter over the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageQuery {
    /// Case-insensitive substring over name, title, tagline, description, category
    pub text: Option<String>,
    pub category: Option<Category>,
    pub platform: Option<Platform>,
}

impl PackageQuery {
    pub fn matches(&self, package: &PackageRecord) -> bool {
        let text_ok = match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => matches_text(package, &text.to_lowercase()),
            _ => true,
        };

        text_ok
            && self.category.map_or(true, |c| package.category == c)
            && self.platform.map_or(true, |p| package.platforms.supports(p))
    }
}

/// `needle` must already be lower-cased
fn matches_text(package: &PackageRecord, needle: &str) -> bool {
    [
        package.name.as_str(),
        package.title.as_str(),
        package.tagline.as_str(),
        package.description.as_str(),
        package.category.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Builds, caches and queries the package catalog
///
/// Cheap to clone; clones share the client, caches and in-flight fetch.
#[derive(Clone)]
pub struct PackageCatalogService {
    inner: Arc<Inner>,
}

struct Inner {
    client: Arc<GitHubClient>,
    parser: PackageParser,
    batch_size: usize,
    batch_delay: Duration,
    catalog: TtlCache<Catalog>,
    inflight: InFlight<Catalog, CatalogError>,
}

impl PackageCatalogService {
    /// Create a service around an existing client
    pub fn new(config: &CatalogConfig, client: Arc<GitHubClient>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                parser: PackageParser::from_config(config),
                batch_size: config.effective_batch_size(),
                batch_delay: config.batch_delay(),
                catalog: TtlCache::new("catalog", config.cache_options(CacheClass::Catalog)),
                inflight: InFlight::new(),
            }),
        }
    }

    /// Validate `config` and create a service talking to GitHub over HTTP
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        config.validate()?;
        let client = GitHubClient::new(config)
            .map_err(|e| CatalogError::Config(format!("failed to create GitHub client: {e}")))?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn client(&self) -> &GitHubClient {
        &self.inner.client
    }

    /// The whole catalog
    ///
    /// Served from cache unless `force_refresh` is set or the entry expired.
    /// A forced refresh also re-lists the repository tree so added or
    /// removed packages show up; README bodies keep their own cache.
    pub async fn get_all_packages(&self, force_refresh: bool) -> Result<Catalog, CatalogError> {
        if !force_refresh {
            if let Some(catalog) = self.inner.catalog.get(CATALOG_KEY) {
                debug!("Cache hit for {} ({} packages)", CATALOG_KEY, catalog.len());
                return Ok(catalog);
            }
        }

        let inner = Arc::clone(&self.inner);
        self.inner
            .inflight
            .run(CATALOG_KEY, move || async move { inner.populate(force_refresh).await })
            .await
    }

    /// Look up one package by exact name
    pub async fn get_package(&self, name: &str) -> Result<Option<PackageRecord>, CatalogError> {
        let catalog = self.get_all_packages(false).await?;
        Ok(catalog.iter().find(|p| p.name == name).cloned())
    }

    /// Case-insensitive substring search; a blank query returns everything
    pub async fn search_packages(&self, query: &str) -> Result<Vec<PackageRecord>, CatalogError> {
        self.query(&PackageQuery {
            text: Some(query.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn get_packages_by_category(
        &self,
        category: Category,
    ) -> Result<Vec<PackageRecord>, CatalogError> {
        self.query(&PackageQuery {
            category: Some(category),
            ..Default::default()
        })
        .await
    }

    pub async fn get_packages_by_platform(
        &self,
        platform: Platform,
    ) -> Result<Vec<PackageRecord>, CatalogError> {
        self.query(&PackageQuery {
            platform: Some(platform),
            ..Default::default()
        })
        .await
    }

    /// Apply every set filter of `query`
    pub async fn query(&self, query: &PackageQuery) -> Result<Vec<PackageRecord>, CatalogError> {
        let catalog = self.get_all_packages(false).await?;
        Ok(catalog.iter().filter(|p| query.matches(p)).cloned().collect())
    }

    /// Categories present in the catalog, sorted by name
    pub async fn get_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let catalog = self.get_all_packages(false).await?;
        Ok(categories_of(&catalog))
    }

    /// Package, category and per-platform counts
    pub async fn get_stats(&self) -> Result<CatalogStats, CatalogError> {
        let catalog = self.get_all_packages(false).await?;
        Ok(stats_of(&catalog))
    }

    /// Repository metadata for display (star count)
    pub async fn repository_info(&self) -> Result<Arc<RepositoryInfo>, CatalogError> {
        self.inner
            .client
            .get_repository_metadata()
            .await
            .map_err(|e| CatalogError::Repository(Arc::new(e)))
    }

    /// Drop the catalog and every cached GitHub response
    pub fn clear_cache(&self) {
        self.inner.catalog.clear();
        self.inner.client.clear_caches();
        info!("Package catalog cache cleared");
    }
}

impl Inner {
    async fn populate(&self, force_refresh: bool) -> Result<Catalog, CatalogError> {
        // Another caller may have finished populating between our cache
        // check and becoming the leader
        if !force_refresh {
            if let Some(catalog) = self.catalog.get(CATALOG_KEY) {
                return Ok(catalog);
            }
        }

        if force_refresh {
            self.client.invalidate_tree();
        }

        info!("Fetching packages from GitHub API...");

        match self.fetch_packages().await {
            Ok(packages) => {
                let catalog: Catalog = Arc::new(packages);
                self.catalog.set(CATALOG_KEY, Arc::clone(&catalog));
                Ok(catalog)
            }
            Err(e) => {
                error!("Failed to fetch packages: {}", e);
                match self.catalog.get_stale(CATALOG_KEY) {
                    Some(previous) => {
                        warn!(
                            "Returning cached catalog ({} packages) due to fetch error",
                            previous.len()
                        );
                        Ok(previous)
                    }
                    None => Err(e),
                }
            }
        }
    }

    async fn fetch_packages(&self) -> Result<Vec<PackageRecord>, CatalogError> {
        let tree = self
            .client
            .get_tree()
            .await
            .map_err(|e| CatalogError::TreeUnavailable(Arc::new(e)))?;

        let directories = extract_package_directories(&tree);
        info!("Found {} potential packages", directories.len());

        let mut packages = Vec::with_capacity(directories.len());
        let batch_count = directories.len().div_ceil(self.batch_size);

        for (index, batch) in directories.chunks(self.batch_size).enumerate() {
            let results = join_all(
                batch
                    .iter()
                    .map(|name| self.fetch_single_package(&tree, name)),
            )
            .await;

            for result in results {
                match result {
                    Ok(Some(package)) => packages.push(package),
                    Ok(None) => {}
                    Err(e) => warn!("{}", e),
                }
            }

            if index + 1 < batch_count {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        let fetched = packages.len();
        packages.retain(is_valid_package);
        info!(
            "Successfully fetched {} valid packages ({} rejected)",
            packages.len(),
            fetched - packages.len()
        );

        Ok(packages)
    }

    /// `Ok(None)` when the directory has no README
    async fn fetch_single_package(
        &self,
        tree: &RepositoryTree,
        name: &str,
    ) -> Result<Option<PackageRecord>, CatalogError> {
        let files = find_package_files(tree, name);

        let Some(readme_path) = files.readme.as_deref() else {
            warn!("Package {} has no README.md, skipping", name);
            return Ok(None);
        };

        let readme = self
            .client
            .get_file_content(readme_path)
            .await
            .map_err(|e| CatalogError::PackageFetch {
                package: name.to_string(),
                source: Arc::new(e),
            })?;

        let text = readme.decoded();

        Ok(Some(self.parser.parse_package(
            name,
            ReadmeContent::Decoded(&text),
            files.has_install_sh(),
            files.has_install_ps1(),
            Some(Utc::now()),
        )))
    }
}

/// Distinct categories, sorted by display name
pub fn categories_of(packages: &[PackageRecord]) -> Vec<Category> {
    let mut categories: Vec<Category> = packages
        .iter()
        .map(|p| p.category)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    categories.sort_by_key(|c| c.as_str());
    categories
}

/// Aggregate counts for a set of packages
pub fn stats_of(packages: &[PackageRecord]) -> CatalogStats {
    let count = |platform: Platform| {
        packages
            .iter()
            .filter(|p| p.platforms.supports(platform))
            .count()
    };

    CatalogStats {
        total_packages: packages.len(),
        categories_count: categories_of(packages).len(),
        platform_counts: PlatformCounts {
            linux: count(Platform::Linux),
            macos: count(Platform::Macos),
            windows: count(Platform::Windows),
        },
    }
}
