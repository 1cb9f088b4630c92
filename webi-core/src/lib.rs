//! WebInstall catalog library exports
//!
//! Builds a package catalog from the `webi-installers` GitHub repository:
//! the repository tree is indexed into package directories, each README is
//! fetched through a read-through cache and parsed into a [`PackageRecord`],
//! and the assembled catalog is served to callers through
//! [`PackageCatalogService`].
//!
//! [`PackageRecord`]: catalog::PackageRecord
//! [`PackageCatalogService`]: catalog::PackageCatalogService

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod github;

pub use catalog::{PackageCatalogService, PackageRecord};
pub use config::CatalogConfig;
pub use error::CatalogError;
