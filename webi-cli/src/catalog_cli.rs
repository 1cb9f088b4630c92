//! Catalog subcommands
//!
//! Each command runs one catalog query and renders it either as a table
//! or, with `--json`, as a response envelope.

use anyhow::{anyhow, Result};
use clap::Subcommand;
use serde::Serialize;
use std::fmt::Display;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use webi_core::catalog::{Category, PackageQuery, Platform};
use webi_core::{PackageCatalogService, PackageRecord};

use crate::envelope;

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List packages, optionally filtered
    List {
        /// Free-text filter over name, title, tagline, description and category
        #[clap(long, short)]
        query: Option<String>,

        /// Only packages in this category (e.g. "CLI Utilities")
        #[clap(long)]
        category: Option<Category>,

        /// Only packages installable on this platform (linux, macos, windows)
        #[clap(long)]
        platform: Option<Platform>,

        /// Rebuild the catalog instead of using the cache
        #[clap(long)]
        refresh: bool,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Search packages by text
    Search {
        /// Search query (case-insensitive substring)
        query: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show details of one package
    Show {
        /// Package name, e.g. `node`
        name: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// List the categories present in the catalog
    Categories {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show catalog statistics
    Stats {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show metadata of the source repository
    Repo {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },
}

impl CatalogCommand {
    pub async fn execute(self, service: &PackageCatalogService) -> Result<()> {
        match self {
            CatalogCommand::List {
                query,
                category,
                platform,
                refresh,
                json,
            } => {
                let query = PackageQuery {
                    text: query,
                    category,
                    platform,
                };
                execute_list(service, &query, refresh, json).await
            }
            CatalogCommand::Search { query, json } => {
                let result = service.search_packages(&query).await;
                render_packages(result, json)
            }
            CatalogCommand::Show { name, json } => execute_show(service, &name, json).await,
            CatalogCommand::Categories { json } => execute_categories(service, json).await,
            CatalogCommand::Stats { json } => execute_stats(service, json).await,
            CatalogCommand::Repo { json } => execute_repo(service, json).await,
        }
    }
}

/// Table row for package listings
#[derive(Tabled)]
struct PackageRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Platforms")]
    platforms: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&PackageRecord> for PackageRow {
    fn from(package: &PackageRecord) -> Self {
        Self {
            name: package.name.clone(),
            category: package.category.to_string(),
            platforms: platforms_display(package),
            description: truncate(&package.description, 50),
        }
    }
}

fn platforms_display(package: &PackageRecord) -> String {
    package
        .platforms
        .list()
        .iter()
        .map(Platform::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shorten to `max` characters, ending in `...` when cut
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn print_table<R: Tabled>(rows: &[R]) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
}

/// On failure in JSON mode, print the failure envelope and exit non-zero
fn fail_json(error: &str, message: impl Display) -> Result<()> {
    envelope::print(&envelope::failure(error, message.to_string()))?;
    std::process::exit(1);
}

async fn execute_list(
    service: &PackageCatalogService,
    query: &PackageQuery,
    force_refresh: bool,
    json_output: bool,
) -> Result<()> {
    if force_refresh {
        if !json_output {
            println!("Fetching package catalog (refreshing cache)...");
        }
        if let Err(e) = service.get_all_packages(true).await {
            return render_packages(Err(e), json_output);
        }
    }

    let result = service.query(query).await;
    render_packages(result, json_output)
}

fn render_packages<E: Display>(
    result: Result<Vec<PackageRecord>, E>,
    json_output: bool,
) -> Result<()> {
    let packages = match result {
        Ok(packages) => packages,
        Err(e) if json_output => return fail_json("Failed to fetch packages", e),
        Err(e) => return Err(anyhow!("Failed to fetch packages: {e}")),
    };

    if json_output {
        let count = packages.len();
        return envelope::print(&envelope::success(packages, Some(count)));
    }

    if packages.is_empty() {
        println!("No packages found.");
        return Ok(());
    }

    println!("Found {} package(s):\n", packages.len());
    let rows: Vec<PackageRow> = packages.iter().map(PackageRow::from).collect();
    print_table(&rows);
    Ok(())
}

async fn execute_show(
    service: &PackageCatalogService,
    name: &str,
    json_output: bool,
) -> Result<()> {
    let package = match service.get_package(name).await {
        Ok(package) => package,
        Err(e) if json_output => return fail_json("Failed to fetch package", e),
        Err(e) => return Err(anyhow!("Failed to fetch package: {e}")),
    };

    let Some(package) = package else {
        if json_output {
            return fail_json("Package not found", format!("No package named '{name}'"));
        }
        return Err(anyhow!("Package '{name}' not found in catalog"));
    };

    if json_output {
        return envelope::print(&envelope::success(&package, None));
    }

    println!();
    println!("Package:     {}", package.name);
    println!("Title:       {}", package.title);
    println!("Category:    {}", package.category);
    println!("Platforms:   {}", platforms_display(&package));
    if let Some(version) = &package.version {
        println!("Version:     {version}");
    }
    println!("Homepage:    {}", package.homepage);
    println!();
    println!("{}", package.tagline);
    if package.description != package.tagline {
        println!();
        println!("{}", package.description);
    }
    println!();
    println!("Install:");
    println!("  {}", package.install_command.curl);
    println!("  {}", package.install_command.wget);
    if package.platforms.windows {
        println!("  {}", package.install_command.powershell);
    }

    Ok(())
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Packages")]
    packages: usize,
}

async fn execute_categories(service: &PackageCatalogService, json_output: bool) -> Result<()> {
    let categories = match service.get_categories().await {
        Ok(categories) => categories,
        Err(e) if json_output => return fail_json("Failed to fetch categories", e),
        Err(e) => return Err(anyhow!("Failed to fetch categories: {e}")),
    };

    if json_output {
        let count = categories.len();
        return envelope::print(&envelope::success(categories, Some(count)));
    }

    let mut rows = Vec::with_capacity(categories.len());
    for category in categories {
        let packages = service
            .get_packages_by_category(category)
            .await
            .map_err(|e| anyhow!("Failed to fetch categories: {e}"))?;
        rows.push(CategoryRow {
            category: category.to_string(),
            packages: packages.len(),
        });
    }
    print_table(&rows);
    Ok(())
}

async fn execute_stats(service: &PackageCatalogService, json_output: bool) -> Result<()> {
    let stats = match service.get_stats().await {
        Ok(stats) => stats,
        Err(e) if json_output => return fail_json("Failed to fetch statistics", e),
        Err(e) => return Err(anyhow!("Failed to fetch statistics: {e}")),
    };

    if json_output {
        return envelope::print(&envelope::success(stats, None));
    }

    println!("Packages:    {}", stats.total_packages);
    println!("Categories:  {}", stats.categories_count);
    println!("Linux:       {}", stats.platform_counts.linux);
    println!("macOS:       {}", stats.platform_counts.macos);
    println!("Windows:     {}", stats.platform_counts.windows);
    Ok(())
}

/// Repository summary for JSON output
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RepositorySummary<'a> {
    full_name: &'a str,
    description: Option<&'a str>,
    html_url: &'a str,
    default_branch: &'a str,
    stars: u64,
    forks: u64,
}

async fn execute_repo(service: &PackageCatalogService, json_output: bool) -> Result<()> {
    let info = match service.repository_info().await {
        Ok(info) => info,
        Err(e) if json_output => return fail_json("Failed to fetch repository metadata", e),
        Err(e) => return Err(anyhow!("Failed to fetch repository metadata: {e}")),
    };

    if json_output {
        let summary = RepositorySummary {
            full_name: &info.full_name,
            description: info.description.as_deref(),
            html_url: &info.html_url,
            default_branch: &info.default_branch,
            stars: info.stargazers_count,
            forks: info.forks_count,
        };
        return envelope::print(&envelope::success(summary, None));
    }

    println!("Repository:  {}", info.full_name);
    if let Some(description) = &info.description {
        println!("About:       {description}");
    }
    println!("URL:         {}", info.html_url);
    println!("Branch:      {}", info.default_branch);
    println!("Stars:       {}", info.stargazers_count);
    println!("Forks:       {}", info.forks_count);
    Ok(())
}
