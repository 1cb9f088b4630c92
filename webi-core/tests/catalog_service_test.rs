//! End-to-end tests for PackageCatalogService over a scripted GitHub API

mod common;

use common::{
    readme_url, service, service_with_config, tree_url, FakeGitHub, WarningCounter, API,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use webi_core::catalog::{Category, PackageQuery, Platform};
use webi_core::{CatalogConfig, CatalogError};

const NODE: &str = "---\ntitle: Node.js\nhomepage: https://nodejs.org\n---\n\n# Node.js\n\nJavaScript runtime built on V8.\n";
const JQ: &str = "---\ntitle: jq\ntagline: Lightweight JSON processor\n---\n\nA command-line JSON processor.\n";
const DOCKER: &str = "---\ntitle: Docker\n---\n\nBuild and run containers.\n";
const GIT: &str = "---\ntitle: Git\n---\n\nDistributed version control.\n";
const RIPGREP: &str = "---\ntitle: ripgrep\nlinux: false\n---\n\nFast recursive grep.\n";

/// node, jq, docker, git and rg; node and git ship install.ps1
fn fixture() -> Arc<FakeGitHub> {
    common::init_test_logging();

    let github = FakeGitHub::new();
    github.serve_tree(&["node", "jq", "docker", "git", "rg"], &["node", "git"]);
    github.serve_readme("node", NODE);
    github.serve_readme("jq", JQ);
    github.serve_readme("docker", DOCKER);
    github.serve_readme("git", GIT);
    github.serve_readme("rg", RIPGREP);
    github
}

fn names(packages: &[webi_core::PackageRecord]) -> Vec<&str> {
    packages.iter().map(|p| p.name.as_str()).collect()
}

#[tokio::test]
async fn test_catalog_is_cached() {
    let github = fixture();
    let service = service(&github);

    let first = service.get_all_packages(false).await.unwrap();
    let second = service.get_all_packages(false).await.unwrap();

    assert_eq!(names(&first), vec!["docker", "git", "jq", "node", "rg"]);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(github.count(&tree_url()), 1);
    assert_eq!(github.count(&readme_url("node")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_loads_share_one_fetch() {
    let github = fixture();
    github.set_latency(Duration::from_millis(50));
    let service = service(&github);
    let other = service.clone();

    let (a, b) = tokio::join!(service.get_all_packages(false), other.get_all_packages(false));

    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    assert_eq!(github.count(&tree_url()), 1);
    assert_eq!(github.count(&readme_url("docker")), 1);
}

#[tokio::test]
async fn test_failed_package_is_skipped() {
    let github = fixture();
    github.fail(&readme_url("jq"), 500);
    let service = service(&github);

    let packages = service.get_all_packages(false).await.unwrap();

    assert_eq!(names(&packages), vec!["docker", "git", "node", "rg"]);
}

#[tokio::test]
async fn test_failed_package_logs_one_warning() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let github = fixture();
    github.fail(&readme_url("jq"), 500);
    let service = service(&github);

    let warnings = WarningCounter::default();
    let _guard = tracing_subscriber::registry()
        .with(warnings.clone())
        .set_default();

    let packages = service.get_all_packages(false).await.unwrap();

    assert_eq!(packages.len(), 4);
    assert_eq!(warnings.count(), 1);
}

#[tokio::test]
async fn test_package_without_readme_is_skipped() {
    let github = fixture();
    github.respond(
        &tree_url(),
        200,
        r#"{"sha": "main", "tree": [
            {"path": "node", "type": "tree", "sha": "1"},
            {"path": "node/README.md", "type": "blob", "sha": "2"},
            {"path": "node/install.sh", "type": "blob", "sha": "3"},
            {"path": "empty", "type": "tree", "sha": "4"},
            {"path": "empty/install.sh", "type": "blob", "sha": "5"}
        ]}"#,
    );
    let service = service(&github);

    let packages = service.get_all_packages(false).await.unwrap();

    assert_eq!(names(&packages), vec!["node"]);
    assert_eq!(github.count(&readme_url("empty")), 0);
}

#[tokio::test]
async fn test_excluded_and_unsupported_packages_are_dropped() {
    let github = fixture();
    github.serve_readme("vim-example", "An example.\n");
    github.serve_readme("docs-only", "Nothing to install.\n");
    github.respond(
        &tree_url(),
        200,
        r#"{"sha": "main", "tree": [
            {"path": "node", "type": "tree", "sha": "1"},
            {"path": "node/README.md", "type": "blob", "sha": "2"},
            {"path": "node/install.sh", "type": "blob", "sha": "3"},
            {"path": "vim-example", "type": "tree", "sha": "4"},
            {"path": "vim-example/README.md", "type": "blob", "sha": "5"},
            {"path": "vim-example/install.sh", "type": "blob", "sha": "6"},
            {"path": "docs-only", "type": "tree", "sha": "7"},
            {"path": "docs-only/README.md", "type": "blob", "sha": "8"}
        ]}"#,
    );
    let service = service(&github);

    let packages = service.get_all_packages(false).await.unwrap();

    assert_eq!(names(&packages), vec!["node"]);
}

#[tokio::test]
async fn test_stats() {
    let github = fixture();
    let service = service(&github);

    let stats = service.get_stats().await.unwrap();

    assert_eq!(stats.total_packages, 5);
    // node, jq + rg, docker, git
    assert_eq!(stats.categories_count, 4);
    assert_eq!(stats.platform_counts.linux, 4);
    assert_eq!(stats.platform_counts.macos, 5);
    assert_eq!(stats.platform_counts.windows, 2);
}

#[tokio::test]
async fn test_search() {
    let github = fixture();
    let service = service(&github);

    let found = service.search_packages("doc").await.unwrap();
    assert_eq!(names(&found), vec!["docker"]);

    let found = service.search_packages("JSON").await.unwrap();
    assert_eq!(names(&found), vec!["jq"]);

    let everything = service.search_packages("  ").await.unwrap();
    assert_eq!(everything.len(), 5);

    assert!(service.search_packages("zzz").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_filters_and_lookup() {
    let github = fixture();
    let service = service(&github);

    let containers = service
        .get_packages_by_category(Category::Containers)
        .await
        .unwrap();
    assert_eq!(names(&containers), vec!["docker"]);

    let windows = service
        .get_packages_by_platform(Platform::Windows)
        .await
        .unwrap();
    assert_eq!(names(&windows), vec!["git", "node"]);

    let linux = service.get_packages_by_platform(Platform::Linux).await.unwrap();
    assert!(!names(&linux).contains(&"rg"));

    let cli_on_windows = service
        .query(&PackageQuery {
            category: Some(Category::CliUtilities),
            platform: Some(Platform::Windows),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(cli_on_windows.is_empty());

    let jq = service.get_package("jq").await.unwrap().unwrap();
    assert_eq!(jq.tagline, "Lightweight JSON processor");
    assert_eq!(jq.install_command.curl, "curl -sS https://webinstall.dev/jq | bash");
    assert!(service.get_package("nope").await.unwrap().is_none());

    let categories = service.get_categories().await.unwrap();
    assert_eq!(
        categories,
        vec![
            Category::CliUtilities,
            Category::Containers,
            Category::JavaScriptRuntime,
            Category::VersionControl,
        ]
    );

    assert_eq!(github.count(&tree_url()), 1);
}

#[tokio::test]
async fn test_first_load_failure_is_an_error() {
    let github = FakeGitHub::new();
    github.fail(&tree_url(), 500);
    let service = service(&github);

    let err = service.get_all_packages(false).await.unwrap_err();

    assert!(matches!(err, CatalogError::TreeUnavailable(_)));
    assert!(!err.is_rate_limited());
}

#[tokio::test]
async fn test_rate_limit_is_reported() {
    let github = FakeGitHub::new();
    github.respond_with_headers(
        &tree_url(),
        403,
        r#"{"message": "API rate limit exceeded"}"#,
        &[("x-ratelimit-limit", "60"), ("x-ratelimit-remaining", "0")],
    );
    let service = service(&github);

    let err = service.get_all_packages(false).await.unwrap_err();

    assert!(err.is_rate_limited());
    assert!(err.to_string().contains("GITHUB_TOKEN"));
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_catalog() {
    let github = fixture();
    let service = service(&github);
    let before = service.get_all_packages(false).await.unwrap();

    github.fail(&tree_url(), 502);
    let after = service.get_all_packages(true).await.unwrap();

    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(github.count(&tree_url()), 2);
}

#[tokio::test(start_paused = true)]
async fn test_expired_catalog_rebuilds_from_stale_tree() {
    let github = fixture();
    let service = service(&github);
    service.get_all_packages(false).await.unwrap();

    github.fail(&tree_url(), 500);
    tokio::time::advance(Duration::from_secs(25 * 60 * 60)).await;

    let packages = service.get_all_packages(false).await.unwrap();

    assert_eq!(packages.len(), 5);
    assert_eq!(github.count(&tree_url()), 2);
}

#[tokio::test(start_paused = true)]
async fn test_catalog_expires_despite_regular_reads() {
    let github = fixture();
    let service = service(&github);
    let first = service.get_all_packages(false).await.unwrap();

    let mut latest = Arc::clone(&first);
    for _ in 0..3 {
        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        latest = service.get_all_packages(false).await.unwrap();
    }

    // Rebuilt after 30 minutes; the tree is still within its own TTL
    assert!(!Arc::ptr_eq(&first, &latest));
    assert_eq!(github.count(&tree_url()), 1);
}

#[tokio::test(start_paused = true)]
async fn test_upstream_changes_appear_after_tree_ttl() {
    let github = fixture();
    let service = service(&github);
    assert_eq!(service.get_all_packages(false).await.unwrap().len(), 5);

    github.serve_tree(&["node", "jq", "docker", "git", "rg", "zig"], &["node", "git"]);
    github.serve_readme("zig", "A systems language.\n");
    github.serve_readme("node", "Updated description.\n");

    // A read every 20 minutes for 25 hours
    let mut packages = service.get_all_packages(false).await.unwrap();
    for _ in 0..75 {
        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        packages = service.get_all_packages(false).await.unwrap();
    }

    assert_eq!(packages.len(), 6);
    let node = packages.iter().find(|p| p.name == "node").unwrap();
    assert_eq!(node.description, "Updated description.");
    assert_eq!(github.count(&tree_url()), 2);
}

#[tokio::test]
async fn test_force_refresh_relists_tree() {
    let github = fixture();
    let service = service(&github);
    assert_eq!(service.get_all_packages(false).await.unwrap().len(), 5);

    github.serve_tree(&["node", "jq", "docker", "git", "rg", "zig"], &["node", "git"]);
    github.serve_readme("zig", "A systems language.\n");

    assert_eq!(service.get_all_packages(false).await.unwrap().len(), 5);
    assert_eq!(service.get_all_packages(true).await.unwrap().len(), 6);

    assert_eq!(github.count(&tree_url()), 2);
    // README bodies are still cached
    assert_eq!(github.count(&readme_url("node")), 1);
}

#[tokio::test]
async fn test_clear_cache() {
    let github = fixture();
    let service = service(&github);
    service.get_all_packages(false).await.unwrap();

    service.clear_cache();
    service.get_all_packages(false).await.unwrap();

    assert_eq!(github.count(&tree_url()), 2);
    assert_eq!(github.count(&readme_url("node")), 2);
}

#[tokio::test(start_paused = true)]
async fn test_batches_are_spaced() {
    let github = fixture();
    let config = CatalogConfig {
        batch_size: 2,
        batch_delay_ms: 100,
        ..Default::default()
    };
    let service = service_with_config(&github, &config);

    let start = tokio::time::Instant::now();
    let packages = service.get_all_packages(false).await.unwrap();

    assert_eq!(packages.len(), 5);
    // Three batches, two pauses between them
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(300), "{elapsed:?}");
}

#[tokio::test]
async fn test_repository_info() {
    let github = fixture();
    github.respond(
        API,
        200,
        r#"{"full_name": "webinstall/webi-installers", "stargazers_count": 2100}"#,
    );
    let service = service(&github);

    let info = service.repository_info().await.unwrap();
    assert_eq!(info.stargazers_count, 2100);

    service.repository_info().await.unwrap();
    assert_eq!(github.count(API), 1);
}
