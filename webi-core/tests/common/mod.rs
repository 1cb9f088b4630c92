//! Shared fixtures for catalog integration tests
//!
//! [`FakeGitHub`] stands in for the REST API: tests register a tree and
//! per-package READMEs, then flip individual URLs to failures.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use webi_core::github::{ApiResponse, GitHubClient, GitHubError, HttpTransport};
use webi_core::{CatalogConfig, PackageCatalogService};

pub const API: &str = "https://api.github.com/repos/webinstall/webi-installers";

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Counts `WARN` events seen by the subscriber it is installed in
#[derive(Clone, Default)]
pub struct WarningCounter(Arc<AtomicUsize>);

impl WarningCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for WarningCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub fn tree_url() -> String {
    format!("{API}/git/trees/main?recursive=1")
}

pub fn readme_url(package: &str) -> String {
    format!("{API}/contents/{package}/README.md")
}

/// Scripted GitHub API
#[derive(Default)]
pub struct FakeGitHub {
    responses: Mutex<HashMap<String, ApiResponse>>,
    requests: Mutex<Vec<String>>,
    latency: Mutex<Option<Duration>>,
}

impl FakeGitHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.respond_with_headers(url, status, body, &[]);
    }

    pub fn respond_with_headers(
        &self,
        url: &str,
        status: u16,
        body: &str,
        headers: &[(&str, &str)],
    ) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            ApiResponse {
                status,
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.to_string(),
            },
        );
    }

    /// Delay every response; pair with a paused clock
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Serve a tree listing one directory per package, each with a README
    /// and an `install.sh`; packages in `with_ps1` also get `install.ps1`
    pub fn serve_tree(&self, packages: &[&str], with_ps1: &[&str]) {
        let mut entries = Vec::new();
        for package in packages {
            entries.push(serde_json::json!({"path": package, "type": "tree", "sha": "d"}));
            entries.push(serde_json::json!({
                "path": format!("{package}/README.md"), "type": "blob", "sha": "r"
            }));
            entries.push(serde_json::json!({
                "path": format!("{package}/install.sh"), "type": "blob", "sha": "s"
            }));
            if with_ps1.contains(package) {
                entries.push(serde_json::json!({
                    "path": format!("{package}/install.ps1"), "type": "blob", "sha": "p"
                }));
            }
        }

        let body = serde_json::json!({"sha": "main", "truncated": false, "tree": entries});
        self.respond(&tree_url(), 200, &body.to_string());
    }

    /// Serve `readme` as the base64 contents of `{package}/README.md`
    pub fn serve_readme(&self, package: &str, readme: &str) {
        let body = serde_json::json!({
            "name": "README.md",
            "path": format!("{package}/README.md"),
            "sha": "r",
            "size": readme.len(),
            "content": BASE64_STANDARD.encode(readme),
            "encoding": "base64",
        });
        self.respond(&readme_url(package), 200, &body.to_string());
    }

    pub fn fail(&self, url: &str, status: u16) {
        self.respond(url, status, r#"{"message": "Server Error"}"#);
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

#[async_trait]
impl HttpTransport for FakeGitHub {
    async fn get(&self, url: &str) -> Result<ApiResponse, GitHubError> {
        self.requests.lock().unwrap().push(url.to_string());

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(ApiResponse {
                status: 404,
                headers: HashMap::new(),
                body: r#"{"message": "Not Found"}"#.to_string(),
            }))
    }

    fn is_authenticated(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// A service over `github` with batching delays switched off
pub fn service(github: &Arc<FakeGitHub>) -> PackageCatalogService {
    let config = CatalogConfig {
        batch_delay_ms: 0,
        ..Default::default()
    };
    service_with_config(github, &config)
}

pub fn service_with_config(
    github: &Arc<FakeGitHub>,
    config: &CatalogConfig,
) -> PackageCatalogService {
    let client = GitHubClient::with_transport(config, github.clone());
    PackageCatalogService::new(config, Arc::new(client))
}
