//! HTTP clients for the remote metadata sources.
//!
//! One [`Fetcher`] wraps a shared `reqwest` client and knows how to talk to:
//! - the package registry (one document per package),
//! - the forge API (repository metadata and language breakdown),
//! - the download-statistics service (daily counts over a date range).
//!
//! Every lookup returns `Result`; deciding what a failure means for a
//! component is left to the caller.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use partscatalog_shared::{AppConfig, CatalogError, ForgeCredentials, RegistryPackage, Result};

/// User-Agent sent with every request (the forge API rejects requests without one).
const USER_AGENT: &str = concat!("partscatalog/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// FetcherConfig
// ---------------------------------------------------------------------------

/// Endpoints and credentials used by a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub registry_url: Url,
    pub forge_url: Url,
    pub stats_url: Url,
    /// Basic-auth credentials for the forge; `None` means unauthenticated.
    pub credentials: Option<ForgeCredentials>,
    pub timeout_secs: u64,
}

impl FetcherConfig {
    /// Build from the application config and already-resolved credentials.
    pub fn from_app_config(config: &AppConfig, credentials: Option<ForgeCredentials>) -> Self {
        Self {
            registry_url: config.endpoints.registry.clone(),
            forge_url: config.endpoints.forge.clone(),
            stats_url: config.endpoints.stats.clone(),
            credentials,
            timeout_secs: config.fetch.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// The part of a forge repository document the catalog uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoMetadata {
    #[serde(default)]
    pub stargazers_count: Option<u64>,
}

/// Language name to byte count, as reported by the forge.
pub type LanguageBreakdown = HashMap<String, u64>;

#[derive(Debug, Deserialize)]
struct DownloadRange {
    #[serde(default)]
    downloads: Vec<DailyDownloads>,
}

#[derive(Debug, Deserialize)]
struct DailyDownloads {
    #[serde(default)]
    downloads: u64,
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Client for the registry, forge and statistics sources.
#[derive(Debug, Clone)]
pub struct Fetcher {
    config: FetcherConfig,
    client: Client,
}

impl Fetcher {
    /// Create a fetcher with a shared HTTP client.
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Fetch the registry document of a package.
    #[instrument(skip(self))]
    pub async fn registry_package(&self, name: &str) -> Result<RegistryPackage> {
        let url = registry_package_url(&self.config.registry_url, name);
        self.get_json(&url, false).await
    }

    /// Fetch forge metadata of an `owner/project` repository.
    #[instrument(skip(self))]
    pub async fn repository(&self, repo: &str) -> Result<RepoMetadata> {
        let url = format!("{}{repo}", self.config.forge_url);
        self.get_json(&url, true).await
    }

    /// Fetch the language breakdown of an `owner/project` repository.
    #[instrument(skip(self))]
    pub async fn languages(&self, repo: &str) -> Result<LanguageBreakdown> {
        let url = format!("{}{repo}/languages", self.config.forge_url);
        self.get_json(&url, true).await
    }

    /// Total downloads of a package between `start` and `end` (inclusive).
    #[instrument(skip(self))]
    pub async fn downloads(&self, name: &str, start: NaiveDate, end: NaiveDate) -> Result<u64> {
        let url = format!(
            "{}{}:{}/{name}",
            self.config.stats_url,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        );
        let range: DownloadRange = self.get_json(&url, false).await?;
        Ok(range.downloads.iter().map(|d| d.downloads).sum())
    }

    /// GET `url` and decode the JSON body. Forge requests carry credentials.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, forge: bool) -> Result<T> {
        debug!(%url, "requesting");

        let mut request = self.client.get(url);
        if let (true, Some(creds)) = (forge, &self.config.credentials) {
            request = request.basic_auth(&creds.username, Some(&creds.token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| CatalogError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::Network(format!("{url}: body read failed: {e}")))?;

        serde_json::from_str(&body).map_err(|e| CatalogError::parse(format!("{url}: {e}")))
    }
}

/// Registry URL of a package. The `/` of scoped names is escaped.
pub fn registry_package_url(base: &Url, name: &str) -> String {
    format!("{base}{}", name.replace('/', "%2F"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn base(server: &MockServer) -> Url {
        Url::parse(&format!("{}/", server.uri())).unwrap()
    }

    fn fetcher(server: &MockServer, credentials: Option<ForgeCredentials>) -> Fetcher {
        Fetcher::new(FetcherConfig {
            registry_url: base(server),
            forge_url: base(server).join("repos/").unwrap(),
            stats_url: base(server).join("downloads/range/").unwrap(),
            credentials,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn scoped_names_are_escaped() {
        let base = Url::parse("https://registry.npmjs.com/").unwrap();
        assert_eq!(
            registry_package_url(&base, "@acme/button"),
            "https://registry.npmjs.com/@acme%2Fbutton"
        );
        assert_eq!(
            registry_package_url(&base, "react-button"),
            "https://registry.npmjs.com/react-button"
        );
    }

    #[tokio::test]
    async fn fetches_registry_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/react-button"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "react-button",
                "description": "A button",
                "dist-tags": {"latest": "1.0.0"},
                "time": {"created": "2015-01-01T00:00:00.000Z", "modified": "2016-01-01T00:00:00.000Z"}
            })))
            .mount(&server)
            .await;

        let pkg = fetcher(&server, None)
            .registry_package("react-button")
            .await
            .unwrap();
        assert_eq!(pkg.description.as_deref(), Some("A button"));
        assert_eq!(pkg.latest_version(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn forge_requests_send_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/button"))
            .and(header_exists("authorization"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"stargazers_count": 42})),
            )
            .mount(&server)
            .await;

        let creds = ForgeCredentials {
            username: "octocat".into(),
            token: "token".into(),
        };
        let repo = fetcher(&server, Some(creds))
            .repository("acme/button")
            .await
            .unwrap();
        assert_eq!(repo.stargazers_count, Some(42));
    }

    #[tokio::test]
    async fn missing_star_count_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/button"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let repo = fetcher(&server, None).repository("acme/button").await.unwrap();
        assert!(repo.stargazers_count.is_none());
    }

    #[tokio::test]
    async fn fetches_languages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/camera/languages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Java": 1200,
                "Objective-C": 800
            })))
            .mount(&server)
            .await;

        let languages = fetcher(&server, None).languages("acme/camera").await.unwrap();
        assert_eq!(languages.get("Java"), Some(&1200));
        assert!(languages.contains_key("Objective-C"));
    }

    #[tokio::test]
    async fn sums_daily_downloads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/downloads/range/2015-01-01:2016-01-01/react-button"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "downloads": [
                    {"date": "2015-12-30", "downloads": 5},
                    {"date": "2015-12-31", "downloads": 7}
                ]
            })))
            .mount(&server)
            .await;

        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let total = fetcher(&server, None)
            .downloads("react-button", start, end)
            .await
            .unwrap();
        assert_eq!(total, 12);
    }

    #[tokio::test]
    async fn http_error_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher(&server, None)
            .registry_package("missing")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Network(ref msg) if msg.contains("404")));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/camera/languages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = fetcher(&server, None)
            .languages("acme/camera")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }
}
