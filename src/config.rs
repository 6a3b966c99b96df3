use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use url::Url;

/// Runtime configuration, populated from defaults overlaid with `RELAY_*`
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    /// Shared secret required on every inbound route (`RELAY_API_KEY`).
    pub api_key: String,
    pub loglevel: String,
    pub proxy: Option<Url>,
    /// Optional directory of service-account JSON files imported at startup.
    pub cred_path: Option<PathBuf>,
    /// Analytics window, in days back from today.
    pub lookback_days: i64,
    /// Rows requested per analytics page.
    pub row_limit: u32,
    /// Pagination stops once `startRow` reaches this bound.
    pub start_row_cap: u32,
    /// Metric rows written per insert batch.
    pub insert_batch_size: usize,
    /// URLs inspected per coverage scan.
    pub inspect_batch_size: usize,
    /// A URL inspected within this window is not re-inspected.
    pub inspect_staleness_hours: i64,
    /// Upper bound on URLs accepted in one indexing submission.
    pub submit_batch_cap: usize,
    /// Minimum spacing between consecutive provider calls in per-URL loops.
    pub call_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:gsc-relay.sqlite".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            api_key: String::new(),
            loglevel: "info".to_string(),
            proxy: None,
            cred_path: None,
            lookback_days: 480,
            row_limit: 25_000,
            start_row_cap: 75_000,
            insert_batch_size: 500,
            inspect_batch_size: 20,
            inspect_staleness_hours: 24,
            submit_batch_cap: 50,
            call_interval_ms: 200,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("RELAY_"))
            .extract()
    }
}

pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::load().expect("FATAL: invalid RELAY_* configuration"));

pub static GOOGLE_TOKEN_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://oauth2.googleapis.com/token").expect("static URL must parse")
});

/// Base of the webmasters (Search Console) v3 API; per-site resources hang
/// off `sites/{siteUrl}`.
pub static SEARCH_CONSOLE_API: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://www.googleapis.com/webmasters/v3/").expect("static URL must parse")
});

pub static URL_INSPECTION_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://searchconsole.googleapis.com/v1/urlInspection/index:inspect")
        .expect("static URL must parse")
});

pub static INDEXING_PUBLISH_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://indexing.googleapis.com/v3/urlNotifications:publish")
        .expect("static URL must parse")
});

pub const SCOPE_WEBMASTERS_READONLY: &str =
    "https://www.googleapis.com/auth/webmasters.readonly";
pub const SCOPE_WEBMASTERS: &str = "https://www.googleapis.com/auth/webmasters";
pub const SCOPE_INDEXING: &str = "https://www.googleapis.com/auth/indexing";
