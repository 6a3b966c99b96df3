pub mod api;
pub mod credentials;
pub mod loader;
pub mod token;

use crate::config::CONFIG;
use std::time::Duration;

/// Build the shared outbound HTTP client: short connect timeout, bounded
/// request timeout, optional proxy from config.
pub fn http_client() -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .user_agent("gsc-relay/0.2")
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30));
    if let Some(proxy_url) = CONFIG.proxy.clone() {
        let proxy =
            reqwest::Proxy::all(proxy_url.as_str()).expect("invalid PROXY url for reqwest client");
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .expect("FATAL: initialize relay HTTP client failed")
}
