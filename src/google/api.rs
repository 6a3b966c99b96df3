//! Stateless callers for the Search Console surface. One instance wraps one
//! bearer token and one site; every non-2xx becomes
//! `RelayError::Provider { status, body }` with the raw body kept for
//! diagnostics.

use crate::config::{INDEXING_PUBLISH_URL, SEARCH_CONSOLE_API, URL_INSPECTION_URL};
use crate::error::RelayError;
use crate::pipeline::analytics::{AnalyticsPage, AnalyticsPages, AnalyticsQuery};
use crate::pipeline::indexing::{IndexingEndpoint, PublishOutcome, RequestType};
use crate::pipeline::inspection::{IndexStatusResult, InspectionEndpoint, InspectionEnvelope};
use crate::pipeline::sitemaps::{SitemapEndpoint, SitemapEntry, SitemapList};
use serde_json::json;
use url::Url;

pub struct SearchConsoleApi {
    client: reqwest::Client,
    token: String,
    site_url: String,
}

impl SearchConsoleApi {
    pub fn new(client: reqwest::Client, token: String, site_url: String) -> Self {
        Self {
            client,
            token,
            site_url,
        }
    }

    /// `sites/{siteUrl}/...` under the webmasters API; the site identifier is
    /// percent-encoded as a single path segment.
    fn site_resource(&self, segments: &[&str]) -> Result<Url, RelayError> {
        let mut url = SEARCH_CONSOLE_API.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RelayError::UpstreamFormat("API base cannot be a base URL".into()))?;
            path.pop_if_empty().push("sites").push(&self.site_url);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn provider_error(resp: reqwest::Response) -> RelayError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        RelayError::Provider { status, body }
    }
}

impl AnalyticsPages for SearchConsoleApi {
    async fn fetch_page(&self, query: &AnalyticsQuery) -> Result<AnalyticsPage, RelayError> {
        let url = self.site_resource(&["searchAnalytics", "query"])?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(query)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::provider_error(resp).await);
        }
        Ok(resp.json().await?)
    }
}

impl IndexingEndpoint for SearchConsoleApi {
    async fn publish(
        &self,
        url: &str,
        request_type: RequestType,
    ) -> Result<PublishOutcome, RelayError> {
        let resp = self
            .client
            .post(INDEXING_PUBLISH_URL.clone())
            .bearer_auth(&self.token)
            .json(&json!({ "url": url, "type": request_type.as_str() }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::provider_error(resp).await);
        }
        let message = resp.text().await.unwrap_or_default();
        Ok(PublishOutcome {
            code: status.as_u16(),
            message,
        })
    }
}

impl InspectionEndpoint for SearchConsoleApi {
    async fn inspect(&self, url: &str) -> Result<IndexStatusResult, RelayError> {
        let resp = self
            .client
            .post(URL_INSPECTION_URL.clone())
            .bearer_auth(&self.token)
            .json(&json!({ "inspectionUrl": url, "siteUrl": self.site_url }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::provider_error(resp).await);
        }
        let envelope: InspectionEnvelope = resp.json().await?;
        Ok(envelope.inspection_result.index_status_result)
    }
}

impl SitemapEndpoint for SearchConsoleApi {
    async fn list(&self) -> Result<Vec<SitemapEntry>, RelayError> {
        let url = self.site_resource(&["sitemaps"])?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::provider_error(resp).await);
        }
        let list: SitemapList = resp.json().await?;
        Ok(list.sitemap)
    }

    async fn submit(&self, feedpath: &str) -> Result<(), RelayError> {
        let url = self.site_resource(&["sitemaps", feedpath])?;
        let resp = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::provider_error(resp).await);
        }
        Ok(())
    }

    async fn delete(&self, feedpath: &str) -> Result<(), RelayError> {
        let url = self.site_resource(&["sitemaps", feedpath])?;
        let resp = self
            .client
            .delete(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::provider_error(resp).await);
        }
        Ok(())
    }
}
