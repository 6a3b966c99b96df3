//! Sitemap listing, submission, and deletion against the webmasters API.
//! Batch submission aggregates per-item results exactly like the indexing
//! orchestrator: never abort early, report everything.

use crate::error::RelayError;
use crate::pipeline::pacer::Pacer;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Subset of the provider's sitemap resource worth surfacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub path: String,
    #[serde(default)]
    pub last_submitted: Option<String>,
    #[serde(default)]
    pub last_downloaded: Option<String>,
    #[serde(default)]
    pub is_pending: Option<bool>,
    #[serde(default)]
    pub is_sitemaps_index: Option<bool>,
    #[serde(default)]
    pub warnings: Option<String>,
    #[serde(default)]
    pub errors: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitemapList {
    #[serde(default)]
    pub sitemap: Vec<SitemapEntry>,
}

/// Seam over the per-site sitemap endpoints.
pub trait SitemapEndpoint {
    async fn list(&self) -> Result<Vec<SitemapEntry>, RelayError>;
    async fn submit(&self, feedpath: &str) -> Result<(), RelayError>;
    async fn delete(&self, feedpath: &str) -> Result<(), RelayError>;
}

#[derive(Debug, Serialize)]
pub struct SitemapItemResult {
    pub feedpath: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SitemapBatchReport {
    pub submitted: usize,
    pub failed: usize,
    pub results: Vec<SitemapItemResult>,
}

/// Submit one or many sitemap URLs, one provider call per feedpath.
pub async fn submit_all<E: SitemapEndpoint>(
    api: &E,
    pacer: &Pacer,
    feedpaths: &[String],
) -> SitemapBatchReport {
    let mut report = SitemapBatchReport {
        submitted: 0,
        failed: 0,
        results: Vec::with_capacity(feedpaths.len()),
    };

    for feedpath in feedpaths {
        pacer.ready().await;
        match api.submit(feedpath).await {
            Ok(()) => {
                report.submitted += 1;
                report.results.push(SitemapItemResult {
                    feedpath: feedpath.clone(),
                    ok: true,
                    error: None,
                });
            }
            Err(e) => {
                warn!(feedpath, error = %e, "sitemap submission failed");
                report.failed += 1;
                report.results.push(SitemapItemResult {
                    feedpath: feedpath.clone(),
                    ok: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FlakySubmitter {
        fail_on: usize,
        calls: Mutex<usize>,
    }

    impl SitemapEndpoint for FlakySubmitter {
        async fn list(&self) -> Result<Vec<SitemapEntry>, RelayError> {
            Ok(Vec::new())
        }

        async fn submit(&self, _feedpath: &str) -> Result<(), RelayError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == self.fail_on {
                Err(RelayError::Provider {
                    status: 404,
                    body: "unknown property".into(),
                })
            } else {
                Ok(())
            }
        }

        async fn delete(&self, _feedpath: &str) -> Result<(), RelayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn batch_submit_reports_per_item_and_never_aborts() {
        let api = FlakySubmitter {
            fail_on: 2,
            calls: Mutex::new(0),
        };
        let feedpaths: Vec<String> = (1..=3)
            .map(|i| format!("https://example.com/sitemap-{i}.xml"))
            .collect();

        let report = submit_all(&api, &Pacer::new(Duration::from_millis(1)), &feedpaths).await;

        assert_eq!(report.submitted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.results.len(), 3);
        assert!(!report.results[1].ok);
        assert!(report.results[1].error.as_deref().unwrap().contains("404"));
    }

    #[test]
    fn provider_list_payload_deserializes() {
        let payload = serde_json::json!({
            "sitemap": [{
                "path": "https://example.com/sitemap.xml",
                "lastSubmitted": "2024-04-01T00:00:00.000Z",
                "isPending": false,
                "isSitemapsIndex": true
            }]
        });
        let list: SitemapList = serde_json::from_value(payload).unwrap();
        assert_eq!(list.sitemap.len(), 1);
        assert_eq!(list.sitemap[0].is_sitemaps_index, Some(true));
    }
}
