//! Batched URL inspection with a 24-hour staleness gate: a URL inspected
//! within the window is never re-inspected, whatever surface asked for it.

use crate::config::CONFIG;
use crate::db::Storage;
use crate::error::RelayError;
use crate::pipeline::pacer::Pacer;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Nested provider response, as returned by `urlInspection/index:inspect`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionEnvelope {
    pub inspection_result: InspectionResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionResult {
    pub index_status_result: IndexStatusResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatusResult {
    pub verdict: Option<String>,
    pub coverage_state: Option<String>,
    pub indexing_state: Option<String>,
    pub robots_txt_state: Option<String>,
    pub page_fetch_state: Option<String>,
    pub crawled_as: Option<String>,
    pub last_crawl_time: Option<String>,
    #[serde(default)]
    pub referring_urls: Vec<String>,
    /// The provider reports the containing sitemaps as an array.
    #[serde(default)]
    pub sitemap: Vec<String>,
}

/// Flat record persisted per `(project, url)`.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageRecord {
    pub verdict: Option<String>,
    pub coverage_state: Option<String>,
    pub indexing_state: Option<String>,
    pub robotstxt_state: Option<String>,
    pub page_fetch_state: Option<String>,
    pub crawled_as: Option<String>,
    pub last_crawl_time: Option<String>,
    pub referring_urls: Vec<String>,
    pub sitemap: Option<String>,
    pub inspected_at: DateTime<Utc>,
}

/// Seam over the inspection endpoint.
pub trait InspectionEndpoint {
    async fn inspect(&self, url: &str) -> Result<IndexStatusResult, RelayError>;
}

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub inspected: usize,
    /// Requested URLs excluded by the staleness gate or absent from the
    /// inventory.
    pub skipped: usize,
    pub failed: usize,
}

pub(crate) fn flatten(result: IndexStatusResult, inspected_at: DateTime<Utc>) -> CoverageRecord {
    CoverageRecord {
        verdict: result.verdict,
        coverage_state: result.coverage_state,
        indexing_state: result.indexing_state,
        robotstxt_state: result.robots_txt_state,
        page_fetch_state: result.page_fetch_state,
        crawled_as: result.crawled_as,
        last_crawl_time: result.last_crawl_time,
        referring_urls: result.referring_urls,
        sitemap: result.sitemap.into_iter().next(),
        inspected_at,
    }
}

/// Inspect up to the configured batch of stale inventory URLs. An explicit
/// `requested` list narrows the candidate set but never bypasses the gate or
/// the cap. If everything is fresh, this is zero work, not an error.
pub async fn inspect_batch<E: InspectionEndpoint>(
    storage: &Storage,
    api: &E,
    pacer: &Pacer,
    project: &str,
    requested: &[String],
    now: DateTime<Utc>,
) -> Result<InspectReport, RelayError> {
    let cutoff = now - Duration::hours(CONFIG.inspect_staleness_hours);
    let mut candidates = storage.stale_inventory_urls(project, cutoff).await?;

    let mut skipped = 0;
    if !requested.is_empty() {
        let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
        candidates.retain(|url| wanted.contains(url.as_str()));
        skipped = requested.len().saturating_sub(candidates.len());
    }
    candidates.truncate(CONFIG.inspect_batch_size);

    let mut report = InspectReport {
        inspected: 0,
        skipped,
        failed: 0,
    };

    for url in &candidates {
        pacer.ready().await;
        match api.inspect(url).await {
            Ok(result) => {
                storage
                    .upsert_coverage(project, url, &flatten(result, now))
                    .await?;
                report.inspected += 1;
            }
            Err(e) => {
                warn!(project, url, error = %e, "url inspection failed");
                report.failed += 1;
            }
        }
    }

    info!(
        project,
        inspected = report.inspected,
        skipped = report.skipped,
        failed = report.failed,
        "coverage scan finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration as StdDuration;

    struct CannedInspector {
        responses: Mutex<Vec<Result<IndexStatusResult, RelayError>>>,
        seen: Mutex<Vec<String>>,
    }

    impl CannedInspector {
        fn pass() -> IndexStatusResult {
            IndexStatusResult {
                verdict: Some("PASS".into()),
                coverage_state: Some("Submitted and indexed".into()),
                ..Default::default()
            }
        }

        fn new(responses: Vec<Result<IndexStatusResult, RelayError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl InspectionEndpoint for CannedInspector {
        async fn inspect(&self, url: &str) -> Result<IndexStatusResult, RelayError> {
            self.seen.lock().unwrap().push(url.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(Self::pass())
            } else {
                responses.remove(0)
            }
        }
    }

    fn pacer() -> Pacer {
        Pacer::new(StdDuration::from_millis(1))
    }

    async fn seed_inventory(storage: &Storage, project: &str, urls: &[&str]) {
        for url in urls {
            storage.add_inventory_url(project, url).await.unwrap();
        }
    }

    #[tokio::test]
    async fn never_inspected_urls_are_selected() {
        let storage = Storage::open_in_memory().await;
        seed_inventory(&storage, "p1", &["https://a/", "https://b/"]).await;
        let api = CannedInspector::new(vec![]);

        let report = inspect_batch(&storage, &api, &pacer(), "p1", &[], Utc::now())
            .await
            .unwrap();
        assert_eq!(report.inspected, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(storage.coverage_records("p1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn url_inspected_23_hours_ago_is_excluded_25_hours_included() {
        let storage = Storage::open_in_memory().await;
        seed_inventory(&storage, "p1", &["https://fresh/", "https://stale/"]).await;
        let now = Utc::now();

        let record = flatten(IndexStatusResult::default(), now - Duration::hours(23));
        storage
            .upsert_coverage("p1", "https://fresh/", &record)
            .await
            .unwrap();
        let record = flatten(IndexStatusResult::default(), now - Duration::hours(25));
        storage
            .upsert_coverage("p1", "https://stale/", &record)
            .await
            .unwrap();

        let api = CannedInspector::new(vec![]);
        let report = inspect_batch(&storage, &api, &pacer(), "p1", &[], now)
            .await
            .unwrap();

        assert_eq!(report.inspected, 1);
        assert_eq!(*api.seen.lock().unwrap(), vec!["https://stale/".to_string()]);
    }

    #[tokio::test]
    async fn all_fresh_inventory_reports_zero_work() {
        let storage = Storage::open_in_memory().await;
        seed_inventory(&storage, "p1", &["https://a/"]).await;
        let now = Utc::now();
        let record = flatten(IndexStatusResult::default(), now - Duration::hours(1));
        storage
            .upsert_coverage("p1", "https://a/", &record)
            .await
            .unwrap();

        let api = CannedInspector::new(vec![]);
        let report = inspect_batch(&storage, &api, &pacer(), "p1", &[], now)
            .await
            .unwrap();
        assert_eq!(report.inspected, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn explicit_list_narrows_but_respects_the_gate() {
        let storage = Storage::open_in_memory().await;
        seed_inventory(&storage, "p1", &["https://a/", "https://b/", "https://c/"]).await;
        let now = Utc::now();
        let record = flatten(IndexStatusResult::default(), now - Duration::hours(2));
        storage
            .upsert_coverage("p1", "https://b/", &record)
            .await
            .unwrap();

        let api = CannedInspector::new(vec![]);
        let requested = vec!["https://a/".to_string(), "https://b/".to_string()];
        let report = inspect_batch(&storage, &api, &pacer(), "p1", &requested, now)
            .await
            .unwrap();

        // `b` is fresh, `c` was not requested.
        assert_eq!(report.inspected, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(*api.seen.lock().unwrap(), vec!["https://a/".to_string()]);
    }

    #[tokio::test]
    async fn failing_inspection_is_counted_not_fatal() {
        let storage = Storage::open_in_memory().await;
        seed_inventory(&storage, "p1", &["https://a/", "https://b/"]).await;
        let api = CannedInspector::new(vec![
            Err(RelayError::Provider {
                status: 500,
                body: "internal".into(),
            }),
            Ok(CannedInspector::pass()),
        ]);

        let report = inspect_batch(&storage, &api, &pacer(), "p1", &[], Utc::now())
            .await
            .unwrap();
        assert_eq!(report.inspected, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn repeated_inspection_upserts_a_single_record() {
        let storage = Storage::open_in_memory().await;
        seed_inventory(&storage, "p1", &["https://a/"]).await;
        let api = CannedInspector::new(vec![]);

        let old = Utc::now() - Duration::hours(30);
        inspect_batch(&storage, &api, &pacer(), "p1", &[], old)
            .await
            .unwrap();
        inspect_batch(&storage, &api, &pacer(), "p1", &[], Utc::now())
            .await
            .unwrap();

        assert_eq!(storage.coverage_records("p1").await.unwrap().len(), 1);
    }

    #[test]
    fn nested_envelope_flattens_to_a_record() {
        let payload = serde_json::json!({
            "inspectionResult": {
                "indexStatusResult": {
                    "verdict": "PASS",
                    "coverageState": "Submitted and indexed",
                    "indexingState": "INDEXING_ALLOWED",
                    "robotsTxtState": "ALLOWED",
                    "pageFetchState": "SUCCESSFUL",
                    "crawledAs": "MOBILE",
                    "lastCrawlTime": "2024-05-01T08:00:00Z",
                    "referringUrls": ["https://example.com/"],
                    "sitemap": ["https://example.com/sitemap.xml"]
                }
            }
        });
        let envelope: InspectionEnvelope = serde_json::from_value(payload).unwrap();
        let record = flatten(envelope.inspection_result.index_status_result, Utc::now());
        assert_eq!(record.verdict.as_deref(), Some("PASS"));
        assert_eq!(record.robotstxt_state.as_deref(), Some("ALLOWED"));
        assert_eq!(record.sitemap.as_deref(), Some("https://example.com/sitemap.xml"));
        assert_eq!(record.referring_urls.len(), 1);
    }
}
