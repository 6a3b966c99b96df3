use crate::google::credentials::ServiceAccountCredential;
use crate::pipeline::indexing::{RequestStatus, RequestType};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Stored Search Console connection for one project.
#[derive(Debug, Clone)]
pub struct ConnectionRow {
    pub id: i64,
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    pub site_url: String,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl ConnectionRow {
    pub fn credential(&self) -> ServiceAccountCredential {
        ServiceAccountCredential {
            client_email: self.client_email.clone(),
            private_key: self.private_key.clone(),
            site_url: self.site_url.clone(),
        }
    }
}

/// Stored metric row, flattened from the in-memory sum-typed key.
#[derive(Debug, Clone)]
pub struct MetricRowRecord {
    pub id: i64,
    pub project_id: String,
    pub dimension: String,
    pub key_value: String,
    pub metric_date: Option<String>,
    pub clicks: i64,
    pub impressions: i64,
    pub ctr: f64,
    pub position: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexingRequestRow {
    pub id: i64,
    pub project_id: String,
    pub url: String,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub response_code: Option<i64>,
    pub response_message: Option<String>,
    pub retries: i64,
    pub fail_reason: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageRow {
    pub url: String,
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

/// Canonical timestamp encoding: RFC 3339, UTC, second precision, `Z`
/// suffix. Constant width keeps lexicographic order chronological.
pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_encoding_round_trips_and_sorts() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::hours(24);
        let (a, b) = (fmt_ts(earlier), fmt_ts(later));
        assert!(a < b);
        assert_eq!(parse_ts(&a).unwrap().timestamp(), earlier.timestamp());
    }
}
