//! Per-URL indexing request lifecycle: submission, status tracking, explicit
//! retry, and quota-aware error classification.
//!
//! The provider has no batch endpoint, so a batch is one call per URL behind
//! the pacer. A single URL's failure never aborts the batch; partial success
//! is the expected shape and is reported per item.

use crate::db::Storage;
use crate::db::models::IndexingRequestRow;
use crate::error::RelayError;
use crate::pipeline::pacer::Pacer;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    #[serde(rename = "URL_UPDATED")]
    UrlUpdated,
    #[serde(rename = "URL_DELETED")]
    UrlDeleted,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::UrlUpdated => "URL_UPDATED",
            RequestType::UrlDeleted => "URL_DELETED",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        match raw {
            "URL_UPDATED" => Ok(RequestType::UrlUpdated),
            "URL_DELETED" => Ok(RequestType::UrlDeleted),
            other => Err(RelayError::BadRequest(format!(
                "request_type must be URL_UPDATED or URL_DELETED, got `{other}`"
            ))),
        }
    }
}

/// Lifecycle state of one indexing request. Transitions are one-directional
/// except the explicit retry action, which resets a terminal failure to
/// `pending` before re-submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Submitted,
    Failed,
    QuotaExceeded,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Submitted => "submitted",
            RequestStatus::Failed => "failed",
            RequestStatus::QuotaExceeded => "quota_exceeded",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        match raw {
            "pending" => Ok(RequestStatus::Pending),
            "submitted" => Ok(RequestStatus::Submitted),
            "failed" => Ok(RequestStatus::Failed),
            "quota_exceeded" => Ok(RequestStatus::QuotaExceeded),
            other => Err(RelayError::UpstreamFormat(format!(
                "unknown request status `{other}`"
            ))),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, RequestStatus::Failed | RequestStatus::QuotaExceeded)
    }
}

/// Successful (2xx) provider response to one publish call.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub code: u16,
    pub message: String,
}

/// Seam over `urlNotifications:publish` so the state machine is testable
/// without a network.
pub trait IndexingEndpoint {
    async fn publish(
        &self,
        url: &str,
        request_type: RequestType,
    ) -> Result<PublishOutcome, RelayError>;
}

#[derive(Debug, Serialize)]
pub struct ItemResult {
    pub url: String,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub submitted: usize,
    pub failed: usize,
    pub quota_exceeded: usize,
    /// Derived daily count; the provider remains the enforcement authority.
    pub submitted_today: i64,
    pub results: Vec<ItemResult>,
}

/// Decide whether a provider rejection is the daily quota signal. Current
/// Indexing API shape: HTTP 429, or an error body whose `error.status` is
/// `RESOURCE_EXHAUSTED`.
pub(crate) fn classify_submit_error(status: u16, body: &str) -> RequestStatus {
    if status == 429 {
        return RequestStatus::QuotaExceeded;
    }
    if let Ok(value) = serde_json::from_str::<Value>(body)
        && value
            .get("error")
            .and_then(|e| e.get("status"))
            .and_then(|s| s.as_str())
            == Some("RESOURCE_EXHAUSTED")
    {
        return RequestStatus::QuotaExceeded;
    }
    RequestStatus::Failed
}

/// Submit a list of URLs with a shared request type. Creates one `pending`
/// request per URL, drives each to a terminal state, and aggregates counts.
pub async fn submit_batch<E: IndexingEndpoint>(
    storage: &Storage,
    api: &E,
    pacer: &Pacer,
    project: &str,
    urls: &[String],
    request_type: RequestType,
) -> Result<BatchSummary, RelayError> {
    let mut summary = BatchSummary {
        submitted: 0,
        failed: 0,
        quota_exceeded: 0,
        submitted_today: 0,
        results: Vec::with_capacity(urls.len()),
    };

    for url in urls {
        pacer.ready().await;
        let request_id = storage.create_request(project, url, request_type).await?;
        let item = submit_one(storage, api, request_id, project, url, request_type).await?;
        match item.status {
            RequestStatus::Submitted => summary.submitted += 1,
            RequestStatus::QuotaExceeded => summary.quota_exceeded += 1,
            _ => summary.failed += 1,
        }
        summary.results.push(item);
    }

    summary.submitted_today = storage.submissions_today(project, Utc::now()).await?;
    info!(
        project,
        submitted = summary.submitted,
        failed = summary.failed,
        quota_exceeded = summary.quota_exceeded,
        "indexing batch finished"
    );
    Ok(summary)
}

/// Explicit user-triggered retry: resets the request to `pending`, increments
/// the retry counter by exactly one, and re-issues the same submission.
pub async fn retry_request<E: IndexingEndpoint>(
    storage: &Storage,
    api: &E,
    request_id: i64,
) -> Result<IndexingRequestRow, RelayError> {
    let request = storage
        .request_by_id(request_id)
        .await?
        .ok_or_else(|| RelayError::NotFound(format!("indexing request {request_id} not found")))?;

    if !request.status.is_retryable() {
        return Err(RelayError::BadRequest(format!(
            "request {request_id} is `{}`; only failed or quota_exceeded requests can be retried",
            request.status.as_str()
        )));
    }

    storage.begin_retry(request_id).await?;
    submit_one(
        storage,
        api,
        request_id,
        &request.project_id,
        &request.url,
        request.request_type,
    )
    .await?;

    storage
        .request_by_id(request_id)
        .await?
        .ok_or_else(|| RelayError::NotFound(format!("indexing request {request_id} vanished")))
}

/// Drive one `pending` request to its terminal state and mirror the outcome
/// into the URL inventory's "last request" summary.
async fn submit_one<E: IndexingEndpoint>(
    storage: &Storage,
    api: &E,
    request_id: i64,
    project: &str,
    url: &str,
    request_type: RequestType,
) -> Result<ItemResult, RelayError> {
    let attempted_at = Utc::now();
    let (status, code, message, fail_reason) = match api.publish(url, request_type).await {
        Ok(outcome) => (
            RequestStatus::Submitted,
            Some(outcome.code as i64),
            Some(outcome.message),
            None,
        ),
        Err(RelayError::Provider { status, body }) => {
            let classified = classify_submit_error(status, &body);
            warn!(project, url, status, "indexing submission rejected");
            (classified, Some(status as i64), None, Some(body))
        }
        Err(other) => {
            warn!(project, url, error = %other, "indexing submission errored");
            (RequestStatus::Failed, None, None, Some(other.to_string()))
        }
    };

    storage
        .mark_request(
            request_id,
            status,
            code,
            message.as_deref(),
            fail_reason.as_deref(),
            attempted_at,
        )
        .await?;
    storage
        .record_last_request(project, url, status, request_type, attempted_at)
        .await?;

    Ok(ItemResult {
        url: url.to_string(),
        status,
        detail: fail_reason,
    })
}
