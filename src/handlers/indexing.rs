use crate::config::{CONFIG, SCOPE_INDEXING};
use crate::db::models::IndexingRequestRow;
use crate::error::RelayError;
use crate::handlers::{console_api, require_connection};
use crate::middleware::auth::RequireKeyAuth;
use crate::pipeline::indexing::{self, BatchSummary, RequestType};
use crate::pipeline::pacer::Pacer;
use crate::router::RelayState;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    pub urls: Vec<String>,
    pub request_type: String,
}

/// POST /projects/{project}/indexing — submit a batch of URLs.
pub async fn submit_urls(
    _auth: RequireKeyAuth,
    State(state): State<RelayState>,
    Path(project): Path<String>,
    Json(body): Json<SubmitBody>,
) -> Result<Json<BatchSummary>, RelayError> {
    let request_type = RequestType::parse(&body.request_type)?;
    if body.urls.is_empty() {
        return Err(RelayError::BadRequest("urls must not be empty".into()));
    }
    if body.urls.len() > CONFIG.submit_batch_cap {
        return Err(RelayError::BadRequest(format!(
            "at most {} urls per submission",
            CONFIG.submit_batch_cap
        )));
    }

    let connection = require_connection(&state, &project).await?;
    let api = console_api(&state, &connection, SCOPE_INDEXING).await?;
    let pacer = Pacer::from_config();

    let summary =
        indexing::submit_batch(&state.storage, &api, &pacer, &project, &body.urls, request_type)
            .await?;
    Ok(Json(summary))
}

/// GET /projects/{project}/indexing — the request log, most recent first.
pub async fn list_requests(
    _auth: RequireKeyAuth,
    State(state): State<RelayState>,
    Path(project): Path<String>,
) -> Result<Json<Vec<IndexingRequestRow>>, RelayError> {
    let requests = state.storage.list_requests(&project).await?;
    Ok(Json(requests))
}

/// POST /indexing/{request_id}/retry — explicit re-submission of a failed or
/// quota-bounced request.
pub async fn retry_request(
    _auth: RequireKeyAuth,
    State(state): State<RelayState>,
    Path(request_id): Path<i64>,
) -> Result<Json<IndexingRequestRow>, RelayError> {
    let request = state
        .storage
        .request_by_id(request_id)
        .await?
        .ok_or_else(|| RelayError::NotFound(format!("indexing request {request_id} not found")))?;
    if !request.status.is_retryable() {
        return Err(RelayError::BadRequest(format!(
            "request {request_id} is `{}`; only failed or quota_exceeded requests can be retried",
            request.status.as_str()
        )));
    }

    let connection = require_connection(&state, &request.project_id).await?;
    let api = console_api(&state, &connection, SCOPE_INDEXING).await?;

    let row = indexing::retry_request(&state.storage, &api, request_id).await?;
    Ok(Json(row))
}
