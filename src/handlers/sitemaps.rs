use crate::config::{SCOPE_WEBMASTERS, SCOPE_WEBMASTERS_READONLY};
use crate::error::RelayError;
use crate::handlers::{console_api, require_connection};
use crate::middleware::auth::RequireKeyAuth;
use crate::pipeline::pacer::Pacer;
use crate::pipeline::sitemaps::{self, SitemapBatchReport, SitemapEndpoint, SitemapEntry};
use crate::router::RelayState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct SitemapBody {
    pub sitemaps: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub feedpath: String,
}

/// GET /projects/{project}/sitemaps
pub async fn list(
    _auth: RequireKeyAuth,
    State(state): State<RelayState>,
    Path(project): Path<String>,
) -> Result<Json<Vec<SitemapEntry>>, RelayError> {
    let connection = require_connection(&state, &project).await?;
    let api = console_api(&state, &connection, SCOPE_WEBMASTERS_READONLY).await?;
    Ok(Json(api.list().await?))
}

/// POST /projects/{project}/sitemaps — submit one or many feedpaths.
pub async fn submit(
    _auth: RequireKeyAuth,
    State(state): State<RelayState>,
    Path(project): Path<String>,
    Json(body): Json<SitemapBody>,
) -> Result<Json<SitemapBatchReport>, RelayError> {
    if body.sitemaps.is_empty() {
        return Err(RelayError::BadRequest("sitemaps must not be empty".into()));
    }

    let connection = require_connection(&state, &project).await?;
    let api = console_api(&state, &connection, SCOPE_WEBMASTERS).await?;
    let pacer = Pacer::from_config();

    Ok(Json(sitemaps::submit_all(&api, &pacer, &body.sitemaps).await))
}

/// DELETE /projects/{project}/sitemaps?feedpath=...
pub async fn delete(
    _auth: RequireKeyAuth,
    State(state): State<RelayState>,
    Path(project): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>, RelayError> {
    if query.feedpath.is_empty() {
        return Err(RelayError::BadRequest("feedpath must not be empty".into()));
    }

    let connection = require_connection(&state, &project).await?;
    let api = console_api(&state, &connection, SCOPE_WEBMASTERS).await?;
    api.delete(&query.feedpath).await?;
    Ok(Json(json!({ "deleted": query.feedpath })))
}
