use crate::config::SCOPE_WEBMASTERS_READONLY;
use crate::db::models::CoverageRow;
use crate::error::RelayError;
use crate::handlers::{console_api, require_connection};
use crate::middleware::auth::RequireKeyAuth;
use crate::pipeline::inspection::{self, InspectReport};
use crate::pipeline::pacer::Pacer;
use crate::router::RelayState;
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct InspectBody {
    /// Optional narrowing; an empty list scans the whole inventory.
    #[serde(default)]
    pub urls: Vec<String>,
}

/// POST /projects/{project}/inspect — run one staleness-gated coverage scan.
pub async fn inspect_urls(
    _auth: RequireKeyAuth,
    State(state): State<RelayState>,
    Path(project): Path<String>,
    body: Option<Json<InspectBody>>,
) -> Result<Json<InspectReport>, RelayError> {
    let urls = body.map(|Json(b)| b.urls).unwrap_or_default();
    let connection = require_connection(&state, &project).await?;

    // Explicitly requested URLs join the tracked inventory.
    for url in &urls {
        state.storage.add_inventory_url(&project, url).await?;
    }

    let api = console_api(&state, &connection, SCOPE_WEBMASTERS_READONLY).await?;
    let pacer = Pacer::from_config();

    let report =
        inspection::inspect_batch(&state.storage, &api, &pacer, &project, &urls, Utc::now())
            .await?;
    Ok(Json(report))
}

/// GET /projects/{project}/coverage — the stored verdicts.
pub async fn list_coverage(
    _auth: RequireKeyAuth,
    State(state): State<RelayState>,
    Path(project): Path<String>,
) -> Result<Json<Vec<CoverageRow>>, RelayError> {
    let records = state.storage.coverage_records(&project).await?;
    Ok(Json(records))
}
