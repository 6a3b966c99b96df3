use crate::error::RelayError;
use crate::middleware::auth::RequireKeyAuth;
use crate::pipeline::sync::{self, SyncReport};
use crate::router::RelayState;
use axum::{
    Json,
    extract::{Path, State},
};

/// POST /projects/{project}/sync — run the full six-dimension sync.
pub async fn run_sync(
    _auth: RequireKeyAuth,
    State(state): State<RelayState>,
    Path(project): Path<String>,
) -> Result<Json<SyncReport>, RelayError> {
    let report = sync::run_sync(&state.storage, &state.client, &project).await?;
    Ok(Json(report))
}
