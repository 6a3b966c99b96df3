use crate::error::RelayError;
use crate::google::credentials::ServiceAccountCredential;
use crate::middleware::auth::RequireKeyAuth;
use crate::router::RelayState;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ConnectionBody {
    pub client_email: String,
    pub private_key: String,
    pub site_url: String,
}

/// PUT /projects/{project}/connection — register or replace a project's
/// service-account credential. The private key is never echoed back.
pub async fn put_connection(
    _auth: RequireKeyAuth,
    State(state): State<RelayState>,
    Path(project): Path<String>,
    Json(body): Json<ConnectionBody>,
) -> Result<Json<Value>, RelayError> {
    if body.client_email.is_empty() || body.private_key.is_empty() || body.site_url.is_empty() {
        return Err(RelayError::BadRequest(
            "client_email, private_key, and site_url are all required".into(),
        ));
    }

    let credential = ServiceAccountCredential {
        client_email: body.client_email,
        private_key: body.private_key,
        site_url: body.site_url,
    };
    let id = state.storage.upsert_connection(&project, &credential).await?;
    info!(project, connection_id = id, "connection stored");

    Ok(Json(json!({
        "project": project,
        "client_email": credential.client_email,
        "site_url": credential.site_url,
    })))
}
