pub mod connections;
pub mod indexing;
pub mod inspection;
pub mod sitemaps;
pub mod sync;

use crate::db::models::ConnectionRow;
use crate::error::RelayError;
use crate::google::api::SearchConsoleApi;
use crate::google::token;
use crate::router::RelayState;

/// Load the project's connection, or fail with 404 before any network call.
pub(crate) async fn require_connection(
    state: &RelayState,
    project: &str,
) -> Result<ConnectionRow, RelayError> {
    state
        .storage
        .connection(project)
        .await?
        .ok_or_else(|| RelayError::MissingConnection {
            project: project.to_string(),
        })
}

/// Mint a fresh token for `scope` and wrap it in an API caller. Every
/// invocation gets its own token; nothing is cached across calls.
pub(crate) async fn console_api(
    state: &RelayState,
    connection: &ConnectionRow,
    scope: &str,
) -> Result<SearchConsoleApi, RelayError> {
    let credential = connection.credential();
    let bearer = token::mint(&state.client, &credential, scope).await?;
    Ok(SearchConsoleApi::new(
        state.client.clone(),
        bearer.value,
        credential.site_url,
    ))
}
