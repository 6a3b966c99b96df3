//! The manual sync: mint a fresh read-only token, pull all six dimensions
//! concurrently, then replace the stored snapshot.

use crate::config::SCOPE_WEBMASTERS_READONLY;
use crate::db::Storage;
use crate::error::RelayError;
use crate::google::api::SearchConsoleApi;
use crate::google::token;
use crate::pipeline::analytics::{self, DateWindow, Dimension, PageLimits};
use crate::pipeline::metrics;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct DimensionCount {
    pub dimension: &'static str,
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub dimensions: Vec<DimensionCount>,
    pub fetched: usize,
    pub stored: usize,
}

/// Run one full sync for a project. A failure in any dimension fails the sync
/// naming that dimension — partial data is never merged with the snapshot.
pub async fn run_sync(
    storage: &Storage,
    client: &reqwest::Client,
    project: &str,
) -> Result<SyncReport, RelayError> {
    let connection = storage
        .connection(project)
        .await?
        .ok_or_else(|| RelayError::MissingConnection {
            project: project.to_string(),
        })?;
    let credential = connection.credential();

    let bearer = token::mint(client, &credential, SCOPE_WEBMASTERS_READONLY).await?;
    let api = SearchConsoleApi::new(client.clone(), bearer.value, credential.site_url);

    let window = DateWindow::from_config();
    let limits = PageLimits::from_config();

    // The six fetches are independent read-only calls on the same token;
    // pagination within each stays sequential.
    let fetches =
        Dimension::ALL.map(|dimension| analytics::fetch_dimension(&api, &window, dimension, limits));
    let results = futures::future::join_all(fetches).await;

    let mut all_rows = Vec::new();
    let mut dimensions = Vec::with_capacity(Dimension::ALL.len());
    for (dimension, result) in Dimension::ALL.into_iter().zip(results) {
        let rows = result.map_err(|e| RelayError::DimensionFetch {
            dimension: dimension.as_str(),
            source: Box::new(e),
        })?;
        dimensions.push(DimensionCount {
            dimension: dimension.as_str(),
            rows: rows.len(),
        });
        all_rows.extend(rows);
    }

    let fetched = all_rows.len();
    let stored = metrics::replace_all(storage, project, &all_rows).await?;
    storage.touch_last_sync(project).await?;

    info!(project, fetched, stored, "search analytics sync finished");
    Ok(SyncReport {
        dimensions,
        fetched,
        stored,
    })
}
