//! Replace-not-merge persistence of fetched metric rows.

use crate::config::CONFIG;
use crate::db::Storage;
use crate::error::RelayError;
use crate::pipeline::analytics::MetricRow;
use tracing::warn;

/// Replace the project's entire metrics snapshot: delete the prior set, then
/// insert the fresh rows in bounded batches. A failed batch is logged and
/// skipped rather than aborting the run — the next sync fully supersedes this
/// one, so freshness wins over all-or-nothing atomicity. Returns the number
/// of rows actually stored.
pub async fn replace_all(
    storage: &Storage,
    project: &str,
    rows: &[MetricRow],
) -> Result<usize, RelayError> {
    storage.delete_metrics(project).await?;

    let mut stored = 0;
    for chunk in rows.chunks(CONFIG.insert_batch_size.max(1)) {
        match storage.insert_metric_batch(project, chunk).await {
            Ok(()) => stored += chunk.len(),
            Err(e) => {
                warn!(project, batch = chunk.len(), error = %e, "metric batch insert failed; continuing");
            }
        }
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analytics::DimensionKey;
    use chrono::NaiveDate;

    fn date_row(day: u32, clicks: i64) -> MetricRow {
        MetricRow {
            key: DimensionKey::Date(NaiveDate::from_ymd_opt(2024, 1, day).unwrap()),
            clicks,
            impressions: clicks * 20,
            ctr: 5.0,
            position: 4.3,
        }
    }

    fn query_row(term: &str) -> MetricRow {
        MetricRow {
            key: DimensionKey::Query(term.to_string()),
            clicks: 3,
            impressions: 60,
            ctr: 5.0,
            position: 7.1,
        }
    }

    #[tokio::test]
    async fn replace_is_idempotent() {
        let storage = Storage::open_in_memory().await;
        let rows = vec![date_row(1, 10), date_row(2, 5), query_row("rust crate")];

        let first = replace_all(&storage, "p1", &rows).await.unwrap();
        let second = replace_all(&storage, "p1", &rows).await.unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 3);
        assert_eq!(storage.metric_count("p1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn replace_drops_rows_absent_from_the_new_snapshot() {
        let storage = Storage::open_in_memory().await;
        replace_all(&storage, "p1", &[date_row(1, 10), date_row(2, 5)])
            .await
            .unwrap();
        replace_all(&storage, "p1", &[date_row(3, 7)]).await.unwrap();

        assert_eq!(storage.metric_count("p1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn replace_does_not_touch_other_projects() {
        let storage = Storage::open_in_memory().await;
        replace_all(&storage, "p1", &[date_row(1, 10)]).await.unwrap();
        replace_all(&storage, "p2", &[date_row(1, 4), date_row(2, 2)])
            .await
            .unwrap();
        replace_all(&storage, "p1", &[]).await.unwrap();

        assert_eq!(storage.metric_count("p1").await.unwrap(), 0);
        assert_eq!(storage.metric_count("p2").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn stored_date_rows_keep_their_metric_date() {
        let storage = Storage::open_in_memory().await;
        replace_all(&storage, "p1", &[date_row(1, 10)]).await.unwrap();

        let stored = storage.metric_rows("p1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].dimension, "date");
        assert_eq!(stored[0].metric_date.as_deref(), Some("2024-01-01"));
        assert_eq!(stored[0].ctr, 5.0);
    }
}
