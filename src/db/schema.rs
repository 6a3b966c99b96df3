//! SQL DDL for the pipeline store. SQLite-first design; timestamps are
//! RFC 3339 TEXT in UTC so lexicographic comparison matches chronological
//! order.

/// - `connections`: one service-account credential per project
/// - `metric_rows`: the per-project analytics snapshot, replaced wholesale
///   on every sync
/// - `indexing_requests`: append-only request log (audit trail; never
///   hard-deleted)
/// - `coverage_records`: one row per `(project_id, url)`, upserted
/// - `url_inventory`: known URLs plus the "last request" summary
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS connections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL UNIQUE,
    client_email TEXT NOT NULL,
    private_key TEXT NOT NULL,
    site_url TEXT NOT NULL,
    last_sync_at TEXT NULL
);

CREATE TABLE IF NOT EXISTS metric_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    dimension TEXT NOT NULL,
    key_value TEXT NOT NULL,
    metric_date TEXT NULL,
    clicks INTEGER NOT NULL,
    impressions INTEGER NOT NULL,
    ctr REAL NOT NULL,
    position REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_metric_rows_project_dimension
    ON metric_rows(project_id, dimension);

CREATE TABLE IF NOT EXISTS indexing_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    url TEXT NOT NULL,
    request_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    response_code INTEGER NULL,
    response_message TEXT NULL,
    retries INTEGER NOT NULL DEFAULT 0,
    fail_reason TEXT NULL,
    submitted_at TEXT NULL,
    completed_at TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_indexing_requests_project
    ON indexing_requests(project_id);

CREATE TABLE IF NOT EXISTS coverage_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    url TEXT NOT NULL,
    verdict TEXT NULL,
    coverage_state TEXT NULL,
    indexing_state TEXT NULL,
    robotstxt_state TEXT NULL,
    page_fetch_state TEXT NULL,
    crawled_as TEXT NULL,
    last_crawl_time TEXT NULL,
    referring_urls TEXT NULL, -- JSON array, serialized as text
    sitemap TEXT NULL,
    inspected_at TEXT NOT NULL,
    UNIQUE(project_id, url)
);

CREATE TABLE IF NOT EXISTS url_inventory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    url TEXT NOT NULL,
    last_request_status TEXT NULL,
    last_request_type TEXT NULL,
    last_requested_at TEXT NULL,
    UNIQUE(project_id, url)
);
"#;
