//! Exhaustive, paginated extraction of one search-analytics dimension.
//!
//! Dimensions are never combined in a single query: the provider would return
//! cross-product rows and misattribute click/impression totals. Each dimension
//! is pulled alone over the full window.

use crate::config::CONFIG;
use crate::error::RelayError;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The six axes search-analytics rows can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Date,
    Query,
    Page,
    Country,
    Device,
    SearchAppearance,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Date,
        Dimension::Query,
        Dimension::Page,
        Dimension::Country,
        Dimension::Device,
        Dimension::SearchAppearance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Date => "date",
            Dimension::Query => "query",
            Dimension::Page => "page",
            Dimension::Country => "country",
            Dimension::Device => "device",
            Dimension::SearchAppearance => "searchAppearance",
        }
    }
}

/// Row key carrying the one value its dimension groups by. A row with zero or
/// two keys is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionKey {
    Date(NaiveDate),
    Query(String),
    Page(String),
    Country(String),
    Device(String),
    SearchAppearance(String),
}

impl DimensionKey {
    pub fn dimension(&self) -> Dimension {
        match self {
            DimensionKey::Date(_) => Dimension::Date,
            DimensionKey::Query(_) => Dimension::Query,
            DimensionKey::Page(_) => Dimension::Page,
            DimensionKey::Country(_) => Dimension::Country,
            DimensionKey::Device(_) => Dimension::Device,
            DimensionKey::SearchAppearance(_) => Dimension::SearchAppearance,
        }
    }

    pub fn value(&self) -> String {
        match self {
            DimensionKey::Date(d) => d.format("%Y-%m-%d").to_string(),
            DimensionKey::Query(s)
            | DimensionKey::Page(s)
            | DimensionKey::Country(s)
            | DimensionKey::Device(s)
            | DimensionKey::SearchAppearance(s) => s.clone(),
        }
    }

    /// The calendar date is only meaningful for the `date` dimension; other
    /// dimensions aggregate over the whole window.
    pub fn metric_date(&self) -> Option<NaiveDate> {
        match self {
            DimensionKey::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn parse(dimension: Dimension, raw: &str) -> Result<Self, RelayError> {
        Ok(match dimension {
            Dimension::Date => DimensionKey::Date(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                    RelayError::UpstreamFormat(format!("bad date key `{raw}`: {e}"))
                })?,
            ),
            Dimension::Query => DimensionKey::Query(raw.to_string()),
            Dimension::Page => DimensionKey::Page(raw.to_string()),
            Dimension::Country => DimensionKey::Country(raw.to_string()),
            Dimension::Device => DimensionKey::Device(raw.to_string()),
            Dimension::SearchAppearance => DimensionKey::SearchAppearance(raw.to_string()),
        })
    }
}

/// One converted metric row ready for storage. `ctr` is a percentage with two
/// decimals, `position` carries one decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub key: DimensionKey,
    pub clicks: i64,
    pub impressions: i64,
    pub ctr: f64,
    pub position: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub start_date: String,
    pub end_date: String,
    pub dimensions: [&'static str; 1],
    pub row_limit: u32,
    pub start_row: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsPage {
    #[serde(default)]
    pub rows: Vec<ApiRow>,
}

/// Raw provider row. `ctr` is a fraction in [0,1]; clicks/impressions arrive
/// as JSON numbers that are occasionally fractional in the wild.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRow {
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

/// Seam over the `searchAnalytics/query` endpoint so pagination can be
/// exercised without a network.
pub trait AnalyticsPages {
    async fn fetch_page(&self, query: &AnalyticsQuery) -> Result<AnalyticsPage, RelayError>;
}

/// Fixed date window, formatted `YYYY-MM-DD` end-inclusive.
#[derive(Debug, Clone)]
pub struct DateWindow {
    pub start_date: String,
    pub end_date: String,
}

impl DateWindow {
    pub fn lookback(days: i64, today: NaiveDate) -> Self {
        let start = today - Duration::days(days);
        Self {
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: today.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn from_config() -> Self {
        Self::lookback(CONFIG.lookback_days, Utc::now().date_naive())
    }
}

/// Page-size and hard-cap bounds for the pagination loop.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub row_limit: u32,
    pub start_row_cap: u32,
}

impl PageLimits {
    pub fn from_config() -> Self {
        Self {
            row_limit: CONFIG.row_limit,
            start_row_cap: CONFIG.start_row_cap,
        }
    }
}

pub(crate) fn round_ctr(fraction: f64) -> f64 {
    (fraction * 10_000.0).round() / 100.0
}

pub(crate) fn round_position(position: f64) -> f64 {
    (position * 10.0).round() / 10.0
}

fn convert_row(dimension: Dimension, raw: ApiRow) -> Result<MetricRow, RelayError> {
    let key_raw = raw.keys.into_iter().next().ok_or_else(|| {
        RelayError::UpstreamFormat(format!(
            "analytics row for `{}` carries no keys",
            dimension.as_str()
        ))
    })?;
    Ok(MetricRow {
        key: DimensionKey::parse(dimension, &key_raw)?,
        clicks: raw.clicks.round() as i64,
        impressions: raw.impressions.round() as i64,
        ctr: round_ctr(raw.ctr),
        position: round_position(raw.position),
    })
}

/// Pull every row of one dimension. Pages sequentially (each `startRow`
/// depends on the prior page), stops on the first short page, and bails out
/// once `startRow` reaches the hard cap even if the provider keeps reporting
/// full pages.
pub async fn fetch_dimension<A: AnalyticsPages>(
    api: &A,
    window: &DateWindow,
    dimension: Dimension,
    limits: PageLimits,
) -> Result<Vec<MetricRow>, RelayError> {
    let mut rows = Vec::new();
    let mut start_row: u32 = 0;
    loop {
        let query = AnalyticsQuery {
            start_date: window.start_date.clone(),
            end_date: window.end_date.clone(),
            dimensions: [dimension.as_str()],
            row_limit: limits.row_limit,
            start_row,
        };
        let page = api.fetch_page(&query).await?;
        let returned = page.rows.len() as u32;
        for raw in page.rows {
            rows.push(convert_row(dimension, raw)?);
        }
        if returned < limits.row_limit {
            break;
        }
        start_row += returned;
        if start_row >= limits.start_row_cap {
            break;
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedPages {
        calls: Mutex<Vec<u32>>,
        pages: Mutex<Vec<AnalyticsPage>>,
    }

    impl FixedPages {
        fn new(pages: Vec<AnalyticsPage>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                pages: Mutex::new(pages),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl AnalyticsPages for FixedPages {
        async fn fetch_page(&self, query: &AnalyticsQuery) -> Result<AnalyticsPage, RelayError> {
            self.calls.lock().unwrap().push(query.start_row);
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                Ok(AnalyticsPage::default())
            } else {
                Ok(pages.remove(0))
            }
        }
    }

    fn row(key: &str) -> ApiRow {
        ApiRow {
            keys: vec![key.to_string()],
            clicks: 1.0,
            impressions: 10.0,
            ctr: 0.1,
            position: 2.0,
        }
    }

    fn full_page(rows: usize) -> AnalyticsPage {
        AnalyticsPage {
            rows: vec![row("term"); rows],
        }
    }

    fn window() -> DateWindow {
        DateWindow::lookback(480, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[tokio::test]
    async fn pagination_stops_at_hard_cap_on_endless_full_pages() {
        // Provider reports a full page every time; the cap (75000 with 25000
        // per page) must bound the loop to exactly 3 calls.
        let api = FixedPages::new(vec![full_page(25_000); 5]);
        let limits = PageLimits {
            row_limit: 25_000,
            start_row_cap: 75_000,
        };
        let rows = fetch_dimension(&api, &window(), Dimension::Query, limits)
            .await
            .unwrap();
        assert_eq!(api.call_count(), 3);
        assert_eq!(rows.len(), 75_000);
        assert_eq!(*api.calls.lock().unwrap(), vec![0, 25_000, 50_000]);
    }

    #[tokio::test]
    async fn pagination_stops_after_first_short_page() {
        let api = FixedPages::new(vec![full_page(25_000), full_page(120)]);
        let limits = PageLimits {
            row_limit: 25_000,
            start_row_cap: 75_000,
        };
        let rows = fetch_dimension(&api, &window(), Dimension::Page, limits)
            .await
            .unwrap();
        assert_eq!(api.call_count(), 2);
        assert_eq!(rows.len(), 25_120);
    }

    #[tokio::test]
    async fn empty_first_page_yields_no_rows_and_one_call() {
        let api = FixedPages::new(vec![AnalyticsPage::default()]);
        let rows = fetch_dimension(
            &api,
            &window(),
            Dimension::Country,
            PageLimits {
                row_limit: 25_000,
                start_row_cap: 75_000,
            },
        )
        .await
        .unwrap();
        assert!(rows.is_empty());
        assert_eq!(api.call_count(), 1);
    }

    #[test]
    fn ctr_becomes_percentage_with_two_decimals() {
        assert_eq!(round_ctr(0.05), 5.0);
        assert_eq!(round_ctr(0.12345), 12.35);
        assert_eq!(round_ctr(0.0), 0.0);
    }

    #[test]
    fn position_rounds_to_one_decimal() {
        assert_eq!(round_position(4.32), 4.3);
        assert_eq!(round_position(5.0), 5.0);
        assert_eq!(round_position(12.35), 12.4);
    }

    #[test]
    fn date_keys_parse_and_other_dimensions_stay_verbatim() {
        let key = DimensionKey::parse(Dimension::Date, "2024-01-02").unwrap();
        assert_eq!(
            key.metric_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
        assert_eq!(key.value(), "2024-01-02");

        let key = DimensionKey::parse(Dimension::Device, "MOBILE").unwrap();
        assert_eq!(key.metric_date(), None);
        assert_eq!(key.value(), "MOBILE");
    }

    #[test]
    fn malformed_date_key_is_rejected() {
        let err = DimensionKey::parse(Dimension::Date, "01/02/2024").unwrap_err();
        assert!(matches!(err, RelayError::UpstreamFormat(_)));
    }

    #[tokio::test]
    async fn converted_rows_carry_exactly_one_key() {
        let page = AnalyticsPage {
            rows: vec![ApiRow {
                keys: vec!["2024-01-01".to_string()],
                clicks: 10.0,
                impressions: 200.0,
                ctr: 0.05,
                position: 4.32,
            }],
        };
        let api = FixedPages::new(vec![page]);
        let rows = fetch_dimension(
            &api,
            &window(),
            Dimension::Date,
            PageLimits {
                row_limit: 25_000,
                start_row_cap: 75_000,
            },
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ctr, 5.0);
        assert_eq!(rows[0].position, 4.3);
        assert_eq!(rows[0].key.dimension(), Dimension::Date);
    }
}
