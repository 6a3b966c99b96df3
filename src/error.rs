use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RelayError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] SqlxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("service account key rejected: {0}")]
    InvalidKey(String),

    #[error("token endpoint rejected the assertion (status {status}): {body}")]
    Auth { status: u16, body: String },

    #[error("Search Console API error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("daily indexing quota exhausted: {message}")]
    QuotaExceeded { message: String },

    #[error("no Search Console connection for project `{project}`")]
    MissingConnection { project: String },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("unexpected provider response shape: {0}")]
    UpstreamFormat(String),

    #[error("analytics fetch failed for dimension `{dimension}`: {source}")]
    DimensionFetch {
        dimension: &'static str,
        #[source]
        source: Box<RelayError>,
    },
}

/// Every failure leaves the service as `{"error": "..."}` with a status
/// reflecting the failure class: 400 bad input, 404 missing resource,
/// 500 upstream/internal.
#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::MissingConnection { .. } | RelayError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ApiErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn bad_request_maps_to_400() {
        let resp = RelayError::BadRequest("urls must not be empty".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_connection_maps_to_404() {
        let resp = RelayError::MissingConnection {
            project: "p1".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn provider_error_maps_to_500() {
        let resp = RelayError::Provider {
            status: 403,
            body: "forbidden".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
