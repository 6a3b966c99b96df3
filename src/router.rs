use crate::db::Storage;
use crate::handlers;
use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct RelayState {
    pub storage: Storage,
    pub client: reqwest::Client,
    pub api_key: Arc<str>,
}

impl RelayState {
    pub fn new(storage: Storage, client: reqwest::Client, api_key: Arc<str>) -> Self {
        Self {
            storage,
            client,
            api_key,
        }
    }
}

pub fn relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/projects/{project}/sync", post(handlers::sync::run_sync))
        .route(
            "/projects/{project}/indexing",
            post(handlers::indexing::submit_urls).get(handlers::indexing::list_requests),
        )
        .route(
            "/indexing/{request_id}/retry",
            post(handlers::indexing::retry_request),
        )
        .route(
            "/projects/{project}/inspect",
            post(handlers::inspection::inspect_urls),
        )
        .route(
            "/projects/{project}/coverage",
            get(handlers::inspection::list_coverage),
        )
        .route(
            "/projects/{project}/sitemaps",
            get(handlers::sitemaps::list)
                .post(handlers::sitemaps::submit)
                .delete(handlers::sitemaps::delete),
        )
        .route(
            "/projects/{project}/connection",
            put(handlers::connections::put_connection),
        )
        .with_state(state)
}
