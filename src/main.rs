use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &gsc_relay::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel,
        lookback_days = cfg.lookback_days
    );

    let storage = gsc_relay::db::sqlite::Storage::connect(&cfg.database_url).await?;
    let client = gsc_relay::google::http_client();

    if let Some(cred_path) = cfg.cred_path.as_ref() {
        match gsc_relay::google::loader::load_from_dir(cred_path) {
            Ok(creds) if !creds.is_empty() => {
                info!(
                    path = %cred_path.display(),
                    count = creds.len(),
                    "registering credentials loaded from filesystem"
                );
                for (project, credential) in &creds {
                    if let Err(e) = storage.upsert_connection(project, credential).await {
                        warn!(project, error = %e, "failed to store credential");
                    }
                }
            }
            Ok(_) => {
                info!(path = %cred_path.display(), "no credential files discovered");
            }
            Err(e) => {
                warn!(
                    path = %cred_path.display(),
                    error = %e,
                    "failed to load credentials from directory"
                );
            }
        }
    }

    let state = gsc_relay::router::RelayState::new(
        storage,
        client,
        Arc::from(cfg.api_key.as_str()),
    );
    let app = gsc_relay::router::relay_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
