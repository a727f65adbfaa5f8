//! # regdesk-api -- Binary Entry Point
//!
//! Starts the console service. Binds to `PORT` (default 8080). Connects to
//! the backend named by `REGDESK_BACKEND_URL` and `REGDESK_API_KEY`, or
//! serves empty in-memory tables when those are not set.

use regdesk_api::state::AppState;
use regdesk_client::ClientConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let state = match ClientConfig::from_env() {
        Ok(config) => {
            if config.webhooks.is_none() {
                tracing::warn!("generation webhooks not configured; generation endpoints will return 503");
            }
            AppState::from_config(&config).map_err(|e| {
                tracing::error!("failed to create backend clients: {e}");
                e
            })?
        }
        Err(e) => {
            tracing::warn!("backend not configured: {e}. Serving in-memory tables.");
            AppState::in_memory()
        }
    };

    let app = regdesk_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("regdesk API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
