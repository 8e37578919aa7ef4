use std::sync::Arc;

use anyhow::{Context, Result};
use booking_server::{
    config::Config,
    http::{create_router, AppState},
    i18n::Catalog,
    store::MemoryBookingStore,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    if config.webhook_secret.is_none() {
        warn!("WEBHOOK_SECRET not set; webhook endpoint will refuse all requests");
    }

    let state = AppState {
        webhook_secret: config.webhook_secret.clone(),
        store: Arc::new(MemoryBookingStore::new()),
        catalog: Arc::new(Catalog::load_embedded()?),
    };
    let app = create_router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    info!(addr = %listener.local_addr()?, "booking server listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,booking_server=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
