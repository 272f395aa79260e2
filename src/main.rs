use std::net::SocketAddr;
use std::sync::Arc;

use timesheet_backend::{
    app,
    config::{init_config, LogFormat},
    database::pool::{create_pool, run_migrations},
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = init_config()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&config.media_dir).await?;
    info!("Serving media from: {}", config.media_dir);

    let state = AppState::new(pool, Arc::new(config.clone()));
    let router = app(state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
