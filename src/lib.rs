pub mod api;
pub mod config;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export all model types
pub use model::*;

// Export seed module
pub use seed::{reseed, reseed_at, SeedError};

// Export store types
pub use store::{MemoryStore, PostgresStore, SeedStore};

/// Log at info by default, keep sqlx quiet, let RUST_LOG override both
pub fn init_logging() {
    use env_logger::Builder;
    use log::LevelFilter;

    let _ = Builder::new()
        .filter_level(LevelFilter::Info) // Default to Info for everything
        .filter_module("sqlx", LevelFilter::Warn) // Suppress sqlx Debug logs
        .parse_default_env()
        .try_init();
}

/// Bind and serve the router until the process is stopped
pub async fn serve(app: axum::Router, config: &config::AppConfig) -> anyhow::Result<()> {
    use tokio::net::TcpListener;

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Taskboard seed server running on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
