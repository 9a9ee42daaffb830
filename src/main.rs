use std::sync::Arc;
use taskboard_seed::api::{create_router, AppState};
use taskboard_seed::config::AppConfig;
use taskboard_seed::model::ReseedOptions;
use taskboard_seed::seed;
use taskboard_seed::store::PostgresStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();
    taskboard_seed::init_logging();

    println!("Taskboard: fixture reseed server");

    // Load configuration
    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: server={}:{}, fixtures={}",
        config.server.host,
        config.server.port,
        config.seed.seed_dir.display()
    );

    println!("Connecting to PostgreSQL...");
    let database_url = config.database_url()?;
    let store = Arc::new(PostgresStore::new(&database_url, config.max_connections()).await?);

    if config.seed.on_startup {
        println!("Reseeding database...");
        let outcome = seed::reseed(&*store, &config.seed, &ReseedOptions::default()).await?;
        println!(
            "Reseed finished: {} rows, dates shifted by {} days",
            outcome.total_inserted(),
            outcome.delta_days
        );
    }

    let state = Arc::new(AppState::new(store, config.seed.clone()));
    taskboard_seed::serve(create_router().with_state(state), &config).await?;

    Ok(())
}
