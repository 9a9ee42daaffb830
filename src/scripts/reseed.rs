use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use taskboard_seed::config::AppConfig;
use taskboard_seed::model::{ReseedOptions, SeedTable};
use taskboard_seed::seed;
use taskboard_seed::store::{PostgresStore, SeedStore};

/// Wipe the taskboard database and reload it from JSON fixtures
#[derive(Debug, Parser)]
#[command(name = "reseed", version)]
struct Args {
    /// Fixture directory (defaults to seed.seed_dir from config)
    #[arg(long)]
    seed_dir: Option<PathBuf>,

    /// Shift every fixture date by exactly this many days
    #[arg(long, allow_hyphen_values = true)]
    delta_days: Option<i64>,

    /// Land the earliest fixture date this many days before today
    #[arg(long, conflicts_with = "delta_days")]
    anchor_days_ago: Option<i64>,

    /// Share of projects to mark Done, between 0 and 1
    #[arg(long)]
    done_ratio: Option<f64>,

    /// Overrides database.connection_string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    taskboard_seed::init_logging();

    let args = Args::parse();

    let config = AppConfig::load()?;
    let mut settings = config.seed.clone();
    if let Some(done_ratio) = args.done_ratio {
        settings.done_ratio = done_ratio;
        settings = settings.normalized();
    }

    let database_url = match args.database_url {
        Some(url) => url,
        None => config.database_url()?,
    };
    let store = PostgresStore::new(&database_url, 1)
        .await
        .context("DATABASE_URL must point at a reachable database")?;

    let options = ReseedOptions {
        seed_dir: args.seed_dir,
        delta_days: args.delta_days,
        anchor_days_ago: args.anchor_days_ago,
    };

    println!("Reseeding database...");
    let outcome = seed::reseed(&store, &settings, &options).await?;
    println!("Dates shifted by {} days", outcome.delta_days);

    for table in SeedTable::ALL {
        let count = store.count_rows(table).await?;
        println!("  {:<16} {:>6} rows", table.name(), count);
    }

    println!("Reseed completed successfully!");
    Ok(())
}
