use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use kabunav::api::KabuPlusClient;
use kabunav::collector::feed;
use kabunav::database::DatabaseManager;
use kabunav::models::Config;
use kabunav::reference;

#[derive(Parser)]
#[command(name = "kabu-plus")]
#[command(about = "📈 Refresh the company directory and mirror the kabu+ CSV feed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the directory, then bring every feed table up to today
    Update,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let db = DatabaseManager::new(&config.database_path).await?;

    match cli.command {
        Commands::Update => {
            reference::refresh(&db).await?;
            let client = KabuPlusClient::new(&config)?;
            let inserted = feed::run_feed_update(&client, &db).await?;
            println!("✅ Feed update complete ({} new rows)", inserted);
        }
    }

    Ok(())
}
