use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use kabunav::api::YahooClient;
use kabunav::collector::{prices, statements};
use kabunav::database::DatabaseManager;
use kabunav::models::Config;

#[derive(Parser)]
#[command(name = "yahoo")]
#[command(about = "📊 Refresh financial statements and price history from the market-data API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh statements, then price history
    Update {
        /// Replay stored statement tables instead of fetching
        #[arg(long)]
        local: bool,
    },
    /// Refresh the eight financial-statement tables
    Fin {
        /// Replay stored statement tables instead of fetching
        #[arg(long)]
        local: bool,
    },
    /// Refresh daily price history
    Price,
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
        Commands::Update { local } => {
            run_fin(&config, &db, local).await?;
            run_price(&config, &db).await?;
        }
        Commands::Fin { local } => run_fin(&config, &db, local).await?,
        Commands::Price => run_price(&config, &db).await?,
    }

    Ok(())
}

async fn run_fin(config: &Config, db: &DatabaseManager, local: bool) -> Result<()> {
    if local {
        statements::run_local_replay(db).await?;
    } else {
        let client = YahooClient::new(config)?;
        statements::run_statement_update(&client, db).await?;
    }
    println!("✅ Statement update complete");
    Ok(())
}

async fn run_price(config: &Config, db: &DatabaseManager) -> Result<()> {
    let client = YahooClient::new(config)?;
    let inserted = prices::run_price_update(&client, db).await?;
    println!("✅ Price update complete ({} new rows)", inserted);
    Ok(())
}
