use anyhow::Result;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use kabunav::models::Config;
use kabunav::ui;

fn main() -> Result<()> {
    // Initialize logging - suppress most logs for TUI
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::ERROR)
        .with_env_filter("kabunav=error")
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            eprintln!("Make sure you have a .env file with the kabu+ feed credentials.");
            std::process::exit(1);
        }
    };

    println!("🚀 Starting 株式ナビ dashboard...");

    match ui::app::run_app(&config) {
        Ok(_) => {
            println!("Thanks for using 株式ナビ!");
        }
        Err(e) => {
            eprintln!("❌ TUI Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
