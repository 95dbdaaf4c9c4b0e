use clap::Parser;
use tracing_subscriber::EnvFilter;

use dayleaf::config::{Cli, Command, Config};
use dayleaf::db;

fn main() -> anyhow::Result<()> {
    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    // Initialize logging; RUST_LOG wins over the configured filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    let db_path = config.db_path();
    tracing::info!("Database: {}", db_path.display());

    let pool = db::create_pool(&db_path, &config.database)?;
    db::run_migrations(&pool)?;

    match cli.command.unwrap_or(Command::Migrate) {
        Command::Migrate => {}
        Command::Stats => {
            for (table, count) in db::table_counts(&pool)? {
                println!("{:<18} {}", table, count);
            }
        }
    }

    Ok(())
}
