use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use optchain_core::{AppConfig, DatabaseConfig};
use optchain_storage::MySqlStorage;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "optchain")]
#[command(version, about = "Upload SPY index and options CSVs and browse the option chain", long_about = None)]
struct Cli {
    /// MySQL connection URL. Overrides the MYSQL_* variables.
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Listen port for the web server
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Listen address for the web server
    #[arg(short = 'H', long, global = true)]
    host: Option<String>,

    /// Defaults to `serve`.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server
    Serve,
    /// Create or upgrade the MySQL schema and exit
    Migrate,
    /// Print row counts as JSON
    Stats,
}

/// Connect to MySQL or fail with the (redacted) target in the message.
pub(crate) async fn connect(config: &DatabaseConfig) -> Result<MySqlStorage> {
    MySqlStorage::new(config)
        .await
        .with_context(|| format!("cannot connect to MySQL at {}", config.target()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database.url = Some(url);
    }

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve::run(config).await?,
        Commands::Migrate => {
            connect(&config.database).await?;
            println!("schema up to date at {}", config.database.target());
        },
        Commands::Stats => commands::stats::run(&config.database).await?,
    }

    Ok(())
}
