use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerly::backup::BackupService;
use ledgerly::commands::{BackupCommand, ConfigCommand, RecordCommand};
use ledgerly::config::Config;
use ledgerly::db::{init_db, SqliteDocumentStore};

#[derive(Parser)]
#[command(name = "ledgerly")]
#[command(version)]
#[command(about = "Back up, restore and erase Ledgerly business data", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export, import, inspect or clear backups
    Backup(BackupCommand),

    /// Inspect and edit individual records
    Record(RecordCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "ledgerly=debug" } else { "ledgerly=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Backup(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            let service = BackupService::new(SqliteDocumentStore::new(pool))
                .with_product_name(config.product_name.value.clone());
            cmd.run(&service, &config).await?;
        }
        Some(Commands::Record(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            let store = SqliteDocumentStore::new(pool);
            cmd.run(&store).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
