use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use tracing_subscriber::EnvFilter;

use cardia_cli::commands::{self, HistoryCommand};
use cardia_cli::config::{self, CardiaConfig};
use cardia_history::AssessmentHistoryStore;
use cardia_storage::FileStore;

#[derive(Parser)]
#[command(name = "cardia", about = "Inspect and repair assessment history")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// History store file (overrides the config)
    #[arg(long, global = true, env = "CARDIA_STORE")]
    store: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    History(HistoryCommand),
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Replace an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let output = match cli.command {
        Commands::Config(ConfigCommand::Show) => {
            serde_json::to_value(config::load_or_default()?)?
        }
        Commands::Config(ConfigCommand::Init { force }) => {
            if config::has_config() && !force {
                return Err(eyre::eyre!(
                    "config already exists at {} (use --force to replace it)",
                    config::config_path()?.display()
                ));
            }
            let path = config::save_config(&CardiaConfig::with_default_store()?)?;
            serde_json::json!({ "config": path })
        }
        Commands::History(command) => {
            let cfg = config::load_or_default()?;
            let store_path = cli.store.unwrap_or(cfg.store_path);
            tracing::debug!(store = %store_path.display(), "opening history store");

            let store = AssessmentHistoryStore::with_config(FileStore::open(store_path), cfg.history);
            commands::run(&store, command, std::io::stdin().lock())?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
