//! Keyward command-line interface.

pub mod commands;
pub mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Keyward - password-locked signing accounts
#[derive(Parser)]
#[command(name = "keyward")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "KEYWARD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Account(commands::account::AccountCommand),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Account(command) => commands::account::run(command, config_path).await,
        Commands::Config(args) => commands::config::run(args, config_path).await,
        Commands::Version => {
            println!("keyward {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
