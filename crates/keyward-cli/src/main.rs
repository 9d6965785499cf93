//! Keyward CLI entry point.

use clap::Parser;
use keyward_cli::{logging, run, Cli};
use keyward_core::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging settings only; commands reload and report config errors themselves.
    let config = Config::load_or_default_from(cli.config.as_deref()).unwrap_or_default();
    logging::init(&config, cli.verbose);

    run(cli).await
}
