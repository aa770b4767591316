//! azurefleet - Azure Fleet resource CLI
//!
//! This is the main entry point for the azurefleet CLI.

mod cli;

use anyhow::Result;
use azurefleet::config::ProviderConfig;
use azurefleet::logging::{init_logging, LogFormat};
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config = ProviderConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {:#}", e);
        ProviderConfig::default()
    });

    // Initialize logging from the config, raised by -v flags
    let format = config.logging.format.parse().unwrap_or_else(|e: String| {
        eprintln!("Warning: {}", e);
        LogFormat::Text
    });
    init_logging(cli.verbosity(), &config.logging.level, format);

    let exit_code = cli::run(&cli, &config).await?;

    std::process::exit(exit_code);
}
