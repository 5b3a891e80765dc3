//! CLI entry point - the composition root.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use lmbridge_cli::{Cli, CliError, Commands, handlers};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Some(Commands::Serve) => handlers::serve::execute(&cli.bridge).await,
        Some(Commands::Models) => handlers::models::execute(&cli.bridge.upstream).await,
        Some(Commands::Check) => handlers::check::execute(&cli.bridge.upstream).await,
        Some(Commands::Setup) => {
            handlers::setup::execute(&cli.bridge);
            Ok(())
        }
        // Bare activation
        None if cli.bridge.auto_start => handlers::serve::execute(&cli.bridge).await,
        None => {
            Cli::command()
                .print_help()
                .map_err(|e| CliError::Config(e.to_string()))?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so LMBRIDGE_* variables feed the arguments
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}
