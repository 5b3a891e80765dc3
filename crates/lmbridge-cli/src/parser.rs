//! Main CLI parser and top-level argument handling.
//!
//! Bridge and upstream options are global so they apply both to explicit
//! subcommands and to bare activation.

use clap::Parser;

use crate::commands::Commands;
use crate::config::BridgeArgs;

/// Command-line interface for the OpenAI-compatible model bridge.
///
/// Running without a subcommand activates the bridge when auto-start is
/// enabled and prints help otherwise.
#[derive(Debug, Parser)]
#[command(name = "lmbridge")]
#[command(about = "Expose an upstream chat-model provider as a local OpenAI-compatible API")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub bridge: BridgeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
