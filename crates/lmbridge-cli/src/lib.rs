//! Command-line host for the lmbridge bridge.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary target only
use anyhow as _;
use dotenvy as _;
use tracing_subscriber as _;

pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod parser;

// Re-export primary types for convenient access
pub use commands::Commands;
pub use config::{BridgeArgs, UpstreamArgs};
pub use error::CliError;
pub use parser::Cli;
