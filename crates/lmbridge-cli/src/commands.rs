//! Subcommand definitions.

use clap::Subcommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Start the bridge and serve until Ctrl-C
    Serve,

    /// List the chat models the upstream currently offers
    Models,

    /// Report credentials and upstream reachability (exit code 1 when not ready)
    Check,

    /// Print the steps to sign in and start the bridge
    Setup,
}
