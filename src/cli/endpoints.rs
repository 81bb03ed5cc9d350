//! Endpoint inspection commands

use clap::Subcommand;

#[derive(Subcommand)]
pub enum EndpointCommands {
    /// List configured endpoints in priority order
    List,

    /// Probe every endpoint and show the latency order
    Probe,
}
