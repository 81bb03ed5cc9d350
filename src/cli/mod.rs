//! CLI command modules
//!
//! Each subcommand group has its own module with argument definitions.

pub mod config;
pub mod endpoints;

use chatwire::DispatchMode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatwire")]
#[command(
    version,
    about = "Resilient chat message dispatcher with failover across multiple backends"
)]
#[command(after_help = r#"EXAMPLES:
    # Send one message through the default backends
    chatwire send "hola, ¿qué tal?"

    # Race two backends, 5s per attempt
    chatwire --endpoint http://10.0.0.2:18880 --endpoint http://10.0.0.3:18880 \
             --mode race --timeout-ms 5000 send "hello"

    # Interactive chat
    chatwire chat

    # Probe endpoints and show latency order
    chatwire endpoints probe

CONFIG FILE:
    Default: ~/.config/chatwire/config.toml
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to the user config dir)
    #[arg(long, global = true, env = "CHATWIRE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub dispatch: DispatchArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Args)]
pub struct DispatchArgs {
    /// Use only this endpoint (can be repeated)
    #[arg(long = "endpoint", action = clap::ArgAction::Append, global = true)]
    pub endpoints: Vec<String>,

    /// Dispatch mode
    #[arg(long, value_enum, ignore_case = true, global = true)]
    pub mode: Option<DispatchMode>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Attempts per endpoint
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Do not attach an IP-derived jid
    #[arg(long, global = true)]
    pub no_jid: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,
    },

    /// Interactive chat on stdin (/new resets, /status shows health, /quit exits)
    Chat,

    /// Inspect and probe endpoints
    Endpoints {
        #[command(subcommand)]
        action: endpoints::EndpointCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: config::ConfigCommands,
    },
}
