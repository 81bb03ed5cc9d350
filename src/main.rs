//! chatwire CLI - send chat messages through a pool of backends

mod cli;

use anyhow::Context;
use chatwire::{
    default_endpoints, ChatSession, ConfigFile, DispatchConfig, Dispatcher,
    EndpointConfig, IdentityResolver, Maintenance, RateLimiter, SessionError,
};
use clap::Parser;
use cli::config::ConfigCommands;
use cli::endpoints::EndpointCommands;
use cli::{Cli, Commands};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    match &cli.command {
        Commands::Config { action } => handle_config(action, &cli).await,
        Commands::Endpoints { action } => handle_endpoints(action, &cli).await,
        Commands::Send { message } => run_send(message, &cli).await,
        Commands::Chat => run_chat(&cli).await,
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(ConfigFile::default_path)
}

fn load_config_file(cli: &Cli) -> anyhow::Result<ConfigFile> {
    let path = config_path(cli);
    if path.exists() {
        ConfigFile::load(&path).with_context(|| format!("loading {}", path.display()))
    } else if cli.config.is_some() {
        anyhow::bail!("Config file not found: {}", path.display())
    } else {
        Ok(ConfigFile::default())
    }
}

/// Defaults, then the config file, then command-line flags
fn build_dispatch_config(cli: &Cli, file: &ConfigFile) -> anyhow::Result<DispatchConfig> {
    let mut config = DispatchConfig::default();
    config.apply_file(file);

    let args = &cli.dispatch;
    if !args.endpoints.is_empty() {
        config.endpoints = args.endpoints.iter().map(EndpointConfig::new).collect();
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout = Duration::from_millis(timeout_ms);
    }
    if let Some(retries) = args.retries {
        config.retry_attempts = retries;
    }

    config.validate()?;
    Ok(config)
}

fn build_session(cli: &Cli) -> anyhow::Result<ChatSession> {
    let file = load_config_file(cli)?;
    let config = build_dispatch_config(cli, &file)?;
    let dispatcher = Arc::new(Dispatcher::new(config)?);

    let identity = if cli.dispatch.no_jid || !file.identity.enabled {
        IdentityResolver::disabled()
    } else {
        IdentityResolver::new(&file.identity.ip_lookup_url, &file.identity.jid_suffix)?
    };

    let limiter = RateLimiter::new(
        file.rate_limit.limit,
        Duration::from_secs(file.rate_limit.window_secs),
    );

    Ok(ChatSession::new(dispatcher, Arc::new(identity), Arc::new(limiter))
        .with_command_prefix(file.identity.command_prefix.clone()))
}

async fn run_send(message: &str, cli: &Cli) -> anyhow::Result<()> {
    let mut session = build_session(cli)?;

    match session.submit(message).await {
        Ok(reply) => println!("{}", reply),
        Err(SessionError::EmptyMessage) => anyhow::bail!("Message must not be empty"),
        Err(e) => println!("{}", e),
    }

    tracing::info!("Dispatch metrics: {}", session.dispatcher().metrics());
    Ok(())
}

async fn run_chat(cli: &Cli) -> anyhow::Result<()> {
    let mut session = build_session(cli)?;
    let maintenance = Maintenance::spawn(session.dispatcher().clone());

    println!("chatwire - type a message, /new to start over, /status for health, /quit to exit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "/quit" | "/exit" => break,
            "/new" => {
                session.reset();
                println!("✦ New chat started.");
            }
            "/status" => print_status(session.dispatcher()),
            input => match session.submit(input).await {
                Ok(reply) => println!("{}", reply),
                Err(SessionError::EmptyMessage) => continue,
                Err(e) => println!("✦ {}", e),
            },
        }
    }

    maintenance.shutdown();
    tracing::info!("Dispatch metrics: {}", session.dispatcher().metrics());
    Ok(())
}

fn print_status(dispatcher: &Dispatcher) {
    println!("{}", dispatcher.metrics());
    for (url, health) in dispatcher.pool().get_endpoint_health() {
        match health {
            Some(health) => println!("  {}: {}", url, health),
            None => println!("  {}: no data", url),
        }
    }
}

async fn handle_endpoints(action: &EndpointCommands, cli: &Cli) -> anyhow::Result<()> {
    let file = load_config_file(cli)?;
    let config = build_dispatch_config(cli, &file)?;

    match action {
        EndpointCommands::List => {
            println!("Mode: {}\n", config.mode);
            for (i, endpoint) in config.endpoints.iter().enumerate() {
                let status = if endpoint.enabled { "" } else { " [disabled]" };
                println!(
                    "{:>2}. {} (timeout {}ms){}",
                    i + 1,
                    endpoint.url,
                    config.timeout_for(endpoint).as_millis(),
                    status
                );
                if let Some(note) = &endpoint.note {
                    println!("    {}", note);
                }
            }
        }

        EndpointCommands::Probe => {
            let dispatcher = Dispatcher::new(config)?;
            println!(
                "Probing {} endpoints ({})...\n",
                dispatcher.pool().endpoint_count(),
                dispatcher.config().probe_path
            );

            let results = dispatcher.reorder_by_latency().await;
            for (i, result) in results.iter().enumerate() {
                match (result.latency, &result.error) {
                    (Some(latency), _) => {
                        println!("{:>2}. {} ✓ {}ms", i + 1, result.url, latency.as_millis())
                    }
                    (None, error) => println!(
                        "{:>2}. {} ✗ {}",
                        i + 1,
                        result.url,
                        error.as_deref().unwrap_or("unreachable")
                    ),
                }
            }
        }
    }

    Ok(())
}

async fn handle_config(action: &ConfigCommands, cli: &Cli) -> anyhow::Result<()> {
    let path = config_path(cli);

    match action {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }

        ConfigCommands::Show => {
            if path.exists() {
                let content = std::fs::read_to_string(&path)?;
                println!("# {}\n", path.display());
                println!("{}", content);
            } else {
                println!("No config file found at: {}", path.display());
                println!("\nCreate one with:");
                println!("  chatwire config init");
            }
        }

        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            let config = ConfigFile {
                endpoints: default_endpoints(),
                ..Default::default()
            };
            config.save(&path)?;
            println!("Config written to {}", path.display());
        }
    }

    Ok(())
}
