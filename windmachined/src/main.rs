//! Internal Wind Machine daemon
//!
//! Standalone host for the wind machine plugin. Subscribes to a telemetry
//! property server, publishes fan power to sensor files and accepts
//! operator commands on stdin.

mod bridge;
mod commands;
mod config;
mod property_server;
mod shutdown;

use anyhow::Result;
use bridge::Bridge;
use clap::{Parser, Subcommand};
use commands::OperatorCommand;
use property_server::PropertyClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::info;
use windmachine_core::{default_config_path, DaemonConfig};
use windmachine_plugin::{DataPlugin, HttpUpdateSource, UpdateEvent, WindMachine};

/// Internal Wind Machine daemon
#[derive(Parser, Debug)]
#[command(name = "windmachined")]
#[command(version, about = "Internal Wind Machine telemetry bridge", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Install root holding the settings document and sensor directory
    ///
    /// Overrides `install_root` from the configuration file.
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Bridge the property server to the sensor files (default)
    Run,
    /// Reset every sensor file to -1 and exit
    Reset,
    /// Check for a newer release and print the result
    CheckUpdate,
    /// Check for a newer release and install it over this executable
    InstallUpdate {
        /// Install without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);

    // Determine config path: CLI flag > env var > default
    let config_path = args.config.unwrap_or_else(|| {
        std::env::var("WINDMACHINE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    });
    info!("Configuration file: {}", config_path.display());

    let mut daemon_config = config::load_or_create(&config_path).await?;
    if let Some(root) = args.root {
        daemon_config.install_root = root;
    }
    info!("Install root: {}", daemon_config.install_root.display());

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&daemon_config).await,
        Command::Reset => reset(&daemon_config),
        Command::CheckUpdate => check_update(&daemon_config).await,
        Command::InstallUpdate { yes } => install_update(&daemon_config, yes).await,
    }
}

fn build_plugin(
    daemon_config: &DaemonConfig,
) -> Result<(WindMachine, mpsc::UnboundedReceiver<UpdateEvent>)> {
    let source = HttpUpdateSource::new(
        daemon_config.manifest_url.clone(),
        Duration::from_secs(daemon_config.http_timeout_secs),
    )?;
    let (plugin, events) = WindMachine::new(&daemon_config.install_root);
    Ok((plugin.with_update_source(Arc::new(source)), events))
}

async fn run(daemon_config: &DaemonConfig) -> Result<()> {
    let (plugin, events) = build_plugin(daemon_config)?;

    let (subscriptions_tx, subscriptions_rx) = watch::channel(Vec::new());
    let (updates_tx, updates_rx) = mpsc::channel(256);
    let (commands_tx, commands_rx) = mpsc::channel(16);

    let mut bridge = Bridge::new(plugin, subscriptions_tx);
    bridge.start();
    print_banner(&bridge);

    let client = PropertyClient::new(
        daemon_config.property_server_addr(),
        Duration::from_secs(daemon_config.property_server.reconnect_delay_secs),
    );
    tokio::spawn(client.run(subscriptions_rx, updates_tx));
    tokio::spawn(commands::read_commands(
        BufReader::new(tokio::io::stdin()),
        commands_tx,
    ));

    let status_interval = Duration::from_millis(daemon_config.status_interval_ms.max(1));
    bridge
        .run(
            updates_rx,
            commands_rx,
            events,
            status_interval,
            shutdown::shutdown_signal(),
        )
        .await;

    info!("Cleanup complete. Exiting.");
    Ok(())
}

fn reset(daemon_config: &DaemonConfig) -> Result<()> {
    let (mut plugin, _events) = WindMachine::new(&daemon_config.install_root);
    plugin.init();
    let count = plugin.reset_sensors()?;
    println!(
        "Reset {} sensor file(s) in {}",
        count,
        plugin.sensor_directory().display()
    );
    Ok(())
}

async fn check_update(daemon_config: &DaemonConfig) -> Result<()> {
    let (plugin, _events) = build_plugin(daemon_config)?;
    let Some(checker) = plugin.checker() else {
        anyhow::bail!("No update source configured");
    };

    match checker.check().await {
        Some(update) => println!("Update available: v{} ({})", update.version, update.url),
        None => println!("No update available (running v{})", plugin.running_version()),
    }
    Ok(())
}

async fn install_update(daemon_config: &DaemonConfig, yes: bool) -> Result<()> {
    let (plugin, _events) = build_plugin(daemon_config)?;
    let Some(checker) = plugin.checker() else {
        anyhow::bail!("No update source configured");
    };

    let Some(update) = checker.check().await else {
        println!("No update available (running v{})", plugin.running_version());
        return Ok(());
    };

    if !yes && !confirm(&format!("Install v{} now?", update.version)).await? {
        println!("Update cancelled");
        return Ok(());
    }

    let outcome = plugin.install_update().await?;
    println!(
        "Installed v{} to {} ({} bytes). Restart to load it.",
        outcome.version,
        outcome.paths.current.display(),
        outcome.bytes
    );
    println!("Previous version kept at {}", outcome.paths.old.display());
    Ok(())
}

async fn confirm(question: &str) -> Result<bool> {
    println!("{} [y/N]", question);
    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_banner(bridge: &Bridge) {
    let plugin = bridge.plugin();
    let config = plugin.config();
    info!("Internal Wind Machine v{}", plugin.running_version());
    info!(
        "Mode: {}",
        if config.use_3d_wind {
            "3D (Multi-Fan)"
        } else {
            "Mono (Center Fan)"
        }
    );
    info!("Sensors: {}", plugin.sensor_directory().display());
    for command in OperatorCommand::ALL {
        info!("Type '{}' to {}.", command, command.help());
    }
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
