//! SideKick emulator CLI
//!
//! Runs one emulated DreamScreen SideKick on the local network.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dreamscreen_emulator::{
    EmulatorConfig, LogOutput, NullOutput, PeerPolicy, SideKickEmulator, UdpConfig, UdpEndpoint,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod terminal;

use terminal::TerminalOutput;

/// Emulated DreamScreen SideKick
#[derive(Parser)]
#[command(name = "sidekick-emu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Device name reported in state replies
    #[arg(short, long, global = true, env = "SIDEKICK_NAME")]
    name: Option<String>,

    /// Bind address
    #[arg(short, long, global = true)]
    bind: Option<IpAddr>,

    /// Port number
    #[arg(short = 'P', long, global = true)]
    port: Option<u16>,

    /// Always talk to this controller instead of binding on subscribe
    #[arg(long, global = true)]
    fixed_peer: Option<SocketAddr>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the emulator (default)
    Run {
        /// Where rendered colors go
        #[arg(short, long, value_enum, default_value = "terminal")]
        output: OutputKind,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputKind {
    /// Discard colors
    None,
    /// Report color changes through the log
    Log,
    /// Draw color swatches in the terminal
    Terminal,
}

/// Layout of the configuration file
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    device: EmulatorConfig,
    udp: UdpConfig,
}

impl FileConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Command-line flags take precedence over the file
    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(name) = &cli.name {
            self.device.name = name.clone();
        }
        if let Some(ip) = cli.bind {
            self.udp.bind_address.set_ip(ip);
        }
        if let Some(port) = cli.port {
            self.udp.bind_address.set_port(port);
        }
        if let Some(peer) = cli.fixed_peer {
            self.device.peer = PeerPolicy::Fixed(peer);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.log_level, cli.json_logs)?;

    let mut config = FileConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    config.device.validate().context("Invalid device configuration")?;

    match cli.command.unwrap_or(Commands::Run {
        output: OutputKind::Terminal,
    }) {
        Commands::Run { output } => {
            // Handle Ctrl+C
            let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for ctrl+c: {}", e);
                    return;
                }
                info!("Received shutdown signal");
                let _ = shutdown_tx.send(()).await;
            });

            run(config, output, &mut shutdown_rx).await?;
        }
        Commands::Config => {
            let text = toml::to_string_pretty(&config).context("Failed to render config")?;
            println!("{}", text);
        }
    }

    Ok(())
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to parse log level")?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }

    Ok(())
}

async fn run(
    config: FileConfig,
    output: OutputKind,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let FileConfig { device, udp } = config;

    let endpoint = UdpEndpoint::bind(udp)
        .await
        .context("Failed to bind UDP endpoint")?;
    let local = endpoint.local_addr()?;

    println!(
        "{} Emulating SideKick {} on {}",
        "SIDEKICK".cyan().bold(),
        device.name.green(),
        local
    );
    match device.peer {
        PeerPolicy::Dynamic => println!("  Controller: first to subscribe"),
        PeerPolicy::Fixed(addr) => println!("  Controller: {} (fixed)", addr),
    }
    println!("  Group:      {}", device.group_number);
    println!("  Press Ctrl+C to stop");

    let emulator = SideKickEmulator::new(device, endpoint.sender());
    let mut emulator = match output {
        OutputKind::None => emulator.with_output(NullOutput),
        OutputKind::Log => emulator.with_output(LogOutput::new()),
        OutputKind::Terminal => emulator.with_output(TerminalOutput::new()),
    };

    endpoint.run(&mut emulator, shutdown_rx).await?;

    println!("{}", "Emulator stopped".yellow());
    Ok(())
}
