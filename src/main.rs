//! Gestura - landmark-driven OSC controller
//!
//! Main entry point for the CLI application.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gestura::{
    config::{AddressScheme, Config},
    output::OscDispatcher,
    tracking::LandmarkReceiver,
    ControlPipeline,
};

/// Gestura - turn face and hand landmarks into OSC control channels
#[derive(Parser, Debug)]
#[command(name = "gestura", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// UDP port to receive landmark packets on (overrides config)
    #[arg(short = 'l', long)]
    listen_port: Option<u16>,

    /// OSC target as host:port (overrides config)
    #[arg(short, long)]
    target: Option<String>,

    /// OSC address scheme: legacy or named (overrides config)
    #[arg(short, long)]
    scheme: Option<AddressScheme>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    let config = load_config(&args)?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("Starting {} v{}", gestura::NAME, gestura::VERSION);
    info!(
        "Eyes: threshold {} / dwell {} ms, hands: {:?} (debounce {})",
        config.eyes.closed_threshold,
        config.eyes.dwell_ms,
        config.hands.policy,
        config.hands.debounce_frames
    );

    // One thread: frame acquisition is the only await in the control loop
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let stats = runtime.block_on(async {
        let mut receiver = LandmarkReceiver::new(&config.source);
        receiver.start().await?;
        let dispatcher = OscDispatcher::new(&config.osc)?;
        let mut pipeline = ControlPipeline::new(&config);

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
        });

        let stats = gestura::run(&mut receiver, &mut pipeline, &dispatcher, shutdown_rx).await;
        receiver.stop();
        anyhow::Ok(stats)
    })?;

    info!(
        "Gestura stopped ({} cycles, {} skipped, {} messages, {} send failures)",
        stats.processed, stats.skipped, stats.messages_sent, stats.send_failures
    );
    Ok(())
}

/// Load configuration and apply CLI overrides
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    if let Some(port) = args.listen_port {
        config.source.port = port;
    }
    if let Some(ref target) = args.target {
        let (host, port) = target
            .rsplit_once(':')
            .context("--target must be host:port")?;
        config.osc.target_host = host.trim_matches(|c| c == '[' || c == ']').to_string();
        config.osc.target_port = port
            .parse()
            .with_context(|| format!("invalid port in --target '{}'", target))?;
    }
    if let Some(scheme) = args.scheme {
        config.osc.scheme = scheme;
    }

    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
