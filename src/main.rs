//! RIS Foods site API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  SITE API                        │
//!     Browser request    │  ┌──────────┐   ┌──────────┐   ┌─────────────┐  │
//!     ───────────────────┼─▶│  origin  │──▶│admission │──▶│  handlers   │  │
//!                        │  │   gate   │   │ control  │   │ forms, chat │  │
//!                        │  └──────────┘   └──────────┘   └──────┬──────┘  │
//!                        │                                       │         │
//!                        │            ┌──────────────┬───────────┼─────┐   │
//!                        │            ▼              ▼           ▼     │   │
//!                        │      ┌──────────┐   ┌──────────┐ ┌────────┐ │   │
//!                        │      │ database │   │  outbox  │ │ model  │ │   │
//!                        │      │ (rows)   │   │ (email)  │ │ (chat) │ │   │
//!                        │      └──────────┘   └──────────┘ └────────┘ │   │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use ris_foods_api::config::load_config;
use ris_foods_api::lifecycle::{shutdown_signal, Shutdown};
use ris_foods_api::observability::{logging, metrics};
use ris_foods_api::HttpServer;

#[derive(Parser)]
#[command(name = "ris-foods-api")]
#[command(about = "Backend API for the RIS Foods website", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "RIS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    if args.check {
        println!("configuration ok");
        return ExitCode::SUCCESS;
    }

    logging::init_logging(&config.observability.log_level);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ris_foods_api::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ris-foods-api starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limited = ?config.rate_limit.endpoints,
        request_timeout_secs = config.timeouts.request_secs,
        diagnostics = config.observability.diagnostics,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    server.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
