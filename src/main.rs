//! waypoint: location-based reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http server ──▶ location table ──┬──▶ static files
//!                    (request id,    (exact/subtree,  │
//!                     trace span)     longest wins)   └──▶ routing rule
//!                                                            │
//!                                                            ▼
//!                                                      backend pool
//!                                                  (round-robin, health)
//!                                                            │
//!     Client Response                                        ▼
//!     ◀───────────── hop-by-hop stripped ◀──────── request forwarder ──▶ Backend
//!
//!     Cross-cutting: config + hot reload, health probes, admin API,
//!                    logging, metrics, lifecycle
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use waypoint::config::{load_config, loader::log_summary};
use waypoint::lifecycle;
use waypoint::observability::logging;

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(version, about = "Location-based reverse proxy", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", args.config.display());
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "waypoint starting");

    if args.check {
        log_summary(&config);
        tracing::info!(path = %args.config.display(), "Configuration is valid");
        return ExitCode::SUCCESS;
    }

    match lifecycle::run(config, &args.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
