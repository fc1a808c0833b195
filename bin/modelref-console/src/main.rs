//! modelref-console – entry point.
//!
//! Startup order:
//! 1. Parse the command line and configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Build the reference service client.
//! 4. Either serve the HTTP console with graceful shutdown, or run a single
//!    CLI command and exit.

mod cli;
mod config;
mod error;
mod middleware;
mod routes;
mod schemas;
mod snapshot;
mod state;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use modelref_client::ReferenceApi;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Command line + configuration ───────────────────────────────────────
    let cli = Cli::parse();
    let mut cfg = Config::from_env().with_overrides(cli.base_url.clone(), cli.api_key.clone());

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(f) => f,
            Err(_) => match cfg.log_level.parse::<EnvFilter>() {
                Ok(f) => f,
                Err(e) => {
                    eprintln!(
                        "WARN: MODELREF_LOG='{}' is not a valid tracing filter ({}); \
                         falling back to 'info'",
                        cfg.log_level, e
                    );
                    EnvFilter::new("info")
                }
            },
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    // ── 3. Reference service client ────────────────────────────────────────────
    let api: Arc<dyn ReferenceApi> = Arc::new(cfg.reference_client()?);

    // ── 4. Dispatch ────────────────────────────────────────────────────────────
    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.bind_address = bind;
            }
            serve(cfg, api).await
        }
        command => cli::run(command, api, &mut std::io::stdout()).await,
    }
}

async fn serve(cfg: Config, api: Arc<dyn ReferenceApi>) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %cfg.base_url,
        "modelref-console starting"
    );
    if cfg.api_key.is_none() {
        warn!("MODELREF_API_KEY is not set; writes need an apikey header");
    }

    let addr: SocketAddr = cfg.bind_address.parse()?;
    let state = Arc::new(AppState::new(cfg, api));
    let app = routes::build(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("modelref-console stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
