use anyhow::{Context, Result};
use clap::Parser;
use sonatina::{web, AppState, ServerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// The sonatina analysis server
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (replaces ./sonatina.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) =
        ServerConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    for path in &sources.files {
        tracing::info!("Loaded config file: {}", path.display());
    }
    if !sources.env_overrides.is_empty() {
        tracing::info!("Environment overrides: {}", sources.env_overrides.join(", "));
    }

    let addr = format!("{}:{}", config.bind, config.port);

    tracing::info!("🎼 Sonatina analysis server starting on http://{}", addr);
    tracing::info!("   Analyze: POST http://{}/analyze (multipart MIDI upload)", addr);
    tracing::info!("   Health: GET http://{}/health", addr);
    tracing::info!("   Max upload: {} bytes", config.max_upload_bytes);

    let app = web::router(AppState::new(), config.max_upload_bytes);

    let bind_addr: std::net::SocketAddr = addr.parse().context("Failed to parse bind address")?;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("🎵 Server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolve when the process should shut down.
///
/// Handles both SIGINT (Ctrl+C) and SIGTERM (docker stop, systemd, etc.)
async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
                sigterm.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
