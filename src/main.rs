use ai_chat_relay::config::{load_server_config, AppConfig};
use ai_chat_relay::relay::{RelayHandler, UpstreamClient};
use ai_chat_relay::routes::create_router;
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    info!("Starting AI chat relay server...");

    let args = Args::parse();

    let server_config =
        load_server_config(args.config.as_deref()).context("Failed to load configuration")?;

    // The key is resolved per request, so a missing one is not fatal at
    // startup; it just means every chat/models request will 500.
    if !AppConfig::from_env().api.has_api_key() {
        warn!("AI_API_KEY is not set; chat and model requests will fail until it is configured");
    }

    let bind_addr = args.bind.unwrap_or(server_config.bind_addr.clone());

    let upstream = UpstreamClient::new().context("Failed to create upstream client")?;
    let handler = Arc::new(RelayHandler::new(upstream));

    let app = create_router(handler, server_config.request_body_limit_bytes);

    info!("Server starting on {}", bind_addr);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("AI chat relay running at http://{}/", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.graceful_shutdown_duration()))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_chat_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

async fn shutdown_signal(grace_period: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    // Give the server some time to finish ongoing requests
    if grace_period > Duration::ZERO {
        info!(
            "Waiting {}s for ongoing requests to complete...",
            grace_period.as_secs()
        );
        tokio::time::sleep(grace_period).await;
    }
}
