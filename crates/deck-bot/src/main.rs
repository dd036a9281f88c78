//! Deck Bot binary.
//!
//! Watches one Nextcloud Deck board and posts card changes to Discord.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deck::DeckClient;
use deck_bot::{Args, LogFormat, Poller, PollerConfig, Settings};
use notify::DiscordChannel;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format)?;

    let settings = Settings::try_from(args).context("Invalid configuration")?;
    info!(settings = ?settings, "Starting deck-bot");

    let deck = DeckClient::new(
        settings.nextcloud_url.as_str(),
        settings.username.clone(),
        settings.password.clone(),
        settings.request_timeout,
    )
    .context("Failed to create Deck client")?;

    let discord = DiscordChannel::new(settings.webhook_url.as_str(), settings.request_timeout)
        .context("Failed to create Discord channel")?
        .with_thread_id(settings.thread_id.clone());

    let poller = Poller::new(
        Arc::new(deck),
        Arc::new(discord),
        PollerConfig::from(&settings),
    );

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        token.cancel();
    });

    poller.run(shutdown).await;

    Ok(())
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("deck_bot=info,deck=info,notify=info"))
        .context("Invalid RUST_LOG filter")?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
