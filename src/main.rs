use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workflow_relay::chat::SlackClient;
use workflow_relay::ci::OctocrabClient;
use workflow_relay::config::Config;
use workflow_relay::relay::{RelayState, processor_builder};
use workflow_relay::server::{AppState, build_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workflow_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(?config, "Loaded configuration");

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Relay failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let ci = OctocrabClient::from_token(config.github_token.clone())?;
    let chat = SlackClient::new(config.slack_token.clone());
    let state = RelayState::new(chat, ci, config.slack_channel.clone(), config.cache_capacity)
        .with_opt_in_flag(config.opt_in_flag.clone());
    let processor = processor_builder(state).start();

    let app = build_router(AppState::new(config.webhook_secret.as_bytes(), processor.queue()));
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    match processor.shutdown(config.drain_timeout).await {
        Ok(state) => {
            info!(cached_runs = state.cache.len(), "Relay stopped");
            for (run, message) in state.cache.entries() {
                debug!(run = %run, message = %message, "Forgetting cached run");
            }
        }
        Err(e) => warn!(error = %e, "Relay stopped without draining"),
    }
    Ok(())
}
