use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use translate_bot::{config::Config, policy::Policy, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translate_bot=info".parse()?),
        )
        .init();

    info!("Starting translate bot");

    // Missing credentials abort startup here
    let config = Config::from_env()?;
    let policy = Policy::load(config.policy_file.as_deref().map(Path::new))?;

    let state = server::AppState::from_config(&config, &policy)?;

    if let Some(webhook_url) = &config.telegram_webhook_url {
        info!("Registering webhook {}", webhook_url);
        state
            .telegram
            .set_webhook(webhook_url, &config.telegram_webhook_secret)
            .await
            .context("Failed to register Telegram webhook")?;
    }

    let state = Arc::new(state);
    let app = server::build_app(state.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Finish replies to updates Telegram has already been told we accepted
    state.tasks.close();
    if !state.tasks.is_empty() {
        info!("Waiting for {} update(s) in flight", state.tasks.len());
    }
    state.tasks.wait().await;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
