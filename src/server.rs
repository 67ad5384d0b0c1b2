use crate::config::{Config, ImageProviderConfig};
use crate::image::{BingImageSearch, GoogleCustomSearch, SearchProvider};
use crate::metrics::RelayMetrics;
use crate::policy::Policy;
use crate::relay::Relay;
use crate::router::MessageRouter;
use crate::security::{verify_webhook_secret, SECRET_TOKEN_HEADER};
use crate::telegram::{self, TelegramClient, Update};
use crate::translation::GoogleTranslate;
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Everything a webhook call needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
    pub router: MessageRouter,
    pub images: Arc<dyn SearchProvider>,
    pub telegram: TelegramClient,
    pub webhook_secret: String,
    pub metrics: Arc<RelayMetrics>,
    /// Updates still being handled; drained on shutdown
    pub tasks: TaskTracker,
}

impl AppState {
    /// Build long-lived provider clients from configuration and policy.
    pub fn from_config(config: &Config, policy: &Policy) -> Result<Self> {
        let call_timeout = Duration::from_secs(config.translate_timeout_secs);
        let translate = Arc::new(GoogleTranslate::new(
            &config.translate_api_url,
            &config.translate_api_key,
            call_timeout,
        )?);

        let images: Arc<dyn SearchProvider> = match &config.image_provider {
            ImageProviderConfig::GoogleCustomSearch {
                api_url,
                engine_id,
                api_key,
            } => Arc::new(GoogleCustomSearch::new(api_url, engine_id, api_key)?),
            ImageProviderConfig::Bing {
                api_url,
                subscription_key,
            } => Arc::new(BingImageSearch::new(api_url, subscription_key)?),
        };

        let metrics = Arc::new(RelayMetrics::new());
        let relay = Relay::new(translate.clone(), translate)
            .with_triage(policy.triage.clone())
            .with_pool(policy.language_pool())
            .with_titles(policy.titles.clone())
            .with_call_timeout(call_timeout)
            .with_metrics(metrics.clone());

        Ok(Self {
            relay,
            router: policy.message_router(),
            images,
            telegram: TelegramClient::new(&config.telegram_api_url, &config.telegram_bot_token),
            webhook_secret: config.telegram_webhook_secret.clone(),
            metrics,
            tasks: TaskTracker::new(),
        })
    }
}

/// Build the HTTP app (shared between production startup and tests).
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Accept a Telegram update and process it in its own task.
///
/// Telegram retries on slow or failed responses, so the update is
/// acknowledged immediately and handled in the background. The secret is
/// checked before the body is parsed.
async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let provided = headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    if !verify_webhook_secret(&state.webhook_secret, provided) {
        warn!("Rejected webhook call with missing or invalid secret token");
        return StatusCode::UNAUTHORIZED;
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Rejected malformed webhook body: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    let tasks = state.tasks.clone();
    tasks.spawn(async move {
        let update_id = update.update_id;
        if let Err(e) = telegram::handle_update(&state, update).await {
            error!("Failed to handle update {}: {:#}", update_id, e);
        }
    });

    StatusCode::OK
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "metrics": state.metrics.report(),
    }))
}
