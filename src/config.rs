use crate::image::{DEFAULT_BING_SEARCH_URL, DEFAULT_GCSE_API_URL};
use crate::translation::DEFAULT_TRANSLATE_API_URL;
use anyhow::{Context, Result};

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Which image search backend answers image requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageProviderConfig {
    GoogleCustomSearch {
        api_url: String,
        engine_id: String,
        api_key: String,
    },
    Bing {
        api_url: String,
        subscription_key: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_url: String,
    pub telegram_webhook_secret: String,
    pub telegram_webhook_url: Option<String>,

    // Translation
    pub translate_api_key: String,
    pub translate_api_url: String,
    pub translate_timeout_secs: u64,

    // Image search
    pub image_provider: ImageProviderConfig,

    // Policy file (triage, language pool, titles, routing)
    pub policy_file: Option<String>,

    // Server
    pub port: u16,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Fails when a required credential is missing; the bot cannot run
    /// without them.
    pub fn from_env() -> Result<Self> {
        let translate_timeout_secs = std::env::var("TRANSLATE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        if translate_timeout_secs == 0 {
            anyhow::bail!("TRANSLATE_TIMEOUT_SECS must be at least 1");
        }

        Ok(Self {
            // Telegram
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN not set")?,
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| DEFAULT_TELEGRAM_API_URL.to_string()),
            telegram_webhook_secret: std::env::var("TELEGRAM_WEBHOOK_SECRET")
                .context("TELEGRAM_WEBHOOK_SECRET not set")?,
            telegram_webhook_url: optional_var("TELEGRAM_WEBHOOK_URL"),

            // Translation
            translate_api_key: std::env::var("TRANSLATE_API_KEY")
                .context("TRANSLATE_API_KEY not set")?,
            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_TRANSLATE_API_URL.to_string()),
            translate_timeout_secs,

            // Image search
            image_provider: image_provider_from_env()?,

            policy_file: optional_var("POLICY_FILE"),

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }
}

fn image_provider_from_env() -> Result<ImageProviderConfig> {
    let provider = std::env::var("IMAGE_PROVIDER").unwrap_or_else(|_| "gcse".to_string());

    match provider.to_lowercase().as_str() {
        "gcse" | "google" => Ok(ImageProviderConfig::GoogleCustomSearch {
            api_url: std::env::var("GCSE_API_URL")
                .unwrap_or_else(|_| DEFAULT_GCSE_API_URL.to_string()),
            engine_id: std::env::var("GCSE_ID").context("GCSE_ID not set")?,
            api_key: std::env::var("GCSE_API_KEY").context("GCSE_API_KEY not set")?,
        }),
        "bing" => Ok(ImageProviderConfig::Bing {
            api_url: std::env::var("BING_SEARCH_URL")
                .unwrap_or_else(|_| DEFAULT_BING_SEARCH_URL.to_string()),
            subscription_key: std::env::var("BING_SEARCH_KEY")
                .context("BING_SEARCH_KEY not set")?,
        }),
        other => anyhow::bail!("Unknown IMAGE_PROVIDER '{}', expected gcse or bing", other),
    }
}

/// Unset and blank both mean "not configured".
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
