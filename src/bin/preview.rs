//! Preview binary - runs the translation fan-out for one text without Telegram
//!
//! Usage:
//!   cargo run --bin preview -- "你好世界在这里"
//!   cargo run --bin preview -- "good morning everyone" --sender Tanaka
//!
//! Required environment variables:
//! - TRANSLATE_API_KEY
//!
//! Optional:
//! - TRANSLATE_API_URL (defaults to the Google Cloud Translation v2 endpoint)
//! - TRANSLATE_TIMEOUT_SECS (defaults to 10)
//! - POLICY_FILE (defaults to the built-in policy)

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use translate_bot::{
    policy::Policy,
    relay::{Outcome, Relay},
    translation::{GoogleTranslate, DEFAULT_TRANSLATE_API_URL},
};

/// Minimal config for preview (no Telegram or image search required)
struct PreviewConfig {
    translate_api_key: String,
    translate_api_url: String,
    translate_timeout_secs: u64,
    policy_file: Option<String>,
}

impl PreviewConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            translate_api_key: std::env::var("TRANSLATE_API_KEY")
                .context("TRANSLATE_API_KEY not set")?,
            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_TRANSLATE_API_URL.to_string()),
            translate_timeout_secs: std::env::var("TRANSLATE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            policy_file: std::env::var("POLICY_FILE").ok(),
        })
    }
}

struct Args {
    text: String,
    sender: String,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut text = None;
    let mut sender = String::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--sender" {
            sender = iter.next().context("--sender needs a value")?.clone();
        } else if text.is_none() {
            text = Some(arg.clone());
        } else {
            anyhow::bail!("Unexpected argument: {}", arg);
        }
    }

    Ok(Args {
        text: text.context("Usage: preview <text> [--sender NAME]")?,
        sender,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translate_bot=info".parse()?),
        )
        .init();

    // Load environment from .env file
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args)?;

    info!("Loading configuration...");
    let config = PreviewConfig::from_env()?;
    let policy = Policy::load(config.policy_file.as_deref().map(Path::new))?;

    let call_timeout = Duration::from_secs(config.translate_timeout_secs);
    let translate = Arc::new(GoogleTranslate::new(
        &config.translate_api_url,
        &config.translate_api_key,
        call_timeout,
    )?);

    let relay = Relay::new(translate.clone(), translate)
        .with_triage(policy.triage.clone())
        .with_pool(policy.language_pool())
        .with_titles(policy.titles.clone())
        .with_call_timeout(call_timeout);

    let text = args.text.trim();

    println!();
    match relay.process(&args.sender, text).await {
        Outcome::Skipped => {
            println!("Skipped: too short, too long, a command or a URL");
        }
        Outcome::Undetected => {
            println!("Skipped: language could not be detected");
        }
        Outcome::Translated(reply) => {
            println!("--- Reply (as sent to Telegram) ---");
            println!();
            print!("{}", reply);
            println!();
            println!("--- End of Reply ---");
            println!(
                "{} translation(s), title: {:?}",
                reply.translations.len(),
                reply.title
            );
        }
    }
    println!();

    Ok(())
}
