//! Translation fan-out.
//!
//! `Relay::process` triages a message, detects its language, translates it
//! into every target language of the pool concurrently and assembles the
//! reply. Provider failures never escape: a failed detection drops the reply,
//! a failed translation drops that one language.

use crate::error::ProviderError;
use crate::i18n::{LanguagePool, LanguageTag, ReplyTitles};
use crate::metrics::RelayMetrics;
use crate::translation::{LanguageDetector, Translator};
use crate::triage::TriagePolicy;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// One successful translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub target: LanguageTag,
    pub text: String,
}

/// Reply to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BotReply {
    pub title: Option<String>,
    /// In target-selection order
    pub translations: Vec<Translation>,
}

impl BotReply {
    /// True when rendering would produce no text at all.
    pub fn is_blank(&self) -> bool {
        self.translations.is_empty() && self.title.as_deref().map_or(true, str::is_empty)
    }
}

impl fmt::Display for BotReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            writeln!(f, "{}", title)?;
        }
        for translation in &self.translations {
            writeln!(f, "{}: {}", translation.target, translation.text)?;
        }
        Ok(())
    }
}

/// Result of processing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rejected by triage; no remote call was made
    Skipped,
    /// Language detection failed; no translation was attempted
    Undetected,
    /// Processed, possibly with fewer translations than targets
    Translated(BotReply),
}

impl Outcome {
    pub fn handled(&self) -> bool {
        matches!(self, Outcome::Translated(_))
    }

    pub fn into_reply(self) -> Option<BotReply> {
        match self {
            Outcome::Translated(reply) => Some(reply),
            _ => None,
        }
    }
}

/// The fan-out engine.
///
/// Holds long-lived provider clients; cloning is cheap and shares them.
#[derive(Clone)]
pub struct Relay {
    detector: Arc<dyn LanguageDetector>,
    translator: Arc<dyn Translator>,
    triage: TriagePolicy,
    pool: LanguagePool,
    titles: ReplyTitles,
    call_timeout: Duration,
    metrics: Arc<RelayMetrics>,
}

impl Relay {
    /// Create a relay with the default policy.
    pub fn new(detector: Arc<dyn LanguageDetector>, translator: Arc<dyn Translator>) -> Self {
        Self {
            detector,
            translator,
            triage: TriagePolicy::default(),
            pool: LanguagePool::default(),
            titles: ReplyTitles::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            metrics: Arc::new(RelayMetrics::new()),
        }
    }

    pub fn with_triage(mut self, triage: TriagePolicy) -> Self {
        self.triage = triage;
        self
    }

    pub fn with_pool(mut self, pool: LanguagePool) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_titles(mut self, titles: ReplyTitles) -> Self {
        self.titles = titles;
        self
    }

    /// Timeout applied to each provider call on its own.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<RelayMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Whether `text` would get past triage.
    pub fn should_process(&self, text: &str) -> bool {
        self.triage.should_process(text)
    }

    /// Process one message from `sender`.
    pub async fn process(&self, sender: &str, text: &str) -> Outcome {
        if !self.triage.should_process(text) {
            debug!("Message is too short, too long, a command or a URL, skipping");
            self.metrics.record_skipped();
            return Outcome::Skipped;
        }

        let source = match self.detect(text).await {
            Ok(source) => source,
            Err(e) => {
                warn!("Failed to detect message language, skipping reply: {}", e);
                self.metrics.record_detection_failure();
                return Outcome::Undetected;
            }
        };
        info!("Detected message language: {}", source);

        if !self.pool.is_known(&source) {
            debug!("No language pool row for {}, using the fallback targets", source);
        }
        let targets = self.pool.select_targets(&source);
        let translations = self.translate_all(text, &targets).await;
        self.metrics
            .record_translations(targets.len(), targets.len() - translations.len());

        if translations.len() < targets.len() {
            info!(
                "Got {}/{} translations for message from {}",
                translations.len(),
                targets.len(),
                sender
            );
        }

        let title = self.titles.title(sender, &source);
        self.metrics.record_reply();

        Outcome::Translated(BotReply {
            title,
            translations,
        })
    }

    async fn detect(&self, text: &str) -> Result<LanguageTag, ProviderError> {
        match timeout(self.call_timeout, self.detector.detect(text)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.call_timeout)),
        }
    }

    /// Translate into every target at once. `join_all` yields results in
    /// input order, so the reply follows target order, not completion order.
    async fn translate_all(&self, text: &str, targets: &[LanguageTag]) -> Vec<Translation> {
        let calls = targets.iter().map(|target| self.translate_one(text, target));
        join_all(calls).await.into_iter().flatten().collect()
    }

    async fn translate_one(&self, text: &str, target: &LanguageTag) -> Option<Translation> {
        let result = match timeout(self.call_timeout, self.translator.translate(text, target)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.call_timeout)),
        };

        match result {
            Ok(translated) => Some(Translation {
                target: target.clone(),
                text: translated,
            }),
            Err(e) => {
                warn!("Failed to translate into {}: {}", target, e);
                None
            }
        }
    }
}
