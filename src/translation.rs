use crate::error::ProviderError;
use crate::i18n::LanguageTag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Detects the language of a text.
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    async fn detect(&self, text: &str) -> std::result::Result<LanguageTag, ProviderError>;
}

/// Translates a text into one target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target: &LanguageTag,
    ) -> std::result::Result<String, ProviderError>;
}

pub const DEFAULT_TRANSLATE_API_URL: &str =
    "https://translation.googleapis.com/language/translate/v2";

/// Language code Google returns when it cannot tell.
const UNDETERMINED: &str = "und";

// Google Cloud Translation v2 wire types
#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct DetectData {
    detections: Vec<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedText {
    translated_text: String,
}

/// Google Cloud Translation (v2, API key) client.
///
/// One instance is built at startup and shared by every message; it serves as
/// both the language detector and the translator.
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl GoogleTranslate {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build translate HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn post<B, T>(&self, url: &str, body: &B) -> std::result::Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let response = ProviderError::check(response).await?;
        let parsed: ApiResponse<T> = response.json().await?;
        Ok(parsed.data)
    }
}

#[async_trait]
impl LanguageDetector for GoogleTranslate {
    async fn detect(&self, text: &str) -> std::result::Result<LanguageTag, ProviderError> {
        let url = format!("{}/detect", self.api_url);
        let data: DetectData = self.post(&url, &DetectRequest { q: text }).await?;

        let detection = data
            .detections
            .into_iter()
            .next()
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or_else(|| ProviderError::empty("no language detections"))?;

        debug!(
            "Detected language {} (confidence {:.2})",
            detection.language, detection.confidence
        );

        let tag = LanguageTag::new(&detection.language);
        if tag.is_empty() || tag.code() == UNDETERMINED {
            return Err(ProviderError::empty("language undetermined"));
        }
        Ok(tag)
    }
}

#[async_trait]
impl Translator for GoogleTranslate {
    async fn translate(
        &self,
        text: &str,
        target: &LanguageTag,
    ) -> std::result::Result<String, ProviderError> {
        let request = TranslateRequest {
            q: text,
            target: target.code(),
            format: "text",
        };
        let data: TranslateData = self.post(&self.api_url, &request).await?;

        data.translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ProviderError::empty(format!("no translation into {}", target)))
    }
}
