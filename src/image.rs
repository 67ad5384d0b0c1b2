use crate::error::ProviderError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_GCSE_API_URL: &str = "https://www.googleapis.com/customsearch/v1";
pub const DEFAULT_BING_SEARCH_URL: &str =
    "https://api.cognitive.microsoft.com/bing/v7.0/images/search";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const BING_MARKET: &str = "ja-jp";
const BING_IMAGE_COUNT: u32 = 10;

/// One image search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub title: String,
    pub link: String,
}

/// An image search backend.
///
/// Zero hits is reported as `ProviderError::Empty`, so callers only ever see
/// a non-empty list on success.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> std::result::Result<Vec<Image>, ProviderError>;
}

/// Pick one image uniformly at random.
pub fn random_image(images: &[Image]) -> Option<&Image> {
    images.choose(&mut rand::thread_rng())
}

fn search_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(SEARCH_TIMEOUT)
        .build()
        .context("Failed to build image search HTTP client")
}

fn non_empty_query(query: &str) -> std::result::Result<&str, ProviderError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ProviderError::empty("query string is empty"));
    }
    Ok(query)
}

// ==================== Google Custom Search ====================

#[derive(Debug, Deserialize)]
struct GcseResponse {
    #[serde(default)]
    items: Vec<GcseItem>,
}

#[derive(Debug, Deserialize)]
struct GcseItem {
    #[serde(default)]
    title: String,
    link: String,
}

/// Google Custom Search Engine in image mode.
#[derive(Debug, Clone)]
pub struct GoogleCustomSearch {
    client: reqwest::Client,
    api_url: String,
    engine_id: String,
    api_key: String,
}

impl GoogleCustomSearch {
    pub fn new(api_url: &str, engine_id: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: search_client()?,
            api_url: api_url.to_string(),
            engine_id: engine_id.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for GoogleCustomSearch {
    async fn search(&self, query: &str) -> std::result::Result<Vec<Image>, ProviderError> {
        let query = non_empty_query(query)?;
        debug!("Searching Google CSE images for '{}'", query);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("searchType", "image"),
                ("q", query),
            ])
            .send()
            .await?;

        let response = ProviderError::check(response).await?;
        let parsed: GcseResponse = response.json().await?;

        if parsed.items.is_empty() {
            return Err(ProviderError::empty(format!("0 images for '{}'", query)));
        }

        info!("Google CSE returned {} image results", parsed.items.len());

        Ok(parsed
            .items
            .into_iter()
            .map(|item| Image {
                title: item.title,
                link: item.link,
            })
            .collect())
    }
}

// ==================== Bing Image Search ====================

#[derive(Debug, Deserialize)]
struct BingResponse {
    #[serde(default)]
    value: Vec<BingImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingImage {
    #[serde(default)]
    name: String,
    content_url: String,
}

/// Bing Image Search (v7).
#[derive(Debug, Clone)]
pub struct BingImageSearch {
    client: reqwest::Client,
    api_url: String,
    subscription_key: String,
}

impl BingImageSearch {
    pub fn new(api_url: &str, subscription_key: &str) -> Result<Self> {
        if subscription_key.trim().is_empty() {
            anyhow::bail!("Bing image search needs a non-empty subscription key");
        }

        Ok(Self {
            client: search_client()?,
            api_url: api_url.to_string(),
            subscription_key: subscription_key.to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for BingImageSearch {
    async fn search(&self, query: &str) -> std::result::Result<Vec<Image>, ProviderError> {
        let query = non_empty_query(query)?;
        debug!("Searching Bing images for '{}'", query);

        let count = BING_IMAGE_COUNT.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .query(&[("q", query), ("mkt", BING_MARKET), ("count", count.as_str())])
            .send()
            .await?;

        let response = ProviderError::check(response).await?;
        let parsed: BingResponse = response.json().await?;

        if parsed.value.is_empty() {
            return Err(ProviderError::empty(format!("0 images for '{}'", query)));
        }

        info!("Bing returned {} image results", parsed.value.len());

        Ok(parsed
            .value
            .into_iter()
            .map(|image| Image {
                title: image.name,
                link: image.content_url,
            })
            .collect())
    }
}
