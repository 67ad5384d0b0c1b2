use crate::triage::TriagePolicy;
use serde::Deserialize;

/// Keyword and prefix rules for the image path.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RouterConfig {
    /// Case-insensitive prefixes that turn the rest of the text into an image query
    pub image_prefixes: Vec<String>,

    /// Short texts containing any of these (lowercased) are image requests
    pub keywords: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            image_prefixes: vec!["p ".to_string()],
            keywords: ["cat", "dog", "ねこ", "猫", "犬", "いぬ"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Where an inbound message should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ImageSearch { query: String },
    Translate,
}

/// Chooses between the image path and the translation path.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    config: RouterConfig,
    triage: TriagePolicy,
}

impl MessageRouter {
    /// `triage` supplies the length below which a message counts as short.
    pub fn new(config: RouterConfig, triage: TriagePolicy) -> Self {
        Self { config, triage }
    }

    pub fn route(&self, text: &str) -> Route {
        if let Some(query) = self.strip_image_prefix(text) {
            return Route::ImageSearch {
                query: query.to_string(),
            };
        }

        if self.triage.is_short(text) && self.contains_keyword(text) {
            return Route::ImageSearch {
                query: text.to_string(),
            };
        }

        Route::Translate
    }

    fn strip_image_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.config.image_prefixes.iter().find_map(|prefix| {
            let head = text.get(..prefix.len())?;
            head.eq_ignore_ascii_case(prefix)
                .then(|| &text[prefix.len()..])
        })
    }

    fn contains_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.config
            .keywords
            .iter()
            .any(|keyword| lower.contains(keyword.as_str()))
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default(), TriagePolicy::default())
    }
}
