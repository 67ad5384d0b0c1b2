//! Policy file: triage bounds, language pool, reply titles and routing rules.
//!
//! Every section is optional and falls back to the built-in defaults, so an
//! empty file (or no file at all) reproduces the stock deployment.

use crate::i18n::{LanguagePool, LanguagePoolConfig, ReplyTitles};
use crate::router::{MessageRouter, RouterConfig};
use crate::triage::TriagePolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Policy {
    pub triage: TriagePolicy,
    pub languages: LanguagePoolConfig,
    pub titles: ReplyTitles,
    pub router: RouterConfig,
}

impl Policy {
    /// Load from an optional JSON file; `None` means built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid policy file {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Policy = serde_json::from_str(json).context("Failed to parse policy JSON")?;
        policy.validate()?;
        Ok(policy)
    }

    fn validate(&self) -> Result<()> {
        if self.triage.min_length >= self.triage.max_length {
            anyhow::bail!(
                "triage.min_length ({}) must be smaller than triage.max_length ({})",
                self.triage.min_length,
                self.triage.max_length
            );
        }
        Ok(())
    }

    pub fn language_pool(&self) -> LanguagePool {
        LanguagePool::new(self.languages.clone())
    }

    pub fn message_router(&self) -> MessageRouter {
        MessageRouter::new(self.router.clone(), self.triage.clone())
    }
}
