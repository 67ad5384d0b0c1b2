//! Language pool: which languages a message gets translated into.
//!
//! The pool is a lookup table from a detected source language to the ordered
//! list of target languages, plus a fallback list used for any source language
//! the table does not know. Both come from the policy file, so the pool can
//! grow without code changes.

use crate::i18n::LanguageTag;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Raw pool settings as they appear in the policy file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguagePoolConfig {
    /// Source language code -> ordered target language codes
    pub targets: BTreeMap<LanguageTag, Vec<LanguageTag>>,

    /// Targets for source languages missing from `targets`
    pub fallback: Vec<LanguageTag>,
}

impl Default for LanguagePoolConfig {
    /// Chinese, Japanese and English.
    fn default() -> Self {
        let tags = |codes: &[&str]| -> Vec<LanguageTag> {
            codes.iter().map(|c| LanguageTag::new(c)).collect()
        };

        let mut targets = BTreeMap::new();
        targets.insert(LanguageTag::new("zh"), tags(&["ja", "en"]));
        targets.insert(LanguageTag::new("en"), tags(&["ja", "zh"]));
        targets.insert(LanguageTag::new("ja"), tags(&["en"]));

        Self {
            targets,
            fallback: tags(&["ja", "en", "zh"]),
        }
    }
}

/// Target language selector.
///
/// Every row is deduplicated on construction and never contains its own key,
/// so `select_targets` output is duplicate-free and excludes the source.
#[derive(Debug, Clone)]
pub struct LanguagePool {
    targets: BTreeMap<LanguageTag, Vec<LanguageTag>>,
    fallback: Vec<LanguageTag>,
}

impl LanguagePool {
    pub fn new(config: LanguagePoolConfig) -> Self {
        let targets = config
            .targets
            .into_iter()
            .map(|(source, row)| {
                let row = dedup(row.into_iter().filter(|t| *t != source));
                (source, row)
            })
            .collect();

        Self {
            targets,
            fallback: dedup(config.fallback.into_iter()),
        }
    }

    /// Ordered target languages for a detected source language.
    ///
    /// Lookup tries the exact code first, then the primary subtag, so a
    /// detector reporting "zh-CN" uses the "zh" row. Unknown languages get the
    /// fallback list minus anything in the same primary language as the source.
    pub fn select_targets(&self, source: &LanguageTag) -> Vec<LanguageTag> {
        if let Some(row) = self.row_for(source) {
            return row.iter().filter(|t| *t != source).cloned().collect();
        }

        self.fallback
            .iter()
            .filter(|t| !t.same_language(source))
            .cloned()
            .collect()
    }

    /// True if the source language has its own row in the pool.
    pub fn is_known(&self, source: &LanguageTag) -> bool {
        self.row_for(source).is_some()
    }

    fn row_for(&self, source: &LanguageTag) -> Option<&Vec<LanguageTag>> {
        self.targets
            .get(source)
            .or_else(|| self.targets.get(&LanguageTag::new(source.primary())))
    }
}

impl Default for LanguagePool {
    fn default() -> Self {
        Self::new(LanguagePoolConfig::default())
    }
}

impl From<LanguagePoolConfig> for LanguagePool {
    fn from(config: LanguagePoolConfig) -> Self {
        Self::new(config)
    }
}

/// Drop repeated tags, keeping the first occurrence.
fn dedup(tags: impl Iterator<Item = LanguageTag>) -> Vec<LanguageTag> {
    let mut seen = Vec::new();
    for tag in tags {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}
