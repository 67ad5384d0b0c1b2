//! Language tag: a normalized, comparable language identifier.
//!
//! Tags come from two places: the language detector, which reports whatever
//! the provider returns (e.g. "zh-CN"), and the policy file, which names the
//! language pool. Both go through the same normalization so they compare equal.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A BCP-47 style language code (e.g. "en", "ja", "zh-cn").
///
/// Codes are trimmed and lowercased on construction, so equality is
/// case-insensitive with respect to the original input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageTag {
    code: String,
}

impl LanguageTag {
    /// Create a tag from any code string.
    pub fn new(code: &str) -> Self {
        Self {
            code: code.trim().to_lowercase(),
        }
    }

    /// The normalized language code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The primary language subtag ("zh-cn" -> "zh", "en" -> "en").
    pub fn primary(&self) -> &str {
        self.code
            .split(['-', '_'])
            .next()
            .unwrap_or(self.code.as_str())
    }

    /// True if both tags name the same primary language.
    pub fn same_language(&self, other: &LanguageTag) -> bool {
        self.primary() == other.primary()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

impl Serialize for LanguageTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code)
    }
}

impl<'de> Deserialize<'de> for LanguageTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        let tag = LanguageTag::new(&code);
        if tag.is_empty() {
            return Err(serde::de::Error::custom("language code must not be empty"));
        }
        Ok(tag)
    }
}
