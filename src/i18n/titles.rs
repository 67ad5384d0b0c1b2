//! Reply titles: per-sender commentary placed above the translations.

use crate::i18n::LanguageTag;
use serde::Deserialize;
use std::collections::HashMap;

/// Reply policy keyed by sender identity.
///
/// `senders` maps a sender to a per-language commentary string. A known sender
/// always gets a title, blank when their entry has no text for the detected
/// language. Unknown senders get `unknown_speaker`, or no title at all when
/// that is not configured.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReplyTitles {
    pub senders: HashMap<String, HashMap<LanguageTag, String>>,
    pub unknown_speaker: Option<String>,
}

impl ReplyTitles {
    /// Title for a reply to `sender` whose message was detected as `source`.
    pub fn title(&self, sender: &str, source: &LanguageTag) -> Option<String> {
        match self.senders.get(sender) {
            Some(by_language) => Some(
                by_language
                    .get(source)
                    .or_else(|| by_language.get(&LanguageTag::new(source.primary())))
                    .cloned()
                    .unwrap_or_default(),
            ),
            None => self.unknown_speaker.clone(),
        }
    }
}
