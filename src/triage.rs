use serde::Deserialize;

/// Accept/reject gate applied to inbound text before any remote call.
///
/// Lengths are counted in Unicode scalar values, not bytes, so a short
/// Japanese sentence is not mistaken for a long one.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TriagePolicy {
    /// Texts with this many characters or fewer are rejected
    pub min_length: usize,

    /// Texts with this many characters or more are rejected
    pub max_length: usize,

    /// Leading character that marks a bot command
    pub command_prefix: char,

    /// Prefixes that mark a bare link
    pub url_prefixes: Vec<String>,
}

impl Default for TriagePolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 60,
            command_prefix: '/',
            url_prefixes: vec!["http://".to_string(), "https://".to_string()],
        }
    }
}

impl TriagePolicy {
    /// Whether `text` is worth translating.
    pub fn should_process(&self, text: &str) -> bool {
        self.has_good_length(text) && !self.is_command(text) && !self.is_url(text)
    }

    /// Short enough to be a one-word request rather than a sentence.
    pub fn is_short(&self, text: &str) -> bool {
        text.chars().count() <= self.min_length
    }

    fn has_good_length(&self, text: &str) -> bool {
        let len = text.chars().count();
        len > self.min_length && len < self.max_length
    }

    fn is_command(&self, text: &str) -> bool {
        text.starts_with(self.command_prefix)
    }

    fn is_url(&self, text: &str) -> bool {
        self.url_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
    }
}
