//! Language handling for the relay.
//!
//! # Architecture
//!
//! - `language`: normalized `LanguageTag` shared by detector, translator and policy
//! - `registry`: the language pool, mapping a source language to its targets
//! - `titles`: per-sender reply titles
//!
//! # Example
//!
//! ```rust,ignore
//! use translate_bot::i18n::{LanguagePool, LanguageTag};
//!
//! let pool = LanguagePool::default();
//! let targets = pool.select_targets(&LanguageTag::new("zh"));
//! ```

mod language;
mod registry;
mod titles;

pub use language::LanguageTag;
pub use registry::{LanguagePool, LanguagePoolConfig};
pub use titles::ReplyTitles;
