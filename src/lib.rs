pub mod config;
pub mod error;
pub mod i18n;
pub mod image;
pub mod metrics;
pub mod policy;
pub mod relay;
pub mod router;
pub mod security;
pub mod server;
pub mod telegram;
pub mod translation;
pub mod triage;
