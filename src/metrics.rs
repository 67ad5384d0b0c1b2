//! Relay counters.
//!
//! Tracks how inbound messages were handled and how often providers failed.
//! One instance is shared (behind an `Arc`) by the relay and the Telegram
//! handler, and reported on the health endpoint.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Text messages received from the chat platform
    messages_received: AtomicUsize,

    /// Messages rejected by triage
    messages_skipped: AtomicUsize,

    /// Messages dropped because detection failed
    detection_failures: AtomicUsize,

    /// Translation replies produced
    replies: AtomicUsize,

    /// Translate calls issued
    translations_requested: AtomicUsize,

    /// Translate calls that failed or timed out
    translation_failures: AtomicUsize,

    /// Image searches issued
    image_searches: AtomicUsize,

    /// Image searches that failed or found nothing
    image_search_failures: AtomicUsize,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_message(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.messages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detection_failure(&self) {
        self.detection_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reply(&self) {
        self.replies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_translations(&self, requested: usize, failed: usize) {
        self.translations_requested
            .fetch_add(requested, Ordering::Relaxed);
        self.translation_failures.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn record_image_search(&self, succeeded: bool) {
        self.image_searches.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.image_search_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Snapshot of all counters.
    pub fn report(&self) -> RelayReport {
        let requested = self.translations_requested.load(Ordering::Relaxed);
        let failed = self.translation_failures.load(Ordering::Relaxed);
        let translation_success_rate = if requested > 0 {
            ((requested - failed) as f64 / requested as f64) * 100.0
        } else {
            0.0
        };

        RelayReport {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_skipped: self.messages_skipped.load(Ordering::Relaxed),
            detection_failures: self.detection_failures.load(Ordering::Relaxed),
            replies: self.replies.load(Ordering::Relaxed),
            translations_requested: requested,
            translation_failures: failed,
            translation_success_rate,
            image_searches: self.image_searches.load(Ordering::Relaxed),
            image_search_failures: self.image_search_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the relay counters.
#[derive(Debug, Clone, Serialize)]
pub struct RelayReport {
    pub messages_received: usize,
    pub messages_skipped: usize,
    pub detection_failures: usize,
    pub replies: usize,
    pub translations_requested: usize,
    pub translation_failures: usize,

    /// Percentage (0-100) of translate calls that succeeded
    pub translation_success_rate: f64,

    pub image_searches: usize,
    pub image_search_failures: usize,
}
