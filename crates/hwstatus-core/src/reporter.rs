//! Deduplicated failure reporting
//!
//! A persistent fault (network down, token revoked) fails every cycle with the
//! same text. The reporter forwards each distinct message once per failure
//! streak and stays quiet about repeats until [`ErrorReporter::reset`] is
//! called after a successful cycle.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::traits::Notifier;

/// Result of a [`ErrorReporter::report_failure`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The message was delivered
    Sent,
    /// The message was already reported during this streak
    Suppressed,
    /// Delivery was attempted and failed (logged, not propagated)
    DeliveryFailed,
}

/// Sends failure reports through a [`Notifier`], at most once per distinct text
pub struct ErrorReporter {
    notifier: Arc<dyn Notifier>,
    chat_id: String,
    cache: HashSet<String>,
}

impl ErrorReporter {
    /// Create a reporter with an empty cache
    pub fn new(notifier: Arc<dyn Notifier>, chat_id: impl Into<String>) -> Self {
        Self {
            notifier,
            chat_id: chat_id.into(),
            cache: HashSet::new(),
        }
    }

    /// Report a fully formatted failure message
    ///
    /// The message is cached before the outcome of delivery is known, so a
    /// failed delivery is not retried within the same streak.
    pub async fn report_failure(&mut self, message: &str) -> ReportOutcome {
        if self.cache.contains(message) {
            debug!("Failure already reported in this streak, not resending");
            return ReportOutcome::Suppressed;
        }
        self.cache.insert(message.to_string());

        match self.notifier.send(&self.chat_id, message).await {
            Ok(()) => {
                info!(
                    "Failure report sent via {}",
                    self.notifier.notifier_name()
                );
                ReportOutcome::Sent
            }
            Err(e) => {
                error!("Failed to send failure report: {}", e);
                ReportOutcome::DeliveryFailed
            }
        }
    }

    /// Forget every reported message; call after a fully successful cycle
    pub fn reset(&mut self) {
        if !self.cache.is_empty() {
            debug!("Clearing {} cached failure message(s)", self.cache.len());
        }
        self.cache.clear();
    }

    /// Whether a message was already reported in this streak
    pub fn is_reported(&self, message: &str) -> bool {
        self.cache.contains(message)
    }

    /// Number of distinct messages reported in this streak
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("notifier", &self.notifier.notifier_name())
            .field("chat_id", &self.chat_id)
            .field("cached", &self.cache.len())
            .finish()
    }
}
