// # Notifier Trait
//
// Defines the outbound message channel.
//
// ## Implementations
//
// - Telegram Bot API: `hwstatus-telegram` crate

use async_trait::async_trait;

/// Trait for message delivery implementations
///
/// Used both for status change messages and for deduplicated error reports.
/// Any failure returned here is treated as a delivery failure: it is logged
/// and never reported back through the notifier.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a text message to a chat
    ///
    /// # Parameters
    ///
    /// - `chat_id`: Destination chat identifier
    /// - `text`: Message text
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}
