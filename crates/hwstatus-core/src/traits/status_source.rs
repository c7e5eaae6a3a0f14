// # Status Source Trait
//
// Defines the interface for querying homework review statuses.
//
// ## Implementations
//
// - Practicum API: `hwstatus-practicum` crate
//
// ## Usage
//
// ```rust,ignore
// use hwstatus_core::StatusSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* StatusSource implementation */;
//
//     // Everything that changed since the cursor
//     let payload = source.fetch(1_581_604_970).await?;
//     println!("{}", payload);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde_json::Value;

/// Trait for status source implementations
///
/// A status source issues one query per call and classifies the outcome.
///
/// # Failure Classification
///
/// Implementations must map outcomes to these variants, checked in order:
/// 1. [`Error::Transport`](crate::Error::Transport): the call did not complete
/// 2. [`Error::UnexpectedStatus`](crate::Error::UnexpectedStatus): status other than 200
/// 3. [`Error::MalformedPayload`](crate::Error::MalformedPayload): body is not JSON
/// 4. [`Error::ServerReported`](crate::Error::ServerReported): payload has `error` or `code`
///
/// # Retry
///
/// Implementations must not retry or sleep. The [`PollLoop`](crate::PollLoop)
/// owns pacing: a failed cycle is retried with the same cursor after the
/// fixed interval.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch statuses changed since `from_date`
    ///
    /// # Parameters
    ///
    /// - `from_date`: Cursor (seconds since epoch), sent unmodified as the
    ///   `from_date` query parameter
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: The decoded payload, not yet structurally validated
    /// - `Err(Error)`: A classified failure
    async fn fetch(&self, from_date: i64) -> Result<Value, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
