//! Core traits for the homework status notifier
//!
//! - [`StatusSource`]: Query the remote status API for changes since a cursor
//! - [`Notifier`]: Deliver text messages to a chat

pub mod status_source;
pub mod notifier;

pub use status_source::StatusSource;
pub use notifier::Notifier;
