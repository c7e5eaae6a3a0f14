// # hwstatus-core
//
// Core library for the homework review status notifier.
//
// ## Architecture Overview
//
// - **StatusSource**: Trait for querying the remote status API with a cursor
// - **Notifier**: Trait for delivering text messages to a chat
// - **validate**: Structural checks on the decoded payload, record extraction
// - **format**: Status-to-verdict mapping and message composition
// - **ErrorReporter**: Deduplicated delivery of failure reports
// - **PollLoop**: Orchestrates fetch → validate → format → notify on a fixed cadence
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Transport and messaging live in their own crates
// 2. **Explicit State**: Cursor and error cache are owned by the loop, never global
// 3. **Typed Failures**: Every stage returns a variant of [`Error`]
// 4. **Library-First**: The loop can be embedded and driven one cycle at a time

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod validate;
pub mod format;
pub mod reporter;

// Re-export core types for convenience
pub use traits::{Notifier, StatusSource};
pub use engine::{PollEvent, PollLoop};
pub use config::{BotConfig, PollConfig};
pub use error::{Error, RequestInfo, Result};
pub use validate::{StatusRecord, extract_records};
pub use format::{Verdict, format_status};
pub use reporter::{ErrorReporter, ReportOutcome};
