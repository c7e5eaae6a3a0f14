//! Core poll loop
//!
//! The PollLoop is responsible for:
//! - Querying the StatusSource with the current cursor
//! - Validating the payload and formatting the newest status record
//! - Delivering the status message via the Notifier
//! - Advancing the cursor and clearing the error cache after a clean cycle
//! - Routing failures to the ErrorReporter
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ StatusSource │◄── fetch(cursor) ──┐
//! └──────────────┘                    │
//!                             ┌──────────────┐
//!                             │   PollLoop   │── PollEvent ──► monitoring
//!                             └──────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         ▼                           ▼                           ▼
//! ┌──────────────┐           ┌──────────────┐           ┌───────────────┐
//! │   validate   │           │    format    │           │ ErrorReporter │
//! │  (extract)   │           │  (verdict)   │           │   (dedup)     │
//! └──────────────┘           └──────────────┘           └───────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. fetch → extract records → format the first one, if any
//! 2. Send the message
//! 3. Advance the cursor to `current_date`, clear the error cache
//! 4. On any failure: report it, keep cursor and cache
//! 5. Sleep the fixed interval, whatever the outcome

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::error::{Error, Result};
use crate::format::format_status;
use crate::reporter::{ErrorReporter, ReportOutcome};
use crate::traits::{Notifier, StatusSource};
use crate::validate::{self, extract_records};

/// Prefix of every failure report sent to the chat
pub const FAILURE_PREFIX: &str = "Сбой в работе программы";

/// Events emitted by the PollLoop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// Loop started
    Started { cursor: i64 },

    /// Poll cycle started
    CycleStarted { cursor: i64 },

    /// The server reported no status changes
    NoUpdates,

    /// A status change message was delivered
    StatusNotified { message: String },

    /// Cursor moved after a clean cycle
    CursorAdvanced { from: i64, to: i64 },

    /// Poll cycle failed; cursor unchanged
    CycleFailed { kind: &'static str, error: String },

    /// A failure report was sent to the chat
    ErrorReported { message: String },

    /// A failure report was skipped because it was already sent in this streak
    ErrorSuppressed { message: String },

    /// Loop stopped
    Stopped { reason: String },
}

/// What a clean cycle produced
#[derive(Debug, Clone, PartialEq, Eq)]
enum CycleOutcome {
    NoUpdates { next_cursor: Option<i64> },
    Notified { message: String, next_cursor: Option<i64> },
}

type ShutdownSignal = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Homework status poll loop
///
/// ## Lifecycle
///
/// 1. Create with [`PollLoop::new()`]
/// 2. Start with [`PollLoop::run()`] or [`PollLoop::run_with_shutdown()`]
/// 3. Loop runs until the shutdown signal fires
///
/// A single cycle can also be driven directly with [`PollLoop::poll_once()`].
///
/// ## State
///
/// The cursor and the error cache belong to the loop. Both change only
/// between cycles; nothing else shares them.
pub struct PollLoop {
    /// Status API client
    source: Box<dyn StatusSource>,

    /// Outbound message channel
    notifier: Arc<dyn Notifier>,

    /// Failure deduplication
    reporter: ErrorReporter,

    /// Destination chat
    chat_id: String,

    /// Lower bound of the next query window
    cursor: i64,

    /// Fixed delay between cycles
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<PollEvent>,
}

impl PollLoop {
    /// Create a new poll loop
    ///
    /// The cursor starts at the current time.
    ///
    /// # Returns
    ///
    /// A tuple of (loop, event_receiver) where event_receiver yields poll events
    pub fn new(
        source: Box<dyn StatusSource>,
        notifier: Arc<dyn Notifier>,
        config: &BotConfig,
    ) -> Result<(Self, mpsc::Receiver<PollEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.poll.event_channel_capacity);
        let chat_id = config.telegram_chat_id.clone();

        let poll_loop = Self {
            source,
            reporter: ErrorReporter::new(Arc::clone(&notifier), chat_id.clone()),
            notifier,
            chat_id,
            cursor: chrono::Utc::now().timestamp(),
            interval: Duration::from_secs(config.poll.retry_secs),
            event_tx: tx,
        };

        Ok((poll_loop, rx))
    }

    /// Start from an explicit cursor instead of the current time
    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    /// Override the delay between cycles
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Current cursor
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Failure reporter (read-only view of the error cache)
    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Run the loop until Ctrl-C
    pub async fn run(&mut self) -> Result<()> {
        self.run_with_shutdown(None).await
    }

    /// Run the loop until the shutdown channel fires or its sender is dropped
    ///
    /// With `None`, the loop stops on Ctrl-C. The signal interrupts both the
    /// inter-cycle sleep and an in-flight cycle; nothing is sent after it.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        let shutdown: ShutdownSignal = match shutdown_rx {
            Some(rx) => Box::pin(async move {
                let _ = rx.await;
            }),
            None => Box::pin(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }),
        };

        self.run_internal(shutdown).await
    }

    async fn run_internal(&mut self, mut shutdown: ShutdownSignal) -> Result<()> {
        info!(
            "Starting poll loop (source={}, cursor={}, interval={:?})",
            self.source.source_name(),
            self.cursor,
            self.interval
        );
        self.emit_event(PollEvent::Started {
            cursor: self.cursor,
        });

        loop {
            tokio::select! {
                _ = self.poll_once() => {}
                _ = &mut shutdown => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => break,
            }
        }

        info!("Shutdown signal received, poll loop stopped");
        self.emit_event(PollEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }

    /// Run one poll cycle, including failure handling
    ///
    /// On success the cursor advances and the error cache is cleared. On
    /// failure the error is reported (or logged, for delivery failures) and
    /// returned; cursor and cache are left untouched.
    pub async fn poll_once(&mut self) -> Result<()> {
        self.emit_event(PollEvent::CycleStarted {
            cursor: self.cursor,
        });

        match self.cycle().await {
            Ok(outcome) => {
                let next_cursor = match outcome {
                    CycleOutcome::NoUpdates { next_cursor } => {
                        self.emit_event(PollEvent::NoUpdates);
                        next_cursor
                    }
                    CycleOutcome::Notified {
                        message,
                        next_cursor,
                    } => {
                        self.emit_event(PollEvent::StatusNotified { message });
                        next_cursor
                    }
                };

                self.advance_cursor(next_cursor);
                self.reporter.reset();
                info!("Homework statuses checked");
                Ok(())
            }
            Err(e) => {
                self.emit_event(PollEvent::CycleFailed {
                    kind: e.kind(),
                    error: e.to_string(),
                });
                self.handle_failure(&e).await;
                Err(e)
            }
        }
    }

    /// fetch → extract → format → send, without touching loop state
    async fn cycle(&self) -> Result<CycleOutcome> {
        debug!("Polling {} from_date={}", self.source.source_name(), self.cursor);

        let response = self.source.fetch(self.cursor).await?;
        let records = extract_records(&response)?;
        let next_cursor = validate::current_date(&response);

        // Newest first: only the head record is reported per cycle
        let Some(record) = records.first() else {
            debug!("No status updates received");
            return Ok(CycleOutcome::NoUpdates { next_cursor });
        };

        if records.len() > 1 {
            debug!(
                "{} records received, reporting the newest only",
                records.len()
            );
        }

        let message = format_status(record)?;
        self.notifier
            .send(&self.chat_id, &message)
            .await
            .map_err(|e| match e {
                Error::Delivery(_) => e,
                other => Error::delivery(other.to_string()),
            })?;
        info!("Status message sent via {}", self.notifier.notifier_name());

        Ok(CycleOutcome::Notified {
            message,
            next_cursor,
        })
    }

    fn advance_cursor(&mut self, next_cursor: Option<i64>) {
        match next_cursor {
            Some(next) if next > self.cursor => {
                debug!("Cursor advanced {} -> {}", self.cursor, next);
                self.emit_event(PollEvent::CursorAdvanced {
                    from: self.cursor,
                    to: next,
                });
                self.cursor = next;
            }
            Some(next) => {
                debug!(
                    "Server current_date {} is not ahead of cursor {}, keeping cursor",
                    next, self.cursor
                );
            }
            None => {
                warn!("Response has no integer current_date, keeping cursor {}", self.cursor);
            }
        }
    }

    /// Classify a cycle failure and route it
    async fn handle_failure(&mut self, err: &Error) {
        match err {
            // Never report delivery problems through the channel that failed
            Error::Delivery(_) => {
                error!("Failed to send status message: {}", err);
            }
            Error::Transport { .. }
            | Error::UnexpectedStatus { .. }
            | Error::MalformedPayload { .. }
            | Error::ServerReported { .. }
            | Error::WrongShape(_)
            | Error::MissingKey(_)
            | Error::MissingField(_)
            | Error::UnknownStatus(_)
            | Error::Config(_)
            | Error::Other(_) => {
                let message = format!("{}: {}", FAILURE_PREFIX, err);
                error!("{}", message);

                match self.reporter.report_failure(&message).await {
                    ReportOutcome::Sent => {
                        self.emit_event(PollEvent::ErrorReported { message });
                    }
                    ReportOutcome::Suppressed => {
                        self.emit_event(PollEvent::ErrorSuppressed { message });
                    }
                    ReportOutcome::DeliveryFailed => {}
                }
            }
        }
    }

    /// Emit a poll event
    fn emit_event(&self, event: PollEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

impl std::fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("source", &self.source.source_name())
            .field("notifier", &self.notifier.notifier_name())
            .field("chat_id", &self.chat_id)
            .field("cursor", &self.cursor)
            .field("interval", &self.interval)
            .field("reporter", &self.reporter)
            .finish()
    }
}
