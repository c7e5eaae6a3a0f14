// # hwstatusd - Homework Status Daemon
//
// The hwstatusd daemon is a thin integration layer. It is responsible for:
// 1. Reading configuration from environment variables (and an optional `.env`)
// 2. Initializing logging and the runtime
// 3. Wiring the Practicum client and Telegram notifier into the poll loop
// 4. Stopping the loop on SIGINT/SIGTERM
//
// All polling, validation, formatting and deduplication logic lives in
// hwstatus-core.
//
// ## Configuration
//
// ### Required
// - `PRACTICUM_TOKEN`: Practicum API OAuth token
// - `TELEGRAM_TOKEN`: Telegram bot token
// - `TELEGRAM_CHAT_ID`: Chat that receives notifications
//
// ### Optional
// - `HWSTATUS_ENDPOINT`: Status endpoint override (e.g. a local debug server)
// - `HWSTATUS_RETRY_SECS`: Delay between poll cycles (default 600)
// - `HWSTATUS_LOG_LEVEL`: trace, debug, info, warn, error (default debug)
//
// ## Example
//
// ```bash
// export PRACTICUM_TOKEN=...
// export TELEGRAM_TOKEN=...
// export TELEGRAM_CHAT_ID=...
//
// hwstatusd
// ```

use anyhow::Result;
use hwstatus_core::{BotConfig, PollLoop};
use hwstatus_practicum::PracticumClient;
use hwstatus_telegram::TelegramNotifier;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Environment variable selecting the log level
const LOG_LEVEL_VAR: &str = "HWSTATUS_LOG_LEVEL";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn parse_log_level(raw: &str) -> Option<Level> {
    match raw.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    // Reads `.env` as a side effect, so it runs before the log level lookup
    let config = BotConfig::from_env();

    let raw_level = env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| "debug".to_string());
    let Some(log_level) = parse_log_level(&raw_level) else {
        eprintln!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_VAR, raw_level
        );
        return DaemonExitCode::ConfigError.into();
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    let config = match config {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    info!("Starting hwstatusd daemon");
    debug!("Configuration loaded: {:?}", config);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DaemonExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {}", e);
                DaemonExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run the daemon
async fn run_daemon(config: BotConfig) -> Result<()> {
    let source = PracticumClient::from_config(&config)?;
    let notifier = TelegramNotifier::from_config(&config)?;

    info!("Status endpoint: {}", source.endpoint());
    info!("Poll interval: {}s", config.poll.retry_secs);

    let (mut poll_loop, mut event_rx) =
        PollLoop::new(Box::new(source), Arc::new(notifier), &config)?;

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "Poll event");
        }
    });

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let poll_task =
        tokio::spawn(async move { poll_loop.run_with_shutdown(Some(shutdown_rx)).await });

    let shutdown_result = wait_for_shutdown().await;
    finish(poll_task, shutdown_tx, shutdown_result).await
}

/// Stop the poll loop, then report how the wait for a signal ended
///
/// A failed signal setup still stops the loop, but the daemon exits with an
/// error instead of a clean shutdown.
async fn finish(
    poll_task: JoinHandle<hwstatus_core::Result<()>>,
    shutdown_tx: oneshot::Sender<()>,
    shutdown_result: Result<&'static str>,
) -> Result<()> {
    match &shutdown_result {
        Ok(signal) => info!("Received shutdown signal: {}", signal),
        Err(e) => error!("Shutdown error: {}", e),
    }

    let _ = shutdown_tx.send(());
    poll_task
        .await
        .map_err(|e| anyhow::anyhow!("Poll loop task failed: {}", e))??;

    shutdown_result?;
    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_log_level(" WARN "), Some(Level::WARN));
        assert_eq!(parse_log_level("verbose"), None);
    }

    fn stoppable_loop() -> (JoinHandle<hwstatus_core::Result<()>>, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let _ = rx.await;
            Ok(())
        });
        (task, tx)
    }

    #[tokio::test]
    async fn test_finish_after_signal_is_clean() {
        let (task, tx) = stoppable_loop();
        assert!(finish(task, tx, Ok("SIGTERM")).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_signal_setup_is_an_error() {
        let (task, tx) = stoppable_loop();
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            finish(
                task,
                tx,
                Err(anyhow::anyhow!("Failed to setup SIGTERM handler")),
            ),
        )
        .await
        .expect("loop is stopped even when signal setup fails");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("SIGTERM handler"));
    }

    #[tokio::test]
    async fn test_poll_loop_error_is_propagated() {
        let task = tokio::spawn(async { Err(hwstatus_core::Error::config("bad chat id")) });
        let (tx, _rx) = oneshot::channel();

        assert!(finish(task, tx, Ok("SIGINT")).await.is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DaemonExitCode::CleanShutdown as u8, 0);
        assert_eq!(DaemonExitCode::ConfigError as u8, 1);
        assert_eq!(DaemonExitCode::RuntimeError as u8, 2);
    }
}
