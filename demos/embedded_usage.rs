//! Minimal embedding example for hwstatus-core
//!
//! Drives a PollLoop one cycle at a time with in-process collaborators, so the
//! cursor and error-cache behavior can be watched without any network access.

use hwstatus_core::config::BotConfig;
use hwstatus_core::traits::{Notifier, StatusSource};
use hwstatus_core::{Error, PollLoop, RequestInfo, Result};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::Mutex;

/// Status source that replays a fixed list of outcomes
struct ReplaySource {
    outcomes: Mutex<Vec<Result<Value>>>,
}

impl ReplaySource {
    fn new(mut outcomes: Vec<Result<Value>>) -> Self {
        outcomes.reverse();
        Self {
            outcomes: Mutex::new(outcomes),
        }
    }
}

#[async_trait::async_trait]
impl StatusSource for ReplaySource {
    async fn fetch(&self, from_date: i64) -> Result<Value> {
        println!("[Embedded] fetch from_date={}", from_date);
        self.outcomes
            .lock()
            .map_err(|_| Error::Other("replay script poisoned".to_string()))?
            .pop()
            .unwrap_or_else(|| Ok(json!({"homeworks": [], "current_date": from_date})))
    }

    fn source_name(&self) -> &'static str {
        "replay"
    }
}

/// Notifier that prints to stdout
struct StdoutNotifier;

#[async_trait::async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        println!("[Embedded] -> chat {}: {}", chat_id, text);
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "stdout"
    }
}

fn outage() -> Error {
    Error::transport(
        "connection refused",
        RequestInfo::new("https://example.test/api/").with_param("from_date", "0"),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let source = ReplaySource::new(vec![
        Err(outage()),
        Err(outage()),
        Ok(json!({
            "homeworks": [{"homework_name": "x.zip", "status": "rejected"}],
            "current_date": 1000
        })),
        Ok(json!({"homeworks": [], "current_date": 1600})),
    ]);

    let config = BotConfig::new("demo-practicum-token", "demo-telegram-token", "42");
    let (poll_loop, _event_rx) = PollLoop::new(Box::new(source), Arc::new(StdoutNotifier), &config)?;
    let mut poll_loop = poll_loop.with_cursor(0);

    for cycle in 1..=4 {
        let outcome = poll_loop.poll_once().await;
        println!(
            "[Embedded] cycle {}: {} (cursor={}, cached failures={})",
            cycle,
            if outcome.is_ok() { "ok" } else { "failed" },
            poll_loop.cursor(),
            poll_loop.reporter().cached_count()
        );
    }

    Ok(())
}
