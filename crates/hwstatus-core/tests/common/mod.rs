//! Test doubles and common utilities for contract tests
//!
//! The doubles record every call so tests can assert on exactly what the
//! loop asked for and what it sent.

#![allow(dead_code)]

use hwstatus_core::config::{BotConfig, PollConfig};
use hwstatus_core::error::{Error, Result};
use hwstatus_core::traits::{Notifier, StatusSource};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A status source that replays scripted responses
///
/// Once the script is exhausted it answers with an empty update list and
/// echoes the requested cursor as `current_date`.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<VecDeque<Result<Value>>>>,
    requested: Arc<Mutex<Vec<i64>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful payload
    pub fn push_ok(&self, payload: Value) -> &Self {
        self.script.lock().unwrap().push_back(Ok(payload));
        self
    }

    /// Queue a failure
    pub fn push_err(&self, error: Error) -> &Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Cursors passed to fetch(), in call order
    pub fn requested_cursors(&self) -> Vec<i64> {
        self.requested.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch(&self, from_date: i64) -> Result<Value> {
        self.requested.lock().unwrap().push(from_date);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"homeworks": [], "current_date": from_date})))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A notifier that records messages and can be switched to fail
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    attempts: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successfully delivered texts, in order
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Chat ids of delivered messages, in order
    pub fn chat_ids(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(chat, _)| chat.clone())
            .collect()
    }

    /// Number of send() calls, including failed ones
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::delivery("chat unreachable"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

/// A status source that never answers
pub struct HangingSource;

#[async_trait::async_trait]
impl StatusSource for HangingSource {
    async fn fetch(&self, _from_date: i64) -> Result<Value> {
        std::future::pending::<()>().await;
        unreachable!()
    }

    fn source_name(&self) -> &'static str {
        "hanging"
    }
}

pub const CHAT_ID: &str = "424242";

/// Helper to create a minimal BotConfig for testing
pub fn minimal_config() -> BotConfig {
    BotConfig {
        practicum_token: "test-practicum-token".to_string(),
        telegram_token: "test-telegram-token".to_string(),
        telegram_chat_id: CHAT_ID.to_string(),
        poll: PollConfig {
            retry_secs: 600,
            event_channel_capacity: 100,
            ..PollConfig::default()
        },
    }
}

/// Payload with one status record
pub fn single_record(name: &str, status: &str, current_date: i64) -> Value {
    json!({
        "homeworks": [{"homework_name": name, "status": status}],
        "current_date": current_date
    })
}

/// Payload with no status records
pub fn empty_update(current_date: i64) -> Value {
    json!({"homeworks": [], "current_date": current_date})
}

/// A transport failure as a real client would produce it
pub fn network_down() -> Error {
    Error::transport(
        "connection refused",
        hwstatus_core::RequestInfo::new("https://example.test/api/")
            .with_header("Authorization", "OAuth test-practicum-token")
            .with_param("from_date", "0"),
    )
}
