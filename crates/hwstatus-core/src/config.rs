//! Configuration types for the homework status notifier
//!
//! Credentials and polling settings are read once at startup. Missing
//! credentials are fatal: every absent variable is named in one error.

use serde::{Deserialize, Serialize};

/// Environment variable holding the Practicum API token
pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";
/// Environment variable holding the Telegram bot token
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
/// Environment variable holding the destination chat id
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";
/// Optional override for the status endpoint
pub const ENDPOINT_VAR: &str = "HWSTATUS_ENDPOINT";
/// Optional override for the poll interval in seconds
pub const RETRY_SECS_VAR: &str = "HWSTATUS_RETRY_SECS";

/// Default homework status endpoint
pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Main notifier configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Practicum API token
    pub practicum_token: String,

    /// Telegram bot token
    pub telegram_token: String,

    /// Chat that receives notifications
    pub telegram_chat_id: String,

    /// Polling settings
    #[serde(default)]
    pub poll: PollConfig,
}

// Tokens stay out of logs
impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("practicum_token", &"<REDACTED>")
            .field("telegram_token", &"<REDACTED>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("poll", &self.poll)
            .finish()
    }
}

impl BotConfig {
    /// Create a configuration with default polling settings
    pub fn new(
        practicum_token: impl Into<String>,
        telegram_token: impl Into<String>,
        telegram_chat_id: impl Into<String>,
    ) -> Self {
        Self {
            practicum_token: practicum_token.into(),
            telegram_token: telegram_token.into(),
            telegram_chat_id: telegram_chat_id.into(),
            poll: PollConfig::default(),
        }
    }

    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, crate::Error> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values count as missing. All missing required variables are
    /// reported together.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let practicum_token = read(PRACTICUM_TOKEN_VAR);
        let telegram_token = read(TELEGRAM_TOKEN_VAR);
        let telegram_chat_id = read(TELEGRAM_CHAT_ID_VAR);

        let missing: Vec<&str> = [
            (PRACTICUM_TOKEN_VAR, practicum_token.is_none()),
            (TELEGRAM_TOKEN_VAR, telegram_token.is_none()),
            (TELEGRAM_CHAT_ID_VAR, telegram_chat_id.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(practicum_token), Some(telegram_token), Some(telegram_chat_id)) =
            (practicum_token, telegram_token, telegram_chat_id)
        else {
            return Err(crate::Error::config(format!(
                "не заданы переменные среды: {}",
                missing.join(", ")
            )));
        };

        let mut poll = PollConfig::default();
        if let Some(endpoint) = read(ENDPOINT_VAR) {
            poll.endpoint = endpoint;
        }
        if let Some(raw) = read(RETRY_SECS_VAR) {
            poll.retry_secs = raw.trim().parse().map_err(|_| {
                crate::Error::config(format!(
                    "{} должна быть целым числом секунд, получено: {}",
                    RETRY_SECS_VAR, raw
                ))
            })?;
        }

        let config = Self {
            practicum_token,
            telegram_token,
            telegram_chat_id,
            poll,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.practicum_token.is_empty() {
            return Err(crate::Error::config("Practicum API token cannot be empty"));
        }
        if self.telegram_token.is_empty() {
            return Err(crate::Error::config("Telegram token cannot be empty"));
        }
        if self.telegram_chat_id.is_empty() {
            return Err(crate::Error::config("Telegram chat id cannot be empty"));
        }

        self.poll.validate()
    }
}

/// Polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Homework status endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Fixed delay between poll cycles (in seconds)
    ///
    /// The same delay follows successful and failed cycles.
    #[serde(default = "default_retry_secs")]
    pub retry_secs: u64,

    /// Timeout for a single HTTP request (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Capacity of the poll event channel
    ///
    /// When full, new events are dropped with a warning.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl PollConfig {
    /// Validate the polling settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.endpoint.is_empty() {
            return Err(crate::Error::config("Status endpoint cannot be empty"));
        }
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Status endpoint must use HTTP or HTTPS scheme. Got: {}",
                self.endpoint
            )));
        }
        if self.retry_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.http_timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            retry_secs: default_retry_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_retry_secs() -> u64 {
    600
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    100
}
