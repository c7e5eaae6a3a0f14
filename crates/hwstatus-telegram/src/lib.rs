// # Telegram Notifier
//
// This crate delivers hwstatus messages through the Telegram Bot API.
//
// ## Behavior
//
// - One `sendMessage` call per notification, no retry
// - Any failure is returned as `Error::Delivery`; PollLoop logs it and moves on
//
// ## Security Requirements
//
// - Bot token is part of the request path; it NEVER appears in logs or errors
//
// ## API Reference
//
// ```http
// POST /bot<token>/sendMessage
// Content-Type: application/json
//
// {"chat_id": "...", "text": "..."}
// ```

use async_trait::async_trait;
use hwstatus_core::config::BotConfig;
use hwstatus_core::traits::Notifier;
use hwstatus_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API notifier
pub struct TelegramNotifier {
    /// Bot token
    /// ⚠️ NEVER log this value
    token: String,

    /// API base URL (overridable for testing)
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the bot token
impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelegramNotifier {
    /// Create a notifier against a custom API base URL
    pub fn with_api_base(
        token: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::config("Telegram token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a notifier from the notifier configuration
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Self::with_api_base(
            config.telegram_token.clone(),
            TELEGRAM_API_BASE,
            Duration::from_secs(config.poll.http_timeout_secs),
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            // The URL contains the token
            .map_err(|e| Error::delivery(format!("Request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::delivery(format!("Failed to read response: {}", e.without_url())))?;

        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let description = parsed
                .and_then(|r| r.description)
                .unwrap_or_else(|| "no description".to_string());
            return Err(Error::delivery(format!(
                "Telegram API returned {}: {}",
                status, description
            )));
        }

        match parsed {
            Some(ApiResponse { ok: true, .. }) => {
                tracing::debug!("Message delivered to chat {}", chat_id);
                Ok(())
            }
            Some(ApiResponse { description, .. }) => Err(Error::delivery(format!(
                "Telegram API rejected the message: {}",
                description.unwrap_or_else(|| "no description".to_string())
            ))),
            None => Err(Error::delivery("Telegram API returned an unreadable response")),
        }
    }

    fn notifier_name(&self) -> &'static str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const TOKEN: &str = "123456:secret-bot-token";

    /// Serve one canned HTTP response; the handle yields the raw request
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if let Some(head_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..head_end]).to_lowercase();
                    let content_length = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn notifier(api_base: &str) -> TelegramNotifier {
        TelegramNotifier::with_api_base(TOKEN, api_base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_method_url() {
        let notifier = notifier("https://api.telegram.org/");
        assert_eq!(
            notifier.method_url("sendMessage"),
            "https://api.telegram.org/bot123456:secret-bot-token/sendMessage"
        );
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = TelegramNotifier::with_api_base("", TELEGRAM_API_BASE, Duration::from_secs(5))
            .unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_token_not_exposed_in_debug() {
        let debug_str = format!("{:?}", notifier(TELEGRAM_API_BASE));
        assert!(!debug_str.contains("secret-bot-token"));
        assert!(debug_str.contains("TelegramNotifier"));
    }

    #[tokio::test]
    async fn test_send_posts_chat_and_text() {
        let (api_base, server) =
            serve_once("200 OK", r#"{"ok":true,"result":{"message_id":1}}"#).await;

        notifier(&api_base)
            .send("424242", "Изменился статус проверки работы \"x.zip\".")
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /bot123456:secret-bot-token/sendMessage "));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["chat_id"], "424242");
        assert_eq!(json["text"], "Изменился статус проверки работы \"x.zip\".");
    }

    #[tokio::test]
    async fn test_api_error_is_delivery_failure() {
        let (api_base, _server) = serve_once(
            "400 Bad Request",
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        )
        .await;

        let err = notifier(&api_base).send("1", "hi").await.unwrap_err();
        assert_eq!(err.kind(), "delivery");
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn test_ok_false_is_delivery_failure() {
        let (api_base, _server) =
            serve_once("200 OK", r#"{"ok":false,"description":"Forbidden"}"#).await;

        let err = notifier(&api_base).send("1", "hi").await.unwrap_err();
        assert_eq!(err.kind(), "delivery");
    }

    #[tokio::test]
    async fn test_unreachable_api_does_not_leak_token() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = notifier(&format!("http://{}", addr))
            .send("1", "hi")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "delivery");
        assert!(!err.to_string().contains("secret-bot-token"));
    }
}
