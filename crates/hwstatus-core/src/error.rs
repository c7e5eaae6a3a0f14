//! Error types for the homework status notifier
//!
//! Every stage of a poll cycle reports failures as a variant of [`Error`].
//! The `Display` text is what ends up in the chat, so it is written for the
//! person receiving the notification.

use std::fmt;
use thiserror::Error;

/// Result type alias for notifier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Longest slice of a raw response body kept in error text
const BODY_PREVIEW_CHARS: usize = 200;

/// Parameters of an outgoing status request, kept for diagnostics
///
/// The `Authorization` header value is never rendered by `Display`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestInfo {
    /// Request URL without query string
    pub url: String,
    /// Request headers as name/value pairs
    pub headers: Vec<(String, String)>,
    /// Query parameters as name/value pairs
    pub params: Vec<(String, String)>,
}

impl RequestInfo {
    /// Create request info for a URL with no headers or params
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

impl fmt::Display for RequestInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "url={}, headers={{", self.url)?;
        for (i, (name, value)) in self.headers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if name.eq_ignore_ascii_case("authorization") {
                write!(f, "{}: <REDACTED>", name)?;
            } else {
                write!(f, "{}: {}", name, value)?;
            }
        }
        f.write_str("}, params={")?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        f.write_str("}")
    }
}

/// Core error type for the homework status notifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request could not complete (DNS, connection refused, timeout)
    #[error("Не удалось получить ответ сервера: {message}. Параметры запроса: {request}")]
    Transport {
        /// Transport error text
        message: String,
        /// Request that failed
        request: RequestInfo,
    },

    /// The server answered with a status code other than 200
    #[error("Сервер вернул код ошибки {status}. Параметры запроса: {request}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Request that failed
        request: RequestInfo,
    },

    /// The response body is not valid JSON
    #[error(
        "Ответ сервера не является корректным JSON: {}. Параметры запроса: {request}",
        preview(.body)
    )]
    MalformedPayload {
        /// Raw response text
        body: String,
        /// Request that failed
        request: RequestInfo,
    },

    /// The payload carries an explicit `error` or `code` indicator
    #[error("Сервер вернул сведения об ошибке: {indicator}={value}")]
    ServerReported {
        /// Indicator key (`error` or `code`)
        indicator: String,
        /// Indicator value, rendered as JSON
        value: String,
    },

    /// The payload or one of its parts has the wrong JSON type
    #[error("Ответ сервера имеет неправильную структуру. {0}")]
    WrongShape(String),

    /// A required top-level key is absent from the payload
    #[error("В ответе сервера не найден необходимый компонент {0}")]
    MissingKey(String),

    /// A status record lacks a required field
    #[error("Запись о домашней работе не содержит поля {0}")]
    MissingField(String),

    /// A status record carries a status outside the verdict table
    #[error("Неизвестный статус домашней работы - \"{0}\"")]
    UnknownStatus(String),

    /// The notifier could not deliver a message
    #[error("Ошибка при отправке сообщения: {0}")]
    Delivery(String),

    /// Configuration errors
    #[error("Ошибка конфигурации: {0}")]
    Config(String),

    /// Anything not covered above
    #[error("{0}")]
    Other(String),
}

fn preview(body: &str) -> String {
    if body.chars().count() <= BODY_PREVIEW_CHARS {
        return body.to_string();
    }
    let head: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
    format!("{}…", head)
}

impl Error {
    /// Create a transport error
    pub fn transport(message: impl Into<String>, request: RequestInfo) -> Self {
        Self::Transport {
            message: message.into(),
            request,
        }
    }

    /// Create an unexpected status error
    pub fn unexpected_status(status: u16, request: RequestInfo) -> Self {
        Self::UnexpectedStatus { status, request }
    }

    /// Create a malformed payload error
    pub fn malformed_payload(body: impl Into<String>, request: RequestInfo) -> Self {
        Self::MalformedPayload {
            body: body.into(),
            request,
        }
    }

    /// Create a server-reported error
    pub fn server_reported(indicator: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ServerReported {
            indicator: indicator.into(),
            value: value.into(),
        }
    }

    /// Create a wrong shape error
    pub fn wrong_shape(msg: impl Into<String>) -> Self {
        Self::WrongShape(msg.into())
    }

    /// Create a missing key error
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey(key.into())
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create an unknown status error
    pub fn unknown_status(status: impl Into<String>) -> Self {
        Self::UnknownStatus(status.into())
    }

    /// Create a delivery error
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short machine-readable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::ServerReported { .. } => "server_reported",
            Self::WrongShape(_) => "wrong_shape",
            Self::MissingKey(_) => "missing_key",
            Self::MissingField(_) => "missing_field",
            Self::UnknownStatus(_) => "unknown_status",
            Self::Delivery(_) => "delivery",
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RequestInfo {
        RequestInfo::new("https://example.test/api/")
            .with_header("Authorization", "OAuth secret-token")
            .with_param("from_date", "0")
    }

    #[test]
    fn test_request_info_redacts_authorization() {
        let text = request().to_string();
        assert!(!text.contains("secret-token"));
        assert!(text.contains("Authorization: <REDACTED>"));
        assert!(text.contains("from_date: 0"));
        assert!(text.starts_with("url=https://example.test/api/"));
    }

    #[test]
    fn test_transport_error_carries_request() {
        let err = Error::transport("connection refused", request());
        let text = err.to_string();
        assert!(text.contains("connection refused"));
        assert!(text.contains("from_date: 0"));
        assert!(!text.contains("secret-token"));
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn test_malformed_payload_truncates_body() {
        let body = "x".repeat(1000);
        let err = Error::malformed_payload(body.clone(), request());
        let text = err.to_string();
        assert!(text.len() < body.len());
        assert!(text.contains('…'));

        if let Error::MalformedPayload { body: kept, .. } = err {
            assert_eq!(kept.len(), 1000, "full body is kept for diagnostics");
        } else {
            panic!("expected MalformedPayload");
        }
    }

    #[test]
    fn test_unknown_status_names_value() {
        let err = Error::unknown_status("undefined status");
        assert_eq!(
            err.to_string(),
            "Неизвестный статус домашней работы - \"undefined status\""
        );
    }

    #[test]
    fn test_anyhow_maps_to_other() {
        let err: Error = anyhow::anyhow!("boom").into();
        assert_eq!(err, Error::Other("boom".to_string()));
        assert_eq!(err.kind(), "other");
    }
}
