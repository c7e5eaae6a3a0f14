//! Status-to-message mapping

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::validate::StatusRecord;

/// Review verdict for a known status value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// `approved`
    Approved,
    /// `reviewing`
    Reviewing,
    /// `rejected`
    Rejected,
}

impl Verdict {
    /// Every known verdict
    pub const ALL: [Verdict; 3] = [Verdict::Approved, Verdict::Reviewing, Verdict::Rejected];

    /// Status string as sent by the server
    pub fn status(self) -> &'static str {
        match self {
            Verdict::Approved => "approved",
            Verdict::Reviewing => "reviewing",
            Verdict::Rejected => "rejected",
        }
    }

    /// Human-readable verdict text
    pub fn text(self) -> &'static str {
        match self {
            Verdict::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Verdict::Reviewing => "Работа взята на проверку ревьюером.",
            Verdict::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for Verdict {
    type Err = Error;

    /// Exact-match lookup; anything else is [`Error::UnknownStatus`]
    fn from_str(status: &str) -> Result<Self> {
        Verdict::ALL
            .into_iter()
            .find(|verdict| verdict.status() == status)
            .ok_or_else(|| Error::unknown_status(status))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Compose the notification text for one status record
///
/// Field presence is checked before the verdict lookup, `homework_name` first.
/// A present `status` that is not a string is an unknown status, not a
/// missing one.
pub fn format_status(record: &StatusRecord) -> Result<String> {
    let name = match record.homework_name() {
        None => return Err(Error::missing_field("homework_name")),
        Some(Value::String(name)) => name.clone(),
        Some(other) => other.to_string(),
    };
    let verdict: Verdict = match record.status() {
        None => return Err(Error::missing_field("status")),
        Some(Value::String(status)) => status.parse()?,
        Some(other) => return Err(Error::unknown_status(other.to_string())),
    };

    Ok(format!(
        "Изменился статус проверки работы \"{}\". {}",
        name, verdict
    ))
}
