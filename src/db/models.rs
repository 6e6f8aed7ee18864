use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Opaque whisper identifier, also used as the reveal token payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhisperId(String);

impl WhisperId {
    /// Callback data prefix of the "show message" button
    pub const REVEAL_PREFIX: &'static str = "show_";

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Callback data carried by the reveal button
    pub fn reveal_token(&self) -> String {
        format!("{}{}", Self::REVEAL_PREFIX, self.0)
    }

    /// Parse `show_<id>` callback data back into an id
    pub fn from_reveal_token(data: &str) -> Option<Self> {
        data.strip_prefix(Self::REVEAL_PREFIX)
            .filter(|id| !id.is_empty())
            .map(|id| Self(id.to_string()))
    }
}

impl From<String> for WhisperId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for WhisperId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for WhisperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sender profile captured when the whisper is composed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Sender {
    /// Username for display, or the given fallback when the sender has none
    pub fn handle_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.username.as_deref().unwrap_or(fallback)
    }
}

/// First successful reveal. Both halves are always set together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opened {
    pub at: DateTime<Utc>,
    pub by: i64,
}

/// A stored whisper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Whisper {
    pub id: WhisperId,
    pub sender: Sender,
    /// Lower-cased, without a leading `@`
    pub target_username: String,
    pub secret_text: String,
    pub created_at: DateTime<Utc>,
    pub opened: Option<Opened>,
}

impl Whisper {
    pub fn is_opened(&self) -> bool {
        self.opened.is_some()
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened.map(|o| o.at)
    }

    pub fn opened_by(&self) -> Option<i64> {
        self.opened.map(|o| o.by)
    }
}

/// New whisper creation request. `target_username` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewWhisper {
    pub sender: Sender,
    pub target_username: String,
    pub secret_text: String,
}

/// Row layout of the `whispers` table
#[derive(Debug, Clone, FromRow)]
pub struct WhisperRow {
    pub id: i64,
    pub whisper_id: String,
    pub sender_id: i64,
    pub sender_username: Option<String>,
    pub sender_first_name: Option<String>,
    pub sender_last_name: Option<String>,
    pub target_username: String,
    pub secret_text: String,
    pub created_at: DateTime<Utc>,
    pub opened_at: Option<DateTime<Utc>>,
    pub opened_by: Option<i64>,
}

impl TryFrom<WhisperRow> for Whisper {
    type Error = AppError;

    fn try_from(row: WhisperRow) -> AppResult<Self> {
        let opened = match (row.opened_at, row.opened_by) {
            (Some(at), Some(by)) => Some(Opened { at, by }),
            (None, None) => None,
            _ => {
                return Err(AppError::corrupt_record(format!(
                    "whisper {} has only one of opened_at/opened_by set",
                    row.whisper_id
                )))
            }
        };

        Ok(Self {
            id: WhisperId(row.whisper_id),
            sender: Sender {
                id: row.sender_id,
                username: row.sender_username,
                first_name: row.sender_first_name,
                last_name: row.sender_last_name,
            },
            target_username: row.target_username,
            secret_text: row.secret_text,
            created_at: row.created_at,
            opened,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> WhisperRow {
        WhisperRow {
            id: 1,
            whisper_id: "w1".to_string(),
            sender_id: 7,
            sender_username: Some("carol".to_string()),
            sender_first_name: Some("Carol".to_string()),
            sender_last_name: None,
            target_username: "alice".to_string(),
            secret_text: "hi".to_string(),
            created_at: Utc::now(),
            opened_at: None,
            opened_by: None,
        }
    }

    #[test]
    fn test_reveal_token_round_trip() {
        let id = WhisperId::generate();
        let token = id.reveal_token();
        assert!(token.starts_with("show_"));
        assert_eq!(WhisperId::from_reveal_token(&token), Some(id));
    }

    #[test]
    fn test_reveal_token_rejects_other_callbacks() {
        assert_eq!(WhisperId::from_reveal_token("hide_abc"), None);
        assert_eq!(WhisperId::from_reveal_token("show_"), None);
        assert_eq!(WhisperId::from_reveal_token(""), None);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = WhisperId::generate();
        let b = WhisperId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_row_unopened() {
        let whisper = Whisper::try_from(row()).unwrap();
        assert!(!whisper.is_opened());
        assert_eq!(whisper.sender.username.as_deref(), Some("carol"));
        assert_eq!(whisper.opened_by(), None);
    }

    #[test]
    fn test_row_opened() {
        let now = Utc::now();
        let whisper = Whisper::try_from(WhisperRow {
            opened_at: Some(now),
            opened_by: Some(42),
            ..row()
        })
        .unwrap();
        assert_eq!(whisper.opened, Some(Opened { at: now, by: 42 }));
    }

    #[test]
    fn test_row_half_opened_is_corrupt() {
        let result = Whisper::try_from(WhisperRow {
            opened_by: Some(42),
            ..row()
        });
        assert!(matches!(result, Err(AppError::CorruptRecord(_))));
    }

    #[test]
    fn test_sender_handle_fallback() {
        let sender = Sender {
            id: 1,
            username: None,
            first_name: None,
            last_name: None,
        };
        assert_eq!(sender.handle_or("Unknown"), "Unknown");
    }
}
