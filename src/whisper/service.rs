use crate::db::{NewWhisper, Sender, WhisperId, WhisperStore};
use crate::error::AppResult;
use crate::whisper::audit::{AuditNotifier, AuditRecord};
use crate::whisper::parser::{parse_query, ParseError};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Lower-case and strip leading `@`s. Applied once before storage and before
/// every comparison.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

/// What the caller needs to build the placeholder shown in the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhisperArtifact {
    pub id: WhisperId,
    /// Normalized target
    pub target_username: String,
    /// Sender as received, not normalized
    pub sender: Sender,
}

impl WhisperArtifact {
    pub fn reveal_token(&self) -> String {
        self.id.reveal_token()
    }
}

/// Result of a composition submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Created(WhisperArtifact),
    /// User input error; render a usage hint
    Rejected(ParseError),
}

/// Turns compositions into stored whispers
#[derive(Clone)]
pub struct WhisperService {
    store: Arc<dyn WhisperStore>,
    audit: AuditNotifier,
}

impl std::fmt::Debug for WhisperService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperService")
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

impl WhisperService {
    pub fn new(store: Arc<dyn WhisperStore>, audit: AuditNotifier) -> Self {
        Self { store, audit }
    }

    /// Parse, normalize and store a composition, then dispatch audit copies.
    ///
    /// Only storage failures are returned as errors. Audit delivery runs in the
    /// background and cannot fail the submission.
    pub async fn submit(&self, composition: &str, sender: &Sender) -> AppResult<Submission> {
        let parsed = match parse_query(composition) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Rejected composition from {}: {}", sender.id, e);
                return Ok(Submission::Rejected(e));
            }
        };

        let target_username = normalize_username(&parsed.target_username);
        if target_username.is_empty() {
            return Ok(Submission::Rejected(ParseError::NoAddressee));
        }

        let new_whisper = NewWhisper {
            sender: sender.clone(),
            target_username: target_username.clone(),
            secret_text: parsed.secret_text,
        };
        let secret_text = new_whisper.secret_text.clone();

        let id = self.store.create(new_whisper).await.map_err(|e| {
            error!("Failed to store whisper from {}: {}", sender.id, e);
            e
        })?;
        info!("Whisper {} created by {} for @{}", id, sender.id, target_username);

        let handle = self.audit.dispatch(AuditRecord {
            whisper_id: id.clone(),
            sender: sender.clone(),
            target_username: target_username.clone(),
            secret_text,
            created_at: Utc::now(),
        });
        let audited = id.clone();
        tokio::spawn(async move {
            match handle.await {
                Ok(report) if !report.failed.is_empty() => {
                    warn!(
                        "Audit copy of whisper {} missed operators {:?}",
                        audited, report.failed
                    );
                }
                Ok(_) => {}
                Err(e) => error!("Audit task for whisper {} panicked: {}", audited, e),
            }
        });

        Ok(Submission::Created(WhisperArtifact {
            id,
            target_username,
            sender: sender.clone(),
        }))
    }
}
