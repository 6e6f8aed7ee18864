use crate::db::models::{NewWhisper, Whisper, WhisperId};
use crate::error::AppResult;
use async_trait::async_trait;

/// Result of the conditional "first reveal wins" update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOpened {
    /// This call set `opened_at`/`opened_by`
    OpenedNow,
    /// An earlier call already set them; nothing changed
    AlreadyOpened,
    NotFound,
}

/// Persistence for whisper records.
///
/// `mark_opened` is the linearization point of the reveal state machine: it
/// must behave as a single compare-and-set on the record, never as a
/// read-then-write pair. Implementations must not cache whisper state across
/// calls.
#[async_trait]
pub trait WhisperStore: Send + Sync {
    /// Persist a new unopened whisper under a fresh id
    async fn create(&self, new_whisper: NewWhisper) -> AppResult<WhisperId>;

    /// Exact-match lookup
    async fn get(&self, id: &WhisperId) -> AppResult<Option<Whisper>>;

    /// Set `opened_at = now, opened_by = actor_id` only if the whisper is unopened
    async fn mark_opened(&self, id: &WhisperId, actor_id: i64) -> AppResult<MarkOpened>;
}
