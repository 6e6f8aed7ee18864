use crate::db::models::{NewWhisper, Opened, Whisper, WhisperId};
use crate::db::store::{MarkOpened, WhisperStore};
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Non-persistent whisper store. The per-entry shard lock serves as the
/// critical section for `mark_opened`.
#[derive(Debug, Default)]
pub struct MemoryWhisperStore {
    whispers: DashMap<WhisperId, Whisper>,
}

impl MemoryWhisperStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.whispers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.whispers.is_empty()
    }
}

#[async_trait]
impl WhisperStore for MemoryWhisperStore {
    async fn create(&self, new_whisper: NewWhisper) -> AppResult<WhisperId> {
        loop {
            let id = WhisperId::generate();
            if let Entry::Vacant(slot) = self.whispers.entry(id.clone()) {
                slot.insert(Whisper {
                    id: id.clone(),
                    sender: new_whisper.sender,
                    target_username: new_whisper.target_username,
                    secret_text: new_whisper.secret_text,
                    created_at: Utc::now(),
                    opened: None,
                });
                return Ok(id);
            }
        }
    }

    async fn get(&self, id: &WhisperId) -> AppResult<Option<Whisper>> {
        Ok(self.whispers.get(id).map(|entry| entry.value().clone()))
    }

    async fn mark_opened(&self, id: &WhisperId, actor_id: i64) -> AppResult<MarkOpened> {
        let Some(mut entry) = self.whispers.get_mut(id) else {
            return Ok(MarkOpened::NotFound);
        };

        if entry.opened.is_some() {
            return Ok(MarkOpened::AlreadyOpened);
        }

        entry.opened = Some(Opened {
            at: Utc::now(),
            by: actor_id,
        });
        Ok(MarkOpened::OpenedNow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Sender;
    use std::sync::Arc;

    fn new_whisper() -> NewWhisper {
        NewWhisper {
            sender: Sender {
                id: 1,
                username: None,
                first_name: Some("Anon".to_string()),
                last_name: None,
            },
            target_username: "bob".to_string(),
            secret_text: "psst".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryWhisperStore::new();
        let id = store.create(new_whisper()).await.unwrap();
        let whisper = store.get(&id).await.unwrap().unwrap();
        assert_eq!(whisper.secret_text, "psst");
        assert!(!whisper.is_opened());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_opened_transitions_once() {
        let store = MemoryWhisperStore::new();
        let id = store.create(new_whisper()).await.unwrap();
        assert_eq!(store.mark_opened(&id, 9).await.unwrap(), MarkOpened::OpenedNow);
        assert_eq!(store.mark_opened(&id, 10).await.unwrap(), MarkOpened::AlreadyOpened);
        assert_eq!(store.get(&id).await.unwrap().unwrap().opened_by(), Some(9));
    }

    #[tokio::test]
    async fn test_mark_opened_unknown() {
        let store = MemoryWhisperStore::new();
        let result = store.mark_opened(&WhisperId::from("nope"), 1).await.unwrap();
        assert_eq!(result, MarkOpened::NotFound);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mark_opened() {
        let store = Arc::new(MemoryWhisperStore::new());
        let id = store.create(new_whisper()).await.unwrap();

        let handles: Vec<_> = (0..64)
            .map(|actor| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move { store.mark_opened(&id, actor).await.unwrap() })
            })
            .collect();

        let mut opened_now = 0;
        for handle in handles {
            if handle.await.unwrap() == MarkOpened::OpenedNow {
                opened_now += 1;
            }
        }
        assert_eq!(opened_now, 1);
    }
}
