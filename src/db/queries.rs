use crate::db::models::*;
use crate::db::store::{MarkOpened, WhisperStore};
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::info;

pub type DbPool = Pool<Sqlite>;

/// SQLite-backed whisper store
#[derive(Debug, Clone)]
pub struct SqliteWhisperStore {
    pool: DbPool,
}

impl SqliteWhisperStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn exists(&self, id: &WhisperId) -> AppResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM whispers WHERE whisper_id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }
}

#[async_trait]
impl WhisperStore for SqliteWhisperStore {
    async fn create(&self, new_whisper: NewWhisper) -> AppResult<WhisperId> {
        let whisper_id = WhisperId::generate();

        sqlx::query(
            r#"
            INSERT INTO whispers (whisper_id, sender_id, sender_username, sender_first_name, sender_last_name, target_username, secret_text, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(whisper_id.as_str())
        .bind(new_whisper.sender.id)
        .bind(&new_whisper.sender.username)
        .bind(&new_whisper.sender.first_name)
        .bind(&new_whisper.sender.last_name)
        .bind(&new_whisper.target_username)
        .bind(&new_whisper.secret_text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(whisper_id)
    }

    async fn get(&self, id: &WhisperId) -> AppResult<Option<Whisper>> {
        let row = sqlx::query_as::<_, WhisperRow>("SELECT * FROM whispers WHERE whisper_id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Whisper::try_from).transpose()
    }

    async fn mark_opened(&self, id: &WhisperId, actor_id: i64) -> AppResult<MarkOpened> {
        let result = sqlx::query(
            r#"
            UPDATE whispers SET opened_at = ?, opened_by = ?
            WHERE whisper_id = ? AND opened_at IS NULL AND opened_by IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(actor_id)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(MarkOpened::OpenedNow);
        }

        // The update already decided the transition; this only labels the no-op.
        if self.exists(id).await? {
            Ok(MarkOpened::AlreadyOpened)
        } else {
            Ok(MarkOpened::NotFound)
        }
    }
}

#[cfg(test)]
pub async fn setup_test_db() -> DbPool {
    use sqlx::sqlite::SqlitePoolOptions;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_db(&pool).await.expect("Failed to init database");
    pool
}

/// Initialize database with migrations
pub async fn init_db(pool: &DbPool) -> AppResult<()> {
    info!("Running database migrations");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS whispers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            whisper_id TEXT UNIQUE NOT NULL,
            sender_id INTEGER NOT NULL,
            sender_username TEXT,
            sender_first_name TEXT,
            sender_last_name TEXT,
            target_username TEXT NOT NULL,
            secret_text TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            opened_at DATETIME,
            opened_by INTEGER,
            CHECK ((opened_at IS NULL) = (opened_by IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_whispers_whisper_id ON whispers(whisper_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_whispers_created_at ON whispers(created_at DESC)")
        .execute(pool)
        .await?;

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_whisper(target: &str, text: &str) -> NewWhisper {
        NewWhisper {
            sender: Sender {
                id: 7,
                username: Some("carol".to_string()),
                first_name: Some("Carol".to_string()),
                last_name: Some("Danvers".to_string()),
            },
            target_username: target.to_string(),
            secret_text: text.to_string(),
        }
    }

    async fn store() -> SqliteWhisperStore {
        SqliteWhisperStore::new(setup_test_db().await)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = store().await;
        let id = store.create(new_whisper("alice", "meet me at noon")).await.unwrap();

        let whisper = store.get(&id).await.unwrap().unwrap();
        assert_eq!(whisper.id, id);
        assert_eq!(whisper.target_username, "alice");
        assert_eq!(whisper.secret_text, "meet me at noon");
        assert_eq!(whisper.sender.id, 7);
        assert_eq!(whisper.sender.last_name.as_deref(), Some("Danvers"));
        assert!(whisper.opened.is_none());
    }

    #[tokio::test]
    async fn test_secret_text_stored_verbatim() {
        let store = store().await;
        let text = "  spaces, 'quotes', \"dq\" and emoji 🤫\nnewline ";
        let id = store.create(new_whisper("alice", text)).await.unwrap();
        let whisper = store.get(&id).await.unwrap().unwrap();
        assert_eq!(whisper.secret_text, text);
    }

    #[tokio::test]
    async fn test_get_nonexistent_returns_none() {
        let store = store().await;
        let result = store.get(&WhisperId::from("missing")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_assigns_distinct_ids() {
        let store = store().await;
        let a = store.create(new_whisper("alice", "one")).await.unwrap();
        let b = store.create(new_whisper("alice", "two")).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_mark_opened_first_wins() {
        let store = store().await;
        let id = store.create(new_whisper("alice", "x")).await.unwrap();

        assert_eq!(store.mark_opened(&id, 100).await.unwrap(), MarkOpened::OpenedNow);
        let first = store.get(&id).await.unwrap().unwrap().opened.unwrap();
        assert_eq!(first.by, 100);

        assert_eq!(store.mark_opened(&id, 200).await.unwrap(), MarkOpened::AlreadyOpened);
        let after = store.get(&id).await.unwrap().unwrap().opened.unwrap();
        assert_eq!(after, first);
    }

    #[tokio::test]
    async fn test_mark_opened_nonexistent() {
        let store = store().await;
        let result = store.mark_opened(&WhisperId::from("missing"), 1).await.unwrap();
        assert_eq!(result, MarkOpened::NotFound);
    }

    #[tokio::test]
    async fn test_mark_opened_concurrent_single_transition() {
        let store = Arc::new(store().await);
        let id = store.create(new_whisper("alice", "x")).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|actor| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move { (actor, store.mark_opened(&id, actor).await.unwrap()) })
            })
            .collect();

        let results: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let winners: Vec<_> = results
            .iter()
            .filter(|(_, outcome)| *outcome == MarkOpened::OpenedNow)
            .collect();
        assert_eq!(winners.len(), 1);

        let opened = store.get(&id).await.unwrap().unwrap().opened.unwrap();
        assert_eq!(opened.by, winners[0].0);
    }

    #[tokio::test]
    async fn test_half_opened_rows_rejected_by_schema() {
        let store = store().await;
        let id = store.create(new_whisper("alice", "x")).await.unwrap();
        let result = sqlx::query("UPDATE whispers SET opened_by = 5 WHERE whisper_id = ?")
            .bind(id.as_str())
            .execute(store.pool())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_init_db_is_idempotent() {
        let pool = setup_test_db().await;
        init_db(&pool).await.unwrap();
    }
}
