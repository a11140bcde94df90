//! SQLite session repository implementation.
//!
//! Implements `SessionRepository` from `palaver-core` using sqlx with split
//! read/write pools: raw queries, a private Row struct for SQLite-to-domain
//! mapping, full-row upserts keyed by user id.
//!
//! The history column is stored exactly as the codec produced it; this layer
//! never decrypts or inspects it.

use chrono::{DateTime, Utc};
use sqlx::Row;

use palaver_core::session::repository::SessionRepository;
use palaver_types::error::StoreError;
use palaver_types::session::{ImageQuality, ImageSize, ModelProfile, SessionSnapshot, UserSummary};

use super::pool::DatabasePool;

/// Display name surfaced for rows that never stored one.
const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    user_id: String,
    display_name: String,
    model: String,
    model_label: String,
    model_chat_prefix: String,
    history: String,
    turn_count: i64,
    output_budget_chars: i64,
    voice_reply_enabled: bool,
    system_prompt: String,
    image_quality: String,
    image_size: String,
    updated_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            display_name: row.try_get("display_name")?,
            model: row.try_get("model")?,
            model_label: row.try_get("model_label")?,
            model_chat_prefix: row.try_get("model_chat_prefix")?,
            history: row.try_get("history")?,
            turn_count: row.try_get("turn_count")?,
            output_budget_chars: row.try_get("output_budget_chars")?,
            voice_reply_enabled: row.try_get("voice_reply_enabled")?,
            system_prompt: row.try_get("system_prompt")?,
            image_quality: row.try_get("image_quality")?,
            image_size: row.try_get("image_size")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_snapshot(self) -> Result<SessionSnapshot, StoreError> {
        let user_id: i64 = self
            .user_id
            .parse()
            .map_err(|_| StoreError::Query(format!("invalid user id: '{}'", self.user_id)))?;
        let image_quality: ImageQuality =
            self.image_quality.parse().map_err(StoreError::Query)?;
        let image_size: ImageSize = self.image_size.parse().map_err(StoreError::Query)?;
        let updated_at = parse_datetime(&self.updated_at)?;

        Ok(SessionSnapshot {
            user_id,
            display_name: self.display_name,
            model: ModelProfile::new(self.model, self.model_label, self.model_chat_prefix),
            history_payload: self.history,
            turn_count: self.turn_count as u32,
            output_budget_chars: self.output_budget_chars as u32,
            voice_reply_enabled: self.voice_reply_enabled,
            system_prompt: self.system_prompt,
            image_quality,
            image_size,
            updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn map_sqlx_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Connection,
        other => StoreError::Query(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// SessionRepository implementation
// ---------------------------------------------------------------------------

impl SessionRepository for SqliteSessionRepository {
    async fn get(&self, user_id: i64) -> Result<Option<SessionSnapshot>, StoreError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_err)?;

        match row {
            Some(row) => {
                let session_row = SessionRow::from_row(&row).map_err(map_sqlx_err)?;
                Ok(Some(session_row.into_snapshot()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO sessions (user_id, model, model_label, model_chat_prefix, history,
                   turn_count, output_budget_chars, voice_reply_enabled, system_prompt,
                   image_quality, image_size, display_name, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   model = excluded.model,
                   model_label = excluded.model_label,
                   model_chat_prefix = excluded.model_chat_prefix,
                   history = excluded.history,
                   turn_count = excluded.turn_count,
                   output_budget_chars = excluded.output_budget_chars,
                   voice_reply_enabled = excluded.voice_reply_enabled,
                   system_prompt = excluded.system_prompt,
                   image_quality = excluded.image_quality,
                   image_size = excluded.image_size,
                   display_name = excluded.display_name,
                   updated_at = excluded.updated_at"#,
        )
        .bind(snapshot.user_id.to_string())
        .bind(&snapshot.model.id)
        .bind(&snapshot.model.label)
        .bind(&snapshot.model.chat_prefix)
        .bind(&snapshot.history_payload)
        .bind(snapshot.turn_count as i64)
        .bind(snapshot.output_budget_chars as i64)
        .bind(snapshot.voice_reply_enabled)
        .bind(&snapshot.system_prompt)
        .bind(snapshot.image_quality.to_string())
        .bind(snapshot.image_size.to_string())
        .bind(&snapshot.display_name)
        .bind(snapshot.updated_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError> {
        let rows = sqlx::query("SELECT user_id, display_name FROM sessions ORDER BY user_id")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_err)?;

        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw_id: String = row.try_get("user_id").map_err(map_sqlx_err)?;
            let user_id: i64 = raw_id
                .parse()
                .map_err(|_| StoreError::Query(format!("invalid user id: '{raw_id}'")))?;
            let display_name: String = row.try_get("display_name").map_err(map_sqlx_err)?;
            let display_name = if display_name.is_empty() {
                UNKNOWN_DISPLAY_NAME.to_string()
            } else {
                display_name
            };
            users.push(UserSummary {
                user_id,
                display_name,
            });
        }

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::history::AesHistoryCodec;
    use crate::sqlite::pool::DatabasePool;
    use palaver_core::session::cache::SessionCache;
    use palaver_types::session::SessionRecord;
    use palaver_types::turn::Turn;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn test_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    fn make_snapshot(user_id: i64) -> SessionSnapshot {
        let mut record = SessionRecord::new(user_id);
        record.display_name = "alice".to_string();
        record.push_user("hi");
        record.record_exchange();
        record.to_snapshot(r#"[{"role":"user","content":"hi"}]"#.to_string(), Utc::now())
    }

    #[tokio::test]
    async fn test_upsert_and_get_roundtrip() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let snapshot = make_snapshot(42);
        repo.upsert(&snapshot).await.unwrap();

        let found = repo.get(42).await.unwrap().unwrap();
        assert_eq!(found.user_id, 42);
        assert_eq!(found.display_name, "alice");
        assert_eq!(found.model, snapshot.model);
        assert_eq!(found.history_payload, snapshot.history_payload);
        assert_eq!(found.turn_count, 1);
        assert_eq!(found.output_budget_chars, snapshot.output_budget_chars);
        assert!(!found.voice_reply_enabled);
        assert_eq!(found.image_quality, ImageQuality::Standard);
        assert_eq!(found.image_size, ImageSize::Square1024);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        assert!(repo.get(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_full_row() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let mut snapshot = make_snapshot(7);
        repo.upsert(&snapshot).await.unwrap();

        snapshot.display_name = "bob".to_string();
        snapshot.turn_count = 9;
        snapshot.voice_reply_enabled = true;
        snapshot.image_quality = ImageQuality::Hd;
        snapshot.history_payload = "ENC:ERROR_NO_KEY".to_string();
        repo.upsert(&snapshot).await.unwrap();

        let found = repo.get(7).await.unwrap().unwrap();
        assert_eq!(found.display_name, "bob");
        assert_eq!(found.turn_count, 9);
        assert!(found.voice_reply_enabled);
        assert_eq!(found.image_quality, ImageQuality::Hd);
        assert_eq!(found.history_payload, "ENC:ERROR_NO_KEY");
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let snapshot = make_snapshot(3);
        repo.upsert(&snapshot).await.unwrap();
        repo.upsert(&snapshot).await.unwrap();

        let users = repo.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_list_users_maps_empty_name_to_unknown() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let named = make_snapshot(1);
        repo.upsert(&named).await.unwrap();

        let anonymous = SessionRecord::new(2).to_snapshot(String::new(), Utc::now());
        repo.upsert(&anonymous).await.unwrap();

        let users = repo.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].display_name, "alice");
        assert_eq!(users[1].display_name, "Unknown");
    }

    #[tokio::test]
    async fn test_read_your_writes() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        for turn_count in 0..5u32 {
            let mut snapshot = make_snapshot(11);
            snapshot.turn_count = turn_count;
            repo.upsert(&snapshot).await.unwrap();
            let found = repo.get(11).await.unwrap().unwrap();
            assert_eq!(found.turn_count, turn_count);
        }
    }

    // Full stack: cache + AES codec + SQLite. Flush, drop the live copy,
    // reload, and the history survives encrypted at rest.
    #[tokio::test]
    async fn test_cache_roundtrip_through_encrypted_store() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());
        let cache = SessionCache::new(repo, AesHistoryCodec::new(&test_key()));

        let live = cache.get_or_create(888_888).await.unwrap();
        live.lock().await.push_user("Highly private message");
        cache.flush(888_888).await.unwrap();

        // At rest: tagged ciphertext, plaintext nowhere in the row.
        let raw: (String,) = sqlx::query_as("SELECT history FROM sessions WHERE user_id = ?")
            .bind("888888")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert!(raw.0.starts_with("ENC:"));
        assert!(!raw.0.contains("Highly private message"));

        cache.evict(888_888);
        let reloaded = cache.get_or_create(888_888).await.unwrap();
        let record = reloaded.lock().await;
        assert_eq!(record.history, vec![Turn::user("Highly private message")]);
    }

    // Key rotation without re-encryption: the stored row survives, the
    // history degrades to a visible warning turn instead of crashing.
    #[tokio::test]
    async fn test_reload_with_wrong_key_degrades_visibly() {
        let pool = test_pool().await;

        {
            let repo = SqliteSessionRepository::new(pool.clone());
            let cache = SessionCache::new(repo, AesHistoryCodec::new(&test_key()));
            let live = cache.get_or_create(21).await.unwrap();
            live.lock().await.push_user("secret plans");
            live.lock().await.voice_reply_enabled = true;
            cache.flush(21).await.unwrap();
        }

        let mut wrong_key = test_key();
        wrong_key[31] = 0xAA;
        let repo = SqliteSessionRepository::new(pool.clone());
        let cache = SessionCache::new(repo, AesHistoryCodec::new(&wrong_key));

        let live = cache.get_or_create(21).await.unwrap();
        let record = live.lock().await;
        assert_eq!(record.history.len(), 1);
        assert!(record.history[0].content.contains("could not be decrypted"));
        // Settings outside the history column are unaffected.
        assert!(record.voice_reply_enabled);
    }

    // Legacy plaintext rows (written before encryption existed) still load.
    #[tokio::test]
    async fn test_legacy_plaintext_row_still_decodes() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());

        let legacy = SessionRecord::new(31)
            .to_snapshot(r#"[{"role":"user","content":"old times"}]"#.to_string(), Utc::now());
        repo.upsert(&legacy).await.unwrap();

        let cache = SessionCache::new(repo, AesHistoryCodec::new(&test_key()));
        let live = cache.get_or_create(31).await.unwrap();
        assert_eq!(live.lock().await.history, vec![Turn::user("old times")]);
    }
}
