//! In-process session cache: the single source of truth for live records.
//!
//! The cache owns a concurrent map from user id to the one live
//! `SessionRecord` for that user. It is an explicit object handed to callers
//! by reference, with its lifecycle tied to process start/stop -- there is no
//! ambient global state. Records load lazily from the repository (decoding
//! the history payload on the way in) and reach durability only through an
//! explicit `flush`.
//!
//! # Concurrency
//!
//! Handlers run on a cooperative event loop and may interleave at any await
//! point. No per-user lock is held across the repository I/O, so two
//! concurrent handlers for the same user can both mutate and the second
//! flush overwrites the first durable write (last-write-wins, no merge).
//! This window is accepted for low per-user request rates; losing a process
//! loses at most the unflushed last exchange, never the whole history.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use palaver_types::error::StoreError;
use palaver_types::session::{SessionRecord, UserSummary};

use crate::codec::HistoryCodec;
use crate::session::repository::SessionRepository;

/// The shared handle to a live session record.
///
/// All mutation happens through this handle; never hold the lock across an
/// outbound call.
pub type SharedSession = Arc<Mutex<SessionRecord>>;

/// Maps each user id to its single live `SessionRecord`.
pub struct SessionCache<R, C> {
    sessions: DashMap<i64, SharedSession>,
    repo: R,
    codec: C,
}

impl<R: SessionRepository, C: HistoryCodec> SessionCache<R, C> {
    pub fn new(repo: R, codec: C) -> Self {
        Self {
            sessions: DashMap::new(),
            repo,
            codec,
        }
    }

    /// Return the live record for `user_id`, loading it from the repository
    /// (or constructing defaults) on first access.
    ///
    /// Concurrent misses for the same user may each read the repository, but
    /// the entry API guarantees only one result is installed as the live
    /// copy; the losers receive the winner's handle.
    pub async fn get_or_create(&self, user_id: i64) -> Result<SharedSession, StoreError> {
        if let Some(live) = self.sessions.get(&user_id) {
            return Ok(live.clone());
        }

        let record = match self.repo.get(user_id).await? {
            Some(snapshot) => {
                let decoded = self.codec.decode(&snapshot.history_payload);
                for warning in &decoded.warnings {
                    warn!(user_id, %warning, "history decode degraded");
                }
                SessionRecord::from_snapshot(snapshot, decoded.turns)
            }
            None => {
                debug!(user_id, "no persisted session, creating defaults");
                SessionRecord::new(user_id)
            }
        };

        let live = self
            .sessions
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(record)))
            .clone();
        Ok(live)
    }

    /// Persist the live record for `user_id`.
    ///
    /// The snapshot (history re-encoded through the codec) is built under
    /// the record lock, the lock is released, and only then does the upsert
    /// run. On failure the in-memory copy is untouched; the caller decides
    /// whether to retry.
    ///
    /// Flushing a user with no live session is a logged no-op.
    pub async fn flush(&self, user_id: i64) -> Result<(), StoreError> {
        let Some(live) = self.sessions.get(&user_id).map(|r| r.value().clone()) else {
            warn!(user_id, "flush requested for user with no live session");
            return Ok(());
        };

        let snapshot = {
            let record = live.lock().await;
            let payload = self.codec.encode(&record.history)?;
            record.to_snapshot(payload, chrono::Utc::now())
        };

        self.repo.upsert(&snapshot).await
    }

    /// Drop the live copy for `user_id`, if any. Unflushed mutations are
    /// lost; the next `get_or_create` reloads from the repository.
    pub fn evict(&self, user_id: i64) {
        self.sessions.remove(&user_id);
    }

    /// Number of live records currently held.
    pub fn live_count(&self) -> usize {
        self.sessions.len()
    }

    /// List every persisted user. Delegates to the repository; the cache
    /// holds no listing state of its own.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError> {
        self.repo.list_users().await
    }
}
