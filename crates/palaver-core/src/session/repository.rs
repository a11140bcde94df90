//! SessionRepository trait definition.
//!
//! Durable key-value persistence of session snapshots, keyed by user id.
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).
//!
//! Implementations live in palaver-infra (e.g. `SqliteSessionRepository`).

use palaver_types::error::StoreError;
use palaver_types::session::{SessionSnapshot, UserSummary};

/// Repository trait for session snapshot persistence.
///
/// `upsert` is a full-row replace-or-insert keyed by `user_id`: idempotent
/// and safe to retry. A completed `upsert` is visible to subsequent `get`
/// calls (read-your-writes); cross-process durability ordering is whatever
/// the underlying engine commits.
pub trait SessionRepository: Send + Sync {
    /// Fetch the persisted snapshot for a user, if one exists.
    fn get(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<SessionSnapshot>, StoreError>> + Send;

    /// Insert or fully replace the row for `snapshot.user_id`.
    fn upsert(
        &self,
        snapshot: &SessionSnapshot,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// List every known user with their advisory display name.
    fn list_users(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<UserSummary>, StoreError>> + Send;
}
