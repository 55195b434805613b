use async_trait::async_trait;
use thiserror::Error;
use crate::models::{DiscoveryFilter, NewUser, Preference, Profile, Swipe, User, UserId};

/// Errors that can occur when interacting with the relational store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Transaction could not be serialized")]
    SerializationFailure,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(db_err.message().to_string());
            }
            // serialization_failure, deadlock_detected
            if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) {
                return StoreError::SerializationFailure;
            }
        }

        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::SqlxError(other),
        }
    }
}

/// A single open unit of work against the store.
///
/// Nothing a unit writes is visible to other units until `commit`; dropping
/// the unit without committing discards all of its effects. Reads see what
/// other units have committed, so callers serialize conflicting work with
/// `lock_users` first.
#[async_trait]
pub trait StoreUnit: Send {
    /// Lock the given user rows until the unit ends, in ascending id order.
    /// Returns the ids that exist and were locked.
    async fn lock_users(&mut self, ids: &[UserId]) -> Result<Vec<UserId>, StoreError>;

    /// True iff a swipe for the ordered pair exists
    async fn swipe_exists(&mut self, actor: UserId, target: UserId) -> Result<bool, StoreError>;

    /// Insert a swipe. The store rejects a second row for the same ordered
    /// pair with `UniqueViolation` and unknown users with `ForeignKeyViolation`.
    async fn insert_swipe(
        &mut self,
        actor: UserId,
        target: UserId,
        preference: Preference,
    ) -> Result<Swipe, StoreError>;

    /// Number of YES swipes from `target` to `actor`
    async fn count_reciprocal(&mut self, actor: UserId, target: UserId) -> Result<i64, StoreError>;

    /// Relative increment of a user's attractiveness score.
    /// Returns the number of rows touched.
    async fn increment_score(&mut self, user: UserId, delta: i64) -> Result<u64, StoreError>;

    async fn fetch_profile(&mut self, user: UserId) -> Result<Option<Profile>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Handle to the relational store, passed explicitly to every component
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new unit of work
    async fn begin(&self) -> Result<Box<dyn StoreUnit>, StoreError>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// All users except the requester and everyone the requester already
    /// swiped, narrowed by the filter's age and gender. When the filter asks
    /// for attractiveness ordering the rows come back in that order.
    async fn query_candidates(
        &self,
        requester: UserId,
        filter: &DiscoveryFilter,
    ) -> Result<Vec<User>, StoreError>;

    /// Swipes recorded by `actor`, newest first
    async fn swipes_by_actor(&self, actor: UserId) -> Result<Vec<Swipe>, StoreError>;

    /// Users who share a mutual YES with `user`
    async fn mutual_matches(&self, user: UserId) -> Result<Vec<Profile>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
