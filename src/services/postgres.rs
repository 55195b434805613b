use async_trait::async_trait;
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::time::Duration;
use crate::models::{DiscoveryFilter, NewUser, OrderBy, Preference, Profile, Swipe, User, UserId};
use crate::services::store::{Store, StoreError, StoreUnit};

/// Isolation level every swipe transaction is opened with
///
/// Swipes on the same pair are ordered by row locks on both users, so
/// `ReadCommitted` is enough and never fails with a serialization error.
/// The stricter levels are accepted but make concurrent swipes abort with
/// SQLSTATE 40001 under contention, which the engine then retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    fn statement(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            IsolationLevel::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            IsolationLevel::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

const USER_COLUMNS: &str = "id, name, age, gender, latitude, longitude, attractiveness_score";
const SWIPE_COLUMNS: &str =
    "id, user_id AS actor_id, target_user_id AS target_id, preference, created_at";

/// PostgreSQL-backed store for users and swipes
///
/// Uniqueness of (user_id, target_user_id) is enforced by the schema, so two
/// concurrent attempts to record the same pair can never both commit.
pub struct PostgresStore {
    pool: PgPool,
    isolation: IsolationLevel,
}

impl PostgresStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
        isolation: IsolationLevel,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool, isolation })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
        isolation: IsolationLevel,
    ) -> Result<Self, StoreError> {
        tracing::info!(?isolation, "Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
            isolation,
        )
        .await
    }

    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreUnit>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Must be the first statement of the transaction
        sqlx::query(self.isolation.statement())
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PostgresUnit { tx }))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            r#"
            INSERT INTO users (name, age, gender, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let created = sqlx::query_as::<_, User>(&query)
            .bind(&user.name)
            .bind(user.age)
            .bind(&user.gender)
            .bind(user.location.latitude)
            .bind(user.location.longitude)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(user_id = created.id, "Created user");

        Ok(created)
    }

    async fn query_candidates(
        &self,
        requester: UserId,
        filter: &DiscoveryFilter,
    ) -> Result<Vec<User>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        qb.push(USER_COLUMNS);
        qb.push(" FROM users WHERE id <> ");
        qb.push_bind(requester);
        qb.push(" AND id NOT IN (SELECT target_user_id FROM swipes WHERE user_id = ");
        qb.push_bind(requester);
        qb.push(")");

        if let Some(age) = filter.age {
            qb.push(" AND age = ");
            qb.push_bind(age);
        }

        if let Some(gender) = &filter.gender {
            qb.push(" AND LOWER(gender) = LOWER(");
            qb.push_bind(gender.clone());
            qb.push(")");
        }

        // Distance is not indexable here; it is ranked after fetch
        if filter.order_by == Some(OrderBy::AttractivenessScore) {
            qb.push(" ORDER BY attractiveness_score DESC, id ASC");
        }

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;

        tracing::debug!(requester, candidates = users.len(), "Queried discovery candidates");

        Ok(users)
    }

    async fn swipes_by_actor(&self, actor: UserId) -> Result<Vec<Swipe>, StoreError> {
        let query = format!(
            "SELECT {} FROM swipes WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            SWIPE_COLUMNS
        );

        let swipes = sqlx::query_as::<_, Swipe>(&query)
            .bind(actor)
            .fetch_all(&self.pool)
            .await?;

        Ok(swipes)
    }

    async fn mutual_matches(&self, user: UserId) -> Result<Vec<Profile>, StoreError> {
        let query = r#"
            SELECT u.id, u.name, u.age, u.gender
            FROM swipes s
            JOIN swipes r
              ON r.user_id = s.target_user_id
             AND r.target_user_id = s.user_id
             AND r.preference = 'YES'
            JOIN users u ON u.id = s.target_user_id
            WHERE s.user_id = $1 AND s.preference = 'YES'
            ORDER BY u.id
        "#;

        let matches = sqlx::query_as::<_, Profile>(query)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;

        Ok(matches)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

/// Open transaction on a pooled connection.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
pub struct PostgresUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreUnit for PostgresUnit {
    async fn lock_users(&mut self, ids: &[UserId]) -> Result<Vec<UserId>, StoreError> {
        // Rows are locked in sort order, so two units locking the same pair
        // from opposite ends cannot deadlock
        let locked: Vec<UserId> = sqlx::query_scalar(
            "SELECT id FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids.to_vec())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(locked)
    }

    async fn swipe_exists(&mut self, actor: UserId, target: UserId) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM swipes WHERE user_id = $1 AND target_user_id = $2)",
        )
        .bind(actor)
        .bind(target)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn insert_swipe(
        &mut self,
        actor: UserId,
        target: UserId,
        preference: Preference,
    ) -> Result<Swipe, StoreError> {
        let query = format!(
            r#"
            INSERT INTO swipes (user_id, target_user_id, preference, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING {}
            "#,
            SWIPE_COLUMNS
        );

        let swipe = sqlx::query_as::<_, Swipe>(&query)
            .bind(actor)
            .bind(target)
            .bind(preference)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(swipe)
    }

    async fn count_reciprocal(&mut self, actor: UserId, target: UserId) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM swipes
            WHERE user_id = $1 AND target_user_id = $2 AND preference = 'YES'
            "#,
        )
        .bind(target)
        .bind(actor)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn increment_score(&mut self, user: UserId, delta: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET attractiveness_score = attractiveness_score + $2 WHERE id = $1",
        )
        .bind(user)
        .bind(delta)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn fetch_profile(&mut self, user: UserId) -> Result<Option<Profile>, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, name, age, gender FROM users WHERE id = $1",
        )
        .bind(user)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(profile)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_defaults_to_read_committed() {
        assert_eq!(IsolationLevel::default(), IsolationLevel::ReadCommitted);
        assert!(IsolationLevel::default().statement().ends_with("READ COMMITTED"));
        assert!(IsolationLevel::Serializable.statement().ends_with("SERIALIZABLE"));
    }

    #[test]
    fn test_isolation_deserializes_snake_case() {
        let level: IsolationLevel = serde_json::from_str("\"repeatable_read\"").unwrap();
        assert_eq!(level, IsolationLevel::RepeatableRead);
    }
}
