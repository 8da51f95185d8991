use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// User record in the database. The hash never leaves the server; responses
/// are built from `UserSummary` instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub password_hash: String,
    pub enabled: bool,
    pub created_at: OffsetDateTime,
}

/// One-time verification code bound to a single user.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub expires_at: OffsetDateTime,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

/// Key-value style lookup and mutation of user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    /// Insert a new, disabled user.
    async fn insert(
        &self,
        email: &str,
        username: Option<&str>,
        password_hash: &str,
    ) -> anyhow::Result<User>;
    async fn update(&self, id: i64, changes: UserChanges) -> anyhow::Result<User>;
    async fn set_enabled(&self, id: i64, enabled: bool) -> anyhow::Result<User>;
    /// Fails while a live verification code still references the user.
    async fn delete(&self, id: i64) -> anyhow::Result<()>;
}

/// Persistence for verification codes.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Atomically replaces any outstanding code for the user, keeping the
    /// at-most-one-per-user invariant under concurrent requests.
    async fn replace_for_user(
        &self,
        user_id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<VerificationCode>;
    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<VerificationCode>>;
    /// Deletes the code and enables its user in one transaction, so a
    /// failure rolls both back. `None` when a racing consumer already
    /// claimed the code.
    async fn consume(&self, code: &VerificationCode) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, enabled, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, enabled, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, enabled, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(
        &self,
        email: &str,
        username: Option<&str>,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, username, password_hash, enabled, created_at
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                username = COALESCE($3, username),
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING id, email, username, password_hash, enabled, created_at
            "#,
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.username)
        .bind(changes.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_enabled(&self, id: i64, enabled: bool) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET enabled = $2
            WHERE id = $1
            RETURNING id, email, username, password_hash, enabled, created_at
            "#,
        )
        .bind(id)
        .bind(enabled)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CodeStore for PgStore {
    async fn replace_for_user(
        &self,
        user_id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<VerificationCode> {
        // Delete-then-insert in one transaction; the UNIQUE (user_id)
        // constraint turns a racing request into an error instead of a
        // second live code.
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM verification_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let code = sqlx::query_as::<_, VerificationCode>(
            r#"
            INSERT INTO verification_codes (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, token, user_id, expires_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(code)
    }

    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<VerificationCode>> {
        let code = sqlx::query_as::<_, VerificationCode>(
            r#"
            SELECT id, token, user_id, expires_at
            FROM verification_codes
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(code)
    }

    async fn consume(&self, code: &VerificationCode) -> anyhow::Result<Option<User>> {
        // Deleting the row is the claim; a racing consumer gets zero rows
        // and the transaction never touches the user.
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM verification_codes WHERE id = $1")
            .bind(code.id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Ok(None);
        }
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET enabled = TRUE
            WHERE id = $1
            RETURNING id, email, username, password_hash, enabled, created_at
            "#,
        )
        .bind(code.user_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(user))
    }
}
