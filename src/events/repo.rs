use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// A calendar event. Owner-scoped like clients; `client_id` optionally links
/// an event to one of the same user's clients and is nulled when that client
/// is deleted.
#[derive(Debug, Clone, FromRow)]
pub struct Event {
    pub id: i64,
    pub user_id: i64,
    pub client_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: OffsetDateTime,
    pub ends_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct EventChanges {
    pub client_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: OffsetDateTime,
    pub ends_at: Option<OffsetDateTime>,
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Event>> {
    let rows = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, user_id, client_id, title, description, starts_at, ends_at, created_at
        FROM events
        WHERE user_id = $1
        ORDER BY starts_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<Option<Event>> {
    let row = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, user_id, client_id, title, description, starts_at, ends_at, created_at
        FROM events
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert(db: &PgPool, user_id: i64, changes: EventChanges) -> anyhow::Result<Event> {
    let row = sqlx::query_as::<_, Event>(
        r#"
        INSERT INTO events (user_id, client_id, title, description, starts_at, ends_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, client_id, title, description, starts_at, ends_at, created_at
        "#,
    )
    .bind(user_id)
    .bind(changes.client_id)
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.starts_at)
    .bind(changes.ends_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    user_id: i64,
    id: i64,
    changes: EventChanges,
) -> anyhow::Result<Option<Event>> {
    let row = sqlx::query_as::<_, Event>(
        r#"
        UPDATE events
        SET client_id = $3, title = $4, description = $5, starts_at = $6, ends_at = $7
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, client_id, title, description, starts_at, ends_at, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(changes.client_id)
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.starts_at)
    .bind(changes.ends_at)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
