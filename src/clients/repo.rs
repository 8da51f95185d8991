use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// A client record. Every query is scoped by `user_id`, so one user's rows
/// are invisible to another; a foreign id simply reads as absent.
#[derive(Debug, Clone, FromRow)]
pub struct Client {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct ClientChanges {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Client>> {
    let rows = sqlx::query_as::<_, Client>(
        r#"
        SELECT id, user_id, name, email, phone, created_at
        FROM clients
        WHERE user_id = $1
        ORDER BY created_at DESC
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

pub async fn get(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<Option<Client>> {
    let row = sqlx::query_as::<_, Client>(
        r#"
        SELECT id, user_id, name, email, phone, created_at
        FROM clients
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert(db: &PgPool, user_id: i64, changes: ClientChanges) -> anyhow::Result<Client> {
    let row = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (user_id, name, email, phone)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, name, email, phone, created_at
        "#,
    )
    .bind(user_id)
    .bind(changes.name)
    .bind(changes.email)
    .bind(changes.phone)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Full replacement of the mutable columns. `None` returns `Ok(None)` when
/// the row does not exist for this user.
pub async fn update(
    db: &PgPool,
    user_id: i64,
    id: i64,
    changes: ClientChanges,
) -> anyhow::Result<Option<Client>> {
    let row = sqlx::query_as::<_, Client>(
        r#"
        UPDATE clients
        SET name = $3, email = $4, phone = $5
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, email, phone, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(changes.name)
    .bind(changes.email)
    .bind(changes.phone)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Returns false when nothing was deleted. Events referencing the client
/// keep their rows with `client_id` nulled (FK SET NULL).
pub async fn delete(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM clients WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
