use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use time::OffsetDateTime;

/// Note record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

const NOTE_COLUMNS: &str = "id, title, content, created_at, updated_at";

pub async fn insert(
    conn: &mut PgConnection,
    title: &str,
    content: &str,
) -> Result<Note, sqlx::Error> {
    sqlx::query_as::<_, Note>(&format!(
        "INSERT INTO notes (title, content)
         VALUES ($1, $2)
         RETURNING {NOTE_COLUMNS}"
    ))
    .bind(title)
    .bind(content)
    .fetch_one(conn)
    .await
}

pub async fn list(
    conn: &mut PgConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>(&format!(
        "SELECT {NOTE_COLUMNS}
         FROM notes
         ORDER BY created_at DESC
         LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await
}

pub async fn find(conn: &mut PgConnection, id: i64) -> Result<Option<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Replace title and content; `None` when no such note exists.
pub async fn update(
    conn: &mut PgConnection,
    id: i64,
    title: &str,
    content: &str,
) -> Result<Option<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>(&format!(
        "UPDATE notes
         SET title = $2, content = $3, updated_at = now()
         WHERE id = $1
         RETURNING {NOTE_COLUMNS}"
    ))
    .bind(id)
    .bind(title)
    .bind(content)
    .fetch_optional(conn)
    .await
}

/// `false` when no such note exists.
pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notes WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
