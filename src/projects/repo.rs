use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Board {
    pub id: Uuid,
    pub title: String,
    pub created_by: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A column on a board (table `lists`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BoardList {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: Uuid,
    pub board_id: Uuid,
    pub list_id: Uuid,
    pub created_by: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
    pub checklist: Option<Vec<serde_json::Value>>,
    pub due_date: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub async fn boards_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Board>> {
    let rows = sqlx::query_as::<_, Board>(
        r#"
        SELECT id, title, created_by, created_at, updated_at
        FROM boards
        WHERE created_by = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn lists_for_board(db: &PgPool, board_id: Uuid) -> anyhow::Result<Vec<BoardList>> {
    let rows = sqlx::query_as::<_, BoardList>(
        r#"
        SELECT id, board_id, title, created_at, updated_at
        FROM lists
        WHERE board_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(board_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn cards_for_list(db: &PgPool, list_id: Uuid) -> anyhow::Result<Vec<Card>> {
    let rows = sqlx::query_as::<_, Card>(
        r#"
        SELECT id, board_id, list_id, created_by, title, description, labels,
               checklist, due_date, created_at, updated_at
        FROM cards
        WHERE list_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(list_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
