/// Comment model
///
/// Comments belong to a task and are listed oldest first. Each new comment
/// is recorded in the project's activity log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::activity_log::{ActivityAction, ActivityLog, EntityType, NewActivity};
use super::user::UserSummary;
use crate::db::locks;
use crate::error::{BoardError, BoardResult};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: UserSummary,
}

#[derive(sqlx::FromRow)]
struct CommentWithAuthorRow {
    id: Uuid,
    content: String,
    task_id: Uuid,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_name: Option<String>,
    author_avatar_url: Option<String>,
}

impl From<CommentWithAuthorRow> for CommentWithAuthor {
    fn from(row: CommentWithAuthorRow) -> Self {
        Self {
            comment: Comment {
                id: row.id,
                content: row.content,
                task_id: row.task_id,
                author_id: row.author_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author: UserSummary {
                id: row.author_id,
                name: row.author_name,
                avatar_url: row.author_avatar_url,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
}

impl Comment {
    /// Adds a comment to a task and records `CREATE COMMENT` activity
    ///
    /// # Errors
    ///
    /// `BoardError::NotFound` if the task does not exist.
    pub async fn create(pool: &PgPool, data: CreateComment) -> BoardResult<Self> {
        let mut tx = pool.begin().await?;

        let project_id = locks::task_project(&mut *tx, data.task_id)
            .await?
            .ok_or_else(|| BoardError::not_found("Task", data.task_id))?;

        if !locks::share_project(&mut *tx, project_id).await?
            || !locks::share_task(&mut *tx, data.task_id).await?
        {
            return Err(BoardError::not_found("Task", data.task_id));
        }

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (content, task_id, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, task_id, author_id, created_at, updated_at
            "#,
        )
        .bind(data.content)
        .bind(data.task_id)
        .bind(data.author_id)
        .fetch_one(&mut *tx)
        .await?;

        ActivityLog::record(
            &mut *tx,
            NewActivity {
                action: ActivityAction::Create,
                entity_type: EntityType::Comment,
                entity_id: comment.id,
                project_id,
                user_id: comment.author_id,
                metadata: Some(json!({ "taskId": comment.task_id })),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(comment)
    }

    /// Comments of a task with their authors, oldest first
    pub async fn list_by_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CommentWithAuthorRow>(
            r#"
            SELECT c.id, c.content, c.task_id, c.author_id, c.created_at, c.updated_at,
                   u.name AS author_name, u.avatar_url AS author_avatar_url
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.task_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(CommentWithAuthor::from).collect())
    }

    /// Deletes a comment of the given task
    pub async fn delete(pool: &PgPool, task_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND task_id = $2")
            .bind(id)
            .bind(task_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
