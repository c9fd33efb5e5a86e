/// Subtask model
///
/// Subtasks are checklist items under a task, appended in order like tasks
/// within a list. All lookups that take an id are scoped by the parent task
/// so a subtask can only be reached through the task it belongs to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{locks, ordering};
use crate::error::{BoardError, BoardResult};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: Uuid,
    pub title: String,
    pub is_done: bool,

    /// Position within the task, starting at 1
    #[serde(rename = "order")]
    pub position: i32,

    pub task_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub assigner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubtask {
    pub task_id: Uuid,
    pub title: String,
    pub assignee_id: Option<Uuid>,
    pub assigner_id: Option<Uuid>,
}

/// Input for updating a subtask
///
/// `assigner_id` is only written together with `assignee_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSubtask {
    pub title: Option<String>,
    pub is_done: Option<bool>,
    pub assignee_id: Option<Option<Uuid>>,
    pub assigner_id: Option<Uuid>,
}

impl Subtask {
    /// Appends a subtask to a task
    ///
    /// # Errors
    ///
    /// `BoardError::NotFound` if the task does not exist.
    pub async fn create(pool: &PgPool, data: CreateSubtask) -> BoardResult<Self> {
        let mut tx = pool.begin().await?;

        if locks::lock_task(&mut *tx, data.task_id).await?.is_none() {
            return Err(BoardError::not_found("Task", data.task_id));
        }

        let position = ordering::next_subtask_position(&mut *tx, data.task_id).await?;

        let subtask = sqlx::query_as::<_, Subtask>(
            r#"
            INSERT INTO subtasks (title, position, task_id, assignee_id, assigner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, is_done, position, task_id, assignee_id, assigner_id,
                      created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(position)
        .bind(data.task_id)
        .bind(data.assignee_id)
        .bind(data.assigner_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(subtask)
    }

    /// Subtasks of a task in position order
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(
            r#"
            SELECT id, title, is_done, position, task_id, assignee_id, assigner_id,
                   created_at, updated_at
            FROM subtasks
            WHERE task_id = $1
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Subtasks of several tasks, grouped by task and in position order
    pub async fn list_by_tasks(pool: &PgPool, task_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(
            r#"
            SELECT id, title, is_done, position, task_id, assignee_id, assigner_id,
                   created_at, updated_at
            FROM subtasks
            WHERE task_id = ANY($1)
            ORDER BY task_id, position ASC, created_at ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await
    }

    /// Updates a subtask of the given task
    ///
    /// Returns `None` if no such subtask exists under the task.
    pub async fn update(
        pool: &PgPool,
        task_id: Uuid,
        id: Uuid,
        data: UpdateSubtask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let set_assignee = data.assignee_id.is_some();

        sqlx::query_as::<_, Subtask>(
            r#"
            UPDATE subtasks
            SET title = COALESCE($3, title),
                is_done = COALESCE($4, is_done),
                assignee_id = CASE WHEN $5 THEN $6 ELSE assignee_id END,
                assigner_id = CASE WHEN $5 THEN $7 ELSE assigner_id END,
                updated_at = NOW()
            WHERE id = $1 AND task_id = $2
            RETURNING id, title, is_done, position, task_id, assignee_id, assigner_id,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(task_id)
        .bind(data.title)
        .bind(data.is_done)
        .bind(set_assignee)
        .bind(data.assignee_id.flatten())
        .bind(data.assigner_id)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a subtask of the given task
    pub async fn delete(pool: &PgPool, task_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subtasks WHERE id = $1 AND task_id = $2")
            .bind(id)
            .bind(task_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtask_serialization() {
        let subtask = Subtask {
            id: Uuid::nil(),
            title: "Draft".to_string(),
            is_done: true,
            position: 2,
            task_id: Uuid::nil(),
            assignee_id: None,
            assigner_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&subtask).unwrap();
        assert_eq!(json["isDone"], true);
        assert_eq!(json["order"], 2);
        assert!(json["assigneeId"].is_null());
    }
}
