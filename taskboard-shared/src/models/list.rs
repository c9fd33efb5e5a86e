/// List model and database operations
///
/// A list is an ordered column of tasks within a project ("Todo", "Done",
/// ...). Positions are assigned on creation by [`crate::db::ordering`] and
/// are not renumbered when a list is deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lists (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     position INTEGER NOT NULL,
///     project_id UUID NOT NULL REFERENCES projects(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::list::{CreateList, List};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let list = List::create(&pool, CreateList {
///     name: "Review".to_string(),
///     project_id,
/// }).await?;
/// println!("appended at position {}", list.position);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::activity_log::{ActivityAction, ActivityLog, EntityType, NewActivity};
use super::task::{Task, TaskWithSubtasks};
use crate::db::{locks, ordering};
use crate::error::{BoardError, BoardResult};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: Uuid,
    pub name: String,

    /// Position within the project, starting at 0
    #[serde(rename = "order")]
    pub position: i32,

    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A list with its tasks (and their subtasks) in display order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListWithTasks {
    #[serde(flatten)]
    pub list: List,
    pub tasks: Vec<TaskWithSubtasks>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateList {
    pub name: String,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateList {
    pub name: Option<String>,
    pub position: Option<i32>,
}

impl List {
    /// Appends a new list to a project
    ///
    /// # Errors
    ///
    /// `BoardError::NotFound` if the project does not exist.
    pub async fn create(pool: &PgPool, data: CreateList) -> BoardResult<Self> {
        let mut tx = pool.begin().await?;

        if !locks::lock_project(&mut *tx, data.project_id).await? {
            return Err(BoardError::not_found("Project", data.project_id));
        }

        let position = ordering::next_list_position(&mut *tx, data.project_id).await?;

        let list = sqlx::query_as::<_, List>(
            r#"
            INSERT INTO lists (name, position, project_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, position, project_id, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(position)
        .bind(data.project_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(list)
    }

    /// Finds a list by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(
            r#"
            SELECT id, name, position, project_id, created_at, updated_at
            FROM lists
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a list together with its tasks and their subtasks
    pub async fn find_with_tasks(pool: &PgPool, id: Uuid) -> Result<Option<ListWithTasks>, sqlx::Error> {
        let Some(list) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let tasks = Task::list_by_list(pool, id).await?;
        let tasks = Task::attach_subtasks(pool, tasks).await?;

        Ok(Some(ListWithTasks { list, tasks }))
    }

    /// Lists of a project in position order
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(
            r#"
            SELECT id, name, position, project_id, created_at, updated_at
            FROM lists
            WHERE project_id = $1
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Renames or repositions a list
    ///
    /// Returns `None` if the list does not exist.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateList) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(
            r#"
            UPDATE lists
            SET name = COALESCE($2, name),
                position = COALESCE($3, position),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, position, project_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.position)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a list and everything in it
    ///
    /// Comments, subtasks and tasks of the list are removed before the list
    /// itself, all in one transaction, and a `DELETE LIST` activity entry is
    /// recorded. The entry is attributed to `actor`, or to the project owner
    /// when no actor is known.
    ///
    /// Returns the deleted list, or `None` if it did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid, actor: Option<Uuid>) -> BoardResult<Option<Self>> {
        let mut tx = pool.begin().await?;

        let Some(project_id) = locks::list_project(&mut *tx, id).await? else {
            return Ok(None);
        };

        if !locks::share_project(&mut *tx, project_id).await? {
            return Ok(None);
        }

        let list = sqlx::query_as::<_, List>(
            r#"
            SELECT id, name, position, project_id, created_at, updated_at
            FROM lists
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(list) = list else {
            return Ok(None);
        };

        let task_ids = locks::lock_list_tasks(&mut *tx, id).await?;

        sqlx::query("DELETE FROM comments WHERE task_id = ANY($1)")
            .bind(&task_ids)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM subtasks WHERE task_id = ANY($1)")
            .bind(&task_ids)
            .execute(&mut *tx)
            .await?;

        let tasks_deleted = sqlx::query("DELETE FROM tasks WHERE id = ANY($1)")
            .bind(&task_ids)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM lists WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let user_id = match actor {
            Some(user_id) => user_id,
            None => {
                sqlx::query_scalar("SELECT owner_id FROM projects WHERE id = $1")
                    .bind(list.project_id)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        ActivityLog::record(
            &mut *tx,
            NewActivity {
                action: ActivityAction::Delete,
                entity_type: EntityType::List,
                entity_id: list.id,
                project_id: list.project_id,
                user_id,
                metadata: Some(json!({ "name": list.name, "tasksDeleted": tasks_deleted })),
            },
        )
        .await?;

        tx.commit().await?;

        info!(list_id = %id, tasks_deleted, "Deleted list");
        Ok(Some(list))
    }
}
