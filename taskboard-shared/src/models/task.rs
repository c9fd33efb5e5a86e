/// Task model and database operations
///
/// Tasks live in a list and carry a `version` counter that is bumped on every
/// update. Callers that pass the version they last read get a
/// compare-and-swap: a stale version is rejected with
/// [`BoardError::VersionConflict`] and nothing is written.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('Backlog', 'Todo', 'In Progress', 'Done');
/// CREATE TYPE task_priority AS ENUM ('LOW', 'MEDIUM', 'HIGH');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(500) NOT NULL,
///     description TEXT,
///     position INTEGER NOT NULL,
///     status task_status NOT NULL DEFAULT 'Todo',
///     priority task_priority NOT NULL DEFAULT 'MEDIUM',
///     due_date TIMESTAMPTZ,
///     version INTEGER NOT NULL DEFAULT 1,
///     list_id UUID NOT NULL REFERENCES lists(id),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     created_by_id UUID NOT NULL REFERENCES users(id),
///     assigned_to_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{CreateTask, Task, UpdateTask, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, list_id: Uuid, project_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let task = Task::create(&pool, CreateTask {
///     title: "Write release notes".to_string(),
///     description: None,
///     list_id,
///     project_id,
///     created_by_id: user_id,
///     assigned_to_id: None,
///     status: None,
///     priority: None,
///     due_date: None,
/// }).await?;
///
/// let moved = Task::update(&pool, task.id, UpdateTask {
///     status: Some(TaskStatus::InProgress),
///     version: Some(task.version),
///     ..Default::default()
/// }, Some(user_id)).await?;
/// assert_eq!(moved.version, task.version + 1);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::activity_log::{ActivityAction, ActivityLog, EntityType, NewActivity};
use super::comment::{Comment, CommentWithAuthor};
use super::list::List;
use super::notification::{CreateNotification, Notification};
use super::subtask::Subtask;
use super::user::UserSummary;
use crate::db::{locks, ordering};
use crate::error::{BoardError, BoardResult};

const TASK_COLUMNS: &str = "id, title, description, position, status, priority, due_date, version, \
     list_id, project_id, created_by_id, assigned_to_id, created_at, updated_at";

/// Workflow state of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    Backlog,
    #[default]
    Todo,
    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,

    /// Position within the list, starting at 1
    #[serde(rename = "order")]
    pub position: i32,

    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,

    /// Starts at 1, incremented by every update
    pub version: i32,

    pub list_id: Uuid,
    pub project_id: Uuid,
    pub created_by_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task with its subtasks in order, as shown on a board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskWithSubtasks {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Subtask>,
}

/// Everything the task detail view shows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub created_by: Option<UserSummary>,
    pub assigned_to: Option<UserSummary>,
    pub list: List,
    pub subtasks: Vec<Subtask>,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub list_id: Uuid,
    pub project_id: Uuid,
    pub created_by_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for updating a task
///
/// Only `Some` fields are written; nullable columns take `Some(None)` to
/// clear. `version` is not written, it is the version the caller expects to
/// find.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub list_id: Option<Uuid>,
    pub position: Option<i32>,
    pub assigned_to_id: Option<Option<Uuid>>,
    pub version: Option<i32>,
}

impl UpdateTask {
    /// Names of the fields this update writes, as clients spell them
    pub fn updated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.priority.is_some() {
            fields.push("priority");
        }
        if self.due_date.is_some() {
            fields.push("dueDate");
        }
        if self.list_id.is_some() {
            fields.push("listId");
        }
        if self.position.is_some() {
            fields.push("order");
        }
        if self.assigned_to_id.is_some() {
            fields.push("assignedToId");
        }
        fields
    }
}

impl Task {
    /// Appends a new task to a list
    ///
    /// Records a `CREATE TASK` activity entry and, when the task is assigned
    /// to someone other than its creator, a `TASK_ASSIGNED` notification.
    ///
    /// # Errors
    ///
    /// - `BoardError::NotFound` if the project or list does not exist
    /// - `BoardError::InvalidReference` if the list belongs to another project
    pub async fn create(pool: &PgPool, data: CreateTask) -> BoardResult<Self> {
        let mut tx = pool.begin().await?;

        if !locks::share_project(&mut *tx, data.project_id).await? {
            return Err(BoardError::not_found("Project", data.project_id));
        }

        let list_project = locks::lock_list(&mut *tx, data.list_id)
            .await?
            .ok_or_else(|| BoardError::not_found("List", data.list_id))?;

        if list_project != data.project_id {
            return Err(BoardError::InvalidReference(format!(
                "List {} does not belong to project {}",
                data.list_id, data.project_id
            )));
        }

        let position = ordering::next_task_position(&mut *tx, data.list_id).await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, position, status, priority, due_date,
                               list_id, project_id, created_by_id, assigned_to_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(&data.title)
        .bind(data.description)
        .bind(position)
        .bind(data.status.unwrap_or_default())
        .bind(data.priority.unwrap_or_default())
        .bind(data.due_date)
        .bind(data.list_id)
        .bind(data.project_id)
        .bind(data.created_by_id)
        .bind(data.assigned_to_id)
        .fetch_one(&mut *tx)
        .await?;

        ActivityLog::record(
            &mut *tx,
            NewActivity {
                action: ActivityAction::Create,
                entity_type: EntityType::Task,
                entity_id: task.id,
                project_id: task.project_id,
                user_id: task.created_by_id,
                metadata: Some(json!({ "title": task.title })),
            },
        )
        .await?;

        if let Some(assignee) = task.assigned_to_id {
            if assignee != task.created_by_id {
                Notification::create(
                    &mut *tx,
                    CreateNotification::task_assigned(
                        assignee,
                        task.id,
                        task.project_id,
                        &task.title,
                        task.created_by_id,
                    ),
                )
                .await?;
            }
        }

        tx.commit().await?;

        info!(task_id = %task.id, list_id = %task.list_id, position = task.position, "Created task");
        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads a task with its people, list, subtasks and comments
    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<TaskDetail>, sqlx::Error> {
        let Some(task) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let list = List::find_by_id(pool, task.list_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let mut people = vec![task.created_by_id];
        people.extend(task.assigned_to_id);
        let summaries = UserSummary::find_many(pool, &people).await?;
        let summary_of = |user_id: Uuid| summaries.iter().find(|u| u.id == user_id).cloned();

        let created_by = summary_of(task.created_by_id);
        let assigned_to = task.assigned_to_id.and_then(summary_of);

        let subtasks = Subtask::list_by_task(pool, id).await?;
        let comments = Comment::list_by_task(pool, id).await?;

        Ok(Some(TaskDetail {
            task,
            created_by,
            assigned_to,
            list,
            subtasks,
            comments,
        }))
    }

    /// Tasks of a list in position order
    pub async fn list_by_list(pool: &PgPool, list_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE list_id = $1 ORDER BY position ASC, created_at ASC"
        ))
        .bind(list_id)
        .fetch_all(pool)
        .await
    }

    /// Tasks of a project, grouped by list and in position order within each
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 \
             ORDER BY list_id, position ASC, created_at ASC"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Pairs each task with its subtasks, keeping the order of `tasks`
    pub async fn attach_subtasks(
        pool: &PgPool,
        tasks: Vec<Task>,
    ) -> Result<Vec<TaskWithSubtasks>, sqlx::Error> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        let mut by_task: HashMap<Uuid, Vec<Subtask>> = HashMap::new();
        for subtask in Subtask::list_by_tasks(pool, &ids).await? {
            by_task.entry(subtask.task_id).or_default().push(subtask);
        }

        Ok(tasks
            .into_iter()
            .map(|task| {
                let subtasks = by_task.remove(&task.id).unwrap_or_default();
                TaskWithSubtasks { task, subtasks }
            })
            .collect())
    }

    /// Updates a task
    ///
    /// The project is held and the task row locked for the duration. The
    /// version is incremented even if `data` is empty. Moving to another list without an explicit
    /// position appends the task to the destination list. An `UPDATE TASK`
    /// activity entry lists the written fields and is attributed to `actor`,
    /// or to the task's creator when no actor is known. Assigning the task to
    /// someone new notifies them unless they assigned it to themselves.
    ///
    /// # Errors
    ///
    /// - `BoardError::NotFound` if the task or destination list does not exist
    /// - `BoardError::VersionConflict` if `data.version` is stale
    /// - `BoardError::InvalidReference` if the destination list belongs to
    ///   another project
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
        actor: Option<Uuid>,
    ) -> BoardResult<Self> {
        let mut tx = pool.begin().await?;

        let project_id = locks::task_project(&mut *tx, id)
            .await?
            .ok_or_else(|| BoardError::not_found("Task", id))?;

        if !locks::share_project(&mut *tx, project_id).await? {
            return Err(BoardError::not_found("Task", id));
        }

        let current = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| BoardError::not_found("Task", id))?;

        if let Some(expected) = data.version {
            if expected != current.version {
                warn!(
                    task_id = %id,
                    expected,
                    actual = current.version,
                    "Rejected stale task update"
                );
                return Err(BoardError::VersionConflict {
                    expected,
                    actual: current.version,
                });
            }
        }

        let mut position = data.position;
        if let Some(list_id) = data.list_id.filter(|l| *l != current.list_id) {
            let list_project = locks::lock_list(&mut *tx, list_id)
                .await?
                .ok_or_else(|| BoardError::not_found("List", list_id))?;

            if list_project != current.project_id {
                return Err(BoardError::InvalidReference(format!(
                    "List {} does not belong to project {}",
                    list_id, current.project_id
                )));
            }

            if position.is_none() {
                position = Some(ordering::next_task_position(&mut *tx, list_id).await?);
            }
        }

        let updated_fields = data.updated_fields();

        let mut query = String::from("UPDATE tasks SET version = version + 1, updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.list_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", list_id = ${}", bind_count));
        }
        if position.is_some() {
            bind_count += 1;
            query.push_str(&format!(", position = ${}", bind_count));
        }
        if data.assigned_to_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to_id = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(list_id) = data.list_id {
            q = q.bind(list_id);
        }
        if let Some(position) = position {
            q = q.bind(position);
        }
        if let Some(assigned_to_id) = data.assigned_to_id {
            q = q.bind(assigned_to_id);
        }

        let task = q.fetch_one(&mut *tx).await?;

        let user_id = actor.unwrap_or(task.created_by_id);

        ActivityLog::record(
            &mut *tx,
            NewActivity {
                action: ActivityAction::Update,
                entity_type: EntityType::Task,
                entity_id: task.id,
                project_id: task.project_id,
                user_id,
                metadata: Some(json!({ "updatedFields": updated_fields })),
            },
        )
        .await?;

        if let Some(assignee) = task.assigned_to_id {
            if current.assigned_to_id != Some(assignee) && assignee != user_id {
                Notification::create(
                    &mut *tx,
                    CreateNotification::task_assigned(
                        assignee,
                        task.id,
                        task.project_id,
                        &task.title,
                        user_id,
                    ),
                )
                .await?;
            }
        }

        tx.commit().await?;

        Ok(task)
    }

    /// Deletes a task with its comments and subtasks
    ///
    /// Records a `DELETE TASK` activity entry in the same transaction,
    /// attributed to `actor` or to the task's creator.
    ///
    /// Returns the deleted task, or `None` if it did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid, actor: Option<Uuid>) -> BoardResult<Option<Self>> {
        let mut tx = pool.begin().await?;

        let Some(project_id) = locks::task_project(&mut *tx, id).await? else {
            return Ok(None);
        };

        if !locks::share_project(&mut *tx, project_id).await? {
            return Ok(None);
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(task) = task else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM comments WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM subtasks WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityLog::record(
            &mut *tx,
            NewActivity {
                action: ActivityAction::Delete,
                entity_type: EntityType::Task,
                entity_id: task.id,
                project_id: task.project_id,
                user_id: actor.unwrap_or(task.created_by_id),
                metadata: Some(json!({ "title": task.title })),
            },
        )
        .await?;

        tx.commit().await?;

        info!(task_id = %id, "Deleted task");
        Ok(Some(task))
    }
}
