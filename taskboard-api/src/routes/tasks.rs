/// Task endpoints, including a task's subtasks and comments
///
/// # Endpoints
///
/// - `POST   /api/task` - Create a task at the end of its list
/// - `GET    /api/task/:id` - Task detail
/// - `PUT    /api/task/:id` - Update, optionally guarded by `version`
/// - `DELETE /api/task/:id` - Delete with subtasks and comments
/// - `POST   /api/task/:id/subtasks` - Append a subtask
/// - `PUT    /api/task/:id/subtasks/:subtask_id` - Update a subtask
/// - `DELETE /api/task/:id/subtasks/:subtask_id` - Delete a subtask
/// - `GET    /api/task/:id/comments` - Comments with authors, oldest first
/// - `POST   /api/task/:id/comments` - Add a comment
/// - `DELETE /api/task/:id/comments/:comment_id` - Delete a comment
///
/// Writes are attributed to the identified caller when the request carries
/// a token, otherwise to the user id given in the body.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{acting_user, double_option, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskboard_shared::{
    auth::Actor,
    models::{
        comment::{Comment, CommentWithAuthor, CreateComment},
        subtask::{CreateSubtask, Subtask, UpdateSubtask},
        task::{CreateTask, Task, TaskDetail, TaskPriority, TaskStatus, UpdateTask},
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub list_id: Uuid,
    pub project_id: Uuid,

    /// Used only when the caller is anonymous
    pub created_by_id: Option<Uuid>,

    pub assigned_to_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub list_id: Option<Uuid>,

    #[validate(range(min = 1, message = "Order must be at least 1"))]
    pub order: Option<i32>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to_id: Option<Option<Uuid>>,

    /// Version the client last read; a mismatch is rejected with 409
    pub version: Option<i32>,

    /// Acting user when the request carries no token
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubtaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,

    pub assignee_id: Option<Uuid>,

    /// The identified caller wins; only read with an assignee
    pub assigner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubtaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: Option<String>,

    pub is_done: Option<bool>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    pub assigner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 10000, message = "Content must be 1-10000 characters"))]
    pub content: String,

    /// Used only when the caller is anonymous
    pub author_id: Option<Uuid>,
}

fn required(field: &str) -> ApiError {
    ApiError::ValidationError(vec![ValidationErrorDetail {
        field: field.to_string(),
        message: format!("{} is required", field),
    }])
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Creates a task at the end of its list
///
/// # Errors
///
/// - `400 Bad Request`: Invalid body, no creator, or the list belongs to
///   another project
/// - `404 Not Found`: List does not exist
pub async fn create_task(
    State(state): State<AppState>,
    actor: Option<Extension<Actor>>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let created_by_id = acting_user(actor, req.created_by_id)
        .ok_or_else(|| required("createdById"))?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            list_id: req.list_id,
            project_id: req.project_id,
            created_by_id,
            assigned_to_id: req.assigned_to_id,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDetail>> {
    let detail = Task::find_detail(&state.db, id)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(detail))
}

/// Updates a task
///
/// Every successful update bumps `version`. With `version` in the body the
/// write only happens if it still matches.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid body or a destination list of another project
/// - `404 Not Found`: Task or destination list does not exist
/// - `409 Conflict`: `version` is stale
pub async fn update_task(
    State(state): State<AppState>,
    actor: Option<Extension<Actor>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let acting = acting_user(actor, req.user_id);

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            list_id: req.list_id,
            position: req.order,
            assigned_to_id: req.assigned_to_id,
            version: req.version,
        },
        acting,
    )
    .await?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    actor: Option<Extension<Actor>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    Task::delete(&state.db, id, acting_user(actor, None))
        .await?
        .ok_or_else(task_not_found)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Appends a subtask to a task
pub async fn create_subtask(
    State(state): State<AppState>,
    actor: Option<Extension<Actor>>,
    Path(task_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateSubtaskRequest>,
) -> ApiResult<(StatusCode, Json<Subtask>)> {
    let assigner_id = match req.assignee_id {
        Some(_) => acting_user(actor, req.assigner_id),
        None => None,
    };

    let subtask = Subtask::create(
        &state.db,
        CreateSubtask {
            task_id,
            title: req.title,
            assignee_id: req.assignee_id,
            assigner_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(subtask)))
}

pub async fn update_subtask(
    State(state): State<AppState>,
    actor: Option<Extension<Actor>>,
    Path((task_id, subtask_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<UpdateSubtaskRequest>,
) -> ApiResult<Json<Subtask>> {
    let assigner_id = match req.assignee_id {
        Some(Some(_)) => acting_user(actor, req.assigner_id),
        _ => None,
    };

    let subtask = Subtask::update(
        &state.db,
        task_id,
        subtask_id,
        UpdateSubtask {
            title: req.title,
            is_done: req.is_done,
            assignee_id: req.assignee_id,
            assigner_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Subtask not found".to_string()))?;

    Ok(Json(subtask))
}

pub async fn delete_subtask(
    State(state): State<AppState>,
    Path((task_id, subtask_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    if !Subtask::delete(&state.db, task_id, subtask_id).await? {
        return Err(ApiError::NotFound("Subtask not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentWithAuthor>>> {
    if Task::find_by_id(&state.db, task_id).await?.is_none() {
        return Err(task_not_found());
    }

    let comments = Comment::list_by_task(&state.db, task_id).await?;
    Ok(Json(comments))
}

/// Adds a comment and records it in the project's activity
pub async fn create_comment(
    State(state): State<AppState>,
    actor: Option<Extension<Actor>>,
    Path(task_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let author_id = acting_user(actor, req.author_id)
        .ok_or_else(|| required("authorId"))?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id,
            author_id,
            content: req.content,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    if !Comment::delete(&state.db, task_id, comment_id).await? {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "00000000-0000-0000-0000-0000000000a1";
    const PROJECT: &str = "00000000-0000-0000-0000-0000000000b1";

    #[test]
    fn test_create_task_parses_status_labels() {
        let body = format!(
            r#"{{"title":"Ship","listId":"{LIST}","projectId":"{PROJECT}","status":"In Progress","priority":"HIGH"}}"#
        );
        let req: CreateTaskRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.status, Some(TaskStatus::InProgress));
        assert_eq!(req.priority, Some(TaskPriority::High));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_task_rejects_unknown_status() {
        let body = format!(
            r#"{{"title":"Ship","listId":"{LIST}","projectId":"{PROJECT}","status":"Blocked"}}"#
        );
        assert!(serde_json::from_str::<CreateTaskRequest>(&body).is_err());
    }

    #[test]
    fn test_create_task_rejects_empty_title() {
        let body = format!(r#"{{"title":"","listId":"{LIST}","projectId":"{PROJECT}"}}"#);
        let req: CreateTaskRequest = serde_json::from_str(&body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_task_distinguishes_unassign_from_absent() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"version":3}"#).unwrap();
        assert_eq!(req.assigned_to_id, None);
        assert_eq!(req.version, Some(3));

        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"assignedToId":null,"dueDate":null}"#).unwrap();
        assert_eq!(req.assigned_to_id, Some(None));
        assert_eq!(req.due_date, Some(None));
    }

    #[test]
    fn test_update_task_order_must_be_positive() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"order":0}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_comment_content_required() {
        let req: CreateCommentRequest = serde_json::from_str(r#"{"content":""}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
