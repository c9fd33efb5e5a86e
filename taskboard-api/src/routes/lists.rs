/// List endpoints
///
/// New lists are appended after the last list of their project. Deleting a
/// list deletes its tasks with their subtasks and comments.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{acting_user, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::Actor,
    models::{
        list::{CreateList, List, ListWithTasks, UpdateList},
        project::Project,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateListRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub project_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 0, message = "Order must not be negative"))]
    pub order: Option<i32>,
}

/// Body returned after a list is deleted
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteListResponse {
    pub message: String,
}

/// Creates a list at the end of its project
///
/// # Errors
///
/// - `400 Bad Request`: Empty name
/// - `404 Not Found`: Project does not exist
pub async fn create_list(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateListRequest>,
) -> ApiResult<(StatusCode, Json<List>)> {
    let list = List::create(
        &state.db,
        CreateList {
            name: req.name,
            project_id: req.project_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn list_project_lists(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<List>>> {
    if !Project::exists(&state.db, project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    let lists = List::list_by_project(&state.db, project_id).await?;
    Ok(Json(lists))
}

/// Fetches a list with its tasks and their subtasks
pub async fn get_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ListWithTasks>> {
    let list = List::find_with_tasks(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("List not found".to_string()))?;

    Ok(Json(list))
}

pub async fn update_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateListRequest>,
) -> ApiResult<Json<List>> {
    let list = List::update(
        &state.db,
        id,
        UpdateList {
            name: req.name,
            position: req.order,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("List not found".to_string()))?;

    Ok(Json(list))
}

/// Deletes a list and everything on it
///
/// The remaining lists keep their order values.
pub async fn delete_list(
    State(state): State<AppState>,
    actor: Option<Extension<Actor>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteListResponse>> {
    let deleted = List::delete(&state.db, id, acting_user(actor, None))
        .await?
        .ok_or_else(|| ApiError::NotFound("List not found".to_string()))?;

    Ok(Json(DeleteListResponse {
        message: format!("List '{}' and its tasks deleted successfully", deleted.name),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_list_requires_project() {
        let missing = serde_json::from_str::<CreateListRequest>(r#"{"name":"Review"}"#);
        assert!(missing.is_err());

        let req: CreateListRequest = serde_json::from_str(
            r#"{"name":"Review","projectId":"00000000-0000-0000-0000-000000000001"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_list_rejects_negative_order() {
        let req: UpdateListRequest = serde_json::from_str(r#"{"order":-1}"#).unwrap();
        assert!(req.validate().is_err());

        let req: UpdateListRequest = serde_json::from_str(r#"{"order":4}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.order, Some(4));
    }
}
