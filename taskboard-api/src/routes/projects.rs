/// Project endpoints
///
/// # Endpoints
///
/// - `GET    /api/project` - All projects with owner and counts
/// - `POST   /api/project` - Create a project with its default lists
/// - `GET    /api/project/:id` - Full board
/// - `PUT    /api/project/:id` - Rename or re-describe
/// - `DELETE /api/project/:id` - Delete with everything in it
/// - `GET    /api/project/:id/members` - Members with profiles
/// - `POST   /api/project/:id/members` - Add a member
/// - `PUT    /api/project/:id/members/:user_id` - Change a member's role
/// - `DELETE /api/project/:id/members/:user_id` - Remove a member
/// - `GET    /api/project/:id/activity` - Activity log, newest first

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
use serde::Deserialize;
use taskboard_shared::{
    auth::Actor,
    models::{
        activity_log::ActivityLog,
        member::{CreateMember, MemberWithUser, ProjectMember, ProjectRole},
        project::{CreateProject, CreatedProject, Project, ProjectBoard, ProjectOverview, UpdateProject},
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub description: Option<String>,

    /// Used only when the caller is anonymous
    pub owner_id: Option<Uuid>,
}

/// Update project request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// Add member request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Uuid,

    #[serde(default)]
    pub role: ProjectRole,
}

/// Change role request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    pub role: ProjectRole,
}

async fn ensure_project(state: &AppState, id: Uuid) -> ApiResult<()> {
    if Project::exists(&state.db, id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound("Project not found".to_string()))
    }
}

/// Lists all projects, newest first
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<ProjectOverview>>> {
    let projects = Project::list_overview(&state.db).await?;
    Ok(Json(projects))
}

/// Creates a project
///
/// The owner becomes an `ADMIN` member and the project starts with the lists
/// `Todo`, `In Progress` and `Done`.
///
/// # Errors
///
/// - `400 Bad Request`: Missing name, or no owner in body or token
/// - `404 Not Found`: Owner does not exist
pub async fn create_project(
    State(state): State<AppState>,
    actor: Option<Extension<Actor>>,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<CreatedProject>)> {
    let owner_id = acting_user(actor, req.owner_id)
        .ok_or_else(|| {
            ApiError::ValidationError(vec![ValidationErrorDetail {
                field: "ownerId".to_string(),
                message: "ownerId is required".to_string(),
            }])
        })?;

    let created = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            owner_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetches the board of a project
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectBoard>> {
    let board = Project::board(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(board))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let project = Project::update(
        &state.db,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Deletes a project and all of its lists, tasks, members and activity
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Project::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberWithUser>>> {
    ensure_project(&state, id).await?;

    let members = ProjectMember::list_by_project(&state.db, id).await?;
    Ok(Json(members))
}

/// Adds a user to a project
///
/// # Errors
///
/// - `404 Not Found`: Project or user does not exist
/// - `409 Conflict`: User is already a member
pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<ProjectMember>)> {
    ensure_project(&state, id).await?;

    if !User::exists(&state.db, req.user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let member = ProjectMember::create(
        &state.db,
        CreateMember {
            project_id: id,
            user_id: req.user_id,
            role: req.role,
        },
    )
    .await?;

    tracing::info!(project_id = %id, user_id = %member.user_id, role = member.role.as_str(), "Added project member");

    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<UpdateMemberRequest>,
) -> ApiResult<Json<ProjectMember>> {
    let member = ProjectMember::update_role(&state.db, id, user_id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    Ok(Json(member))
}

/// Removes a member; the owner stays
pub async fn remove_member(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if project.owner_id == user_id {
        return Err(ApiError::BadRequest(
            "The project owner cannot be removed".to_string(),
        ));
    }

    if !ProjectMember::delete(&state.db, id, user_id).await? {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ActivityLog>>> {
    ensure_project(&state, id).await?;

    let activity = ActivityLog::list_by_project(&state.db, id).await?;
    Ok(Json(activity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_project_validation() {
        let req: CreateProjectRequest = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert!(req.validate().is_err());

        let req: CreateProjectRequest =
            serde_json::from_str(r#"{"name":"Launch","description":"Q3"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.owner_id.is_none());
    }

    #[test]
    fn test_add_member_defaults_to_member_role() {
        let req: AddMemberRequest =
            serde_json::from_str(r#"{"userId":"00000000-0000-0000-0000-000000000001"}"#).unwrap();
        assert_eq!(req.role, ProjectRole::Member);

        let bad = serde_json::from_str::<AddMemberRequest>(
            r#"{"userId":"00000000-0000-0000-0000-000000000001","role":"OWNER"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_update_project_can_clear_description() {
        let req: UpdateProjectRequest = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(req.description, Some(None));
        assert!(req.name.is_none());
    }
}
