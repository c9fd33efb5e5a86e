/// User endpoints
///
/// Users are mirrored from the identity provider, so the client supplies
/// the id on creation. Emails are stored lowercased and must be unique.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{double_option, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use taskboard_shared::models::{
    member::ProjectMember,
    project::Project,
    user::{CreateUser, UpdateUser, User},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub id: Uuid,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    #[validate(url(message = "Invalid avatar URL"))]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub is_super_user: bool,

    pub meta: Option<JsonValue>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,

    pub is_super_user: Option<bool>,

    #[serde(default, deserialize_with = "double_option")]
    pub meta: Option<Option<JsonValue>>,

    pub last_seen: Option<DateTime<Utc>>,
}

/// A user with the projects they belong to and the ones they own
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub memberships: Vec<ProjectMember>,
    pub projects: Vec<Project>,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users))
}

/// Creates a user
///
/// # Errors
///
/// - `400 Bad Request`: Missing id or invalid email
/// - `409 Conflict`: Email or id already taken
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    // A concurrent create still hits users_email_key and maps to 409
    let user = User::create(
        &state.db,
        CreateUser {
            id: req.id,
            email: req.email,
            name: req.name,
            avatar_url: req.avatar_url,
            is_super_user: req.is_super_user,
            meta: req.meta,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Created user");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserProfile>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(user_not_found)?;

    let memberships = ProjectMember::list_by_user(&state.db, id).await?;
    let projects = Project::list_by_owner(&state.db, id).await?;

    Ok(Json(UserProfile {
        user,
        memberships,
        projects,
    }))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let update = UpdateUser {
        email: req.email,
        name: req.name,
        avatar_url: req.avatar_url,
        is_super_user: req.is_super_user,
        meta: req.meta,
        last_seen: req.last_seen,
    };

    let user = if update.is_empty() {
        User::find_by_id(&state.db, id).await?
    } else {
        User::update(&state.db, id, update).await?
    }
    .ok_or_else(user_not_found)?;

    Ok(Json(user))
}

/// Deletes a user
///
/// # Errors
///
/// - `404 Not Found`: No such user
/// - `409 Conflict`: The user still owns projects or created tasks
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !User::delete(&state.db, id).await? {
        return Err(user_not_found());
    }

    tracing::info!(user_id = %id, "Deleted user");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_requires_valid_email() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"id":"00000000-0000-0000-0000-000000000001","email":"not-an-email"}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());

        let req: CreateUserRequest = serde_json::from_str(
            r#"{"id":"00000000-0000-0000-0000-000000000001","email":"Ada@Example.com"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(!req.is_super_user);
    }

    #[test]
    fn test_create_user_requires_id() {
        let missing = serde_json::from_str::<CreateUserRequest>(r#"{"email":"ada@example.com"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_update_user_clears_name() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"name":null}"#).unwrap();
        assert_eq!(req.name, Some(None));
        assert!(req.email.is_none());
    }
}
