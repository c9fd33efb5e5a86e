/// Notification endpoints, nested under the recipient user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::models::{notification::Notification, user::User};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    /// Only unread notifications when true
    pub unread: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

async fn ensure_user(state: &AppState, id: Uuid) -> ApiResult<()> {
    if User::exists(&state.db, id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound("User not found".to_string()))
    }
}

/// Notifications of a user, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    ensure_user(&state, user_id).await?;

    let notifications =
        Notification::list_by_user(&state.db, user_id, query.unread.unwrap_or(false)).await?;

    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path((user_id, notification_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Notification>> {
    let notification = Notification::mark_read(&state.db, user_id, notification_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}

/// Marks every unread notification of a user read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<MarkAllReadResponse>> {
    ensure_user(&state, user_id).await?;

    let updated = Notification::mark_all_read(&state.db, user_id).await?;
    tracing::debug!(user_id = %user_id, updated, "Marked notifications read");

    Ok(Json(MarkAllReadResponse { updated }))
}
