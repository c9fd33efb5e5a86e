/// Notification model
///
/// Notifications are stored per recipient and read by polling; nothing is
/// pushed to clients.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     type VARCHAR(64) NOT NULL,
///     metadata JSONB NOT NULL DEFAULT '{}',
///     is_read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Sent to a user who was assigned a task by someone else
pub const TASK_ASSIGNED: &str = "TASK_ASSIGNED";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,

    /// Recipient
    pub user_id: Uuid,

    /// Type tag, e.g. `TASK_ASSIGNED`
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,

    pub metadata: JsonValue,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub kind: String,
    pub metadata: JsonValue,
}

impl CreateNotification {
    /// Notification for a task assignment
    pub fn task_assigned(
        assignee_id: Uuid,
        task_id: Uuid,
        project_id: Uuid,
        title: &str,
        assigned_by: Uuid,
    ) -> Self {
        Self {
            user_id: assignee_id,
            kind: TASK_ASSIGNED.to_string(),
            metadata: json!({
                "taskId": task_id,
                "projectId": project_id,
                "title": title,
                "assignedBy": assigned_by,
            }),
        }
    }
}

impl Notification {
    pub async fn create<'e, E>(executor: E, data: CreateNotification) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, type, metadata)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, type, metadata, is_read, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.kind)
        .bind(data.metadata)
        .fetch_one(executor)
        .await
    }

    /// Notifications of a user, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, type, metadata, is_read, created_at
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(pool)
        .await
    }

    /// Marks one notification read; `None` if it does not belong to the user
    pub async fn mark_read(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, type, metadata, is_read, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Marks all unread notifications of a user read, returning how many changed
    pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_assigned_payload() {
        let assignee = Uuid::new_v4();
        let task = Uuid::new_v4();
        let project = Uuid::new_v4();
        let by = Uuid::new_v4();

        let n = CreateNotification::task_assigned(assignee, task, project, "Ship it", by);
        assert_eq!(n.user_id, assignee);
        assert_eq!(n.kind, TASK_ASSIGNED);
        assert_eq!(n.metadata["taskId"], task.to_string());
        assert_eq!(n.metadata["title"], "Ship it");
        assert_eq!(n.metadata["assignedBy"], by.to_string());
    }

    #[test]
    fn test_notification_type_field_name() {
        let n = Notification {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            kind: TASK_ASSIGNED.to_string(),
            metadata: json!({}),
            is_read: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], TASK_ASSIGNED);
        assert_eq!(json["isRead"], false);
        assert!(json.get("kind").is_none());
    }
}
