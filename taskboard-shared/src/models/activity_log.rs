/// Activity log model
///
/// An append-only audit trail of create/update/delete actions within a
/// project. Entries are written in the same transaction as the change they
/// describe and removed only when their project is deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE activity_action AS ENUM ('CREATE', 'UPDATE', 'DELETE');
/// CREATE TYPE activity_entity AS ENUM ('PROJECT', 'LIST', 'TASK', 'SUBTASK', 'COMMENT');
///
/// CREATE TABLE activity_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     action activity_action NOT NULL,
///     entity_type activity_entity NOT NULL,
///     entity_id UUID NOT NULL,
///     project_id UUID NOT NULL REFERENCES projects(id),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     metadata JSONB,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_action", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_entity", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Project,
    List,
    Task,
    Subtask,
    Comment,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Uuid,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub project_id: Uuid,

    /// User the action is attributed to
    pub user_id: Uuid,

    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording an activity entry
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub metadata: Option<JsonValue>,
}

impl ActivityLog {
    /// Records an entry, usually inside the transaction that made the change
    pub async fn record<'e, E>(executor: E, entry: NewActivity) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (action, entity_type, entity_id, project_id, user_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, action, entity_type, entity_id, project_id, user_id, metadata, created_at
            "#,
        )
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.project_id)
        .bind(entry.user_id)
        .bind(entry.metadata)
        .fetch_one(executor)
        .await
    }

    /// Activity of a project, newest first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, action, entity_type, entity_id, project_id, user_id, metadata, created_at
            FROM activity_logs
            WHERE project_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Entries about one entity, oldest first
    pub async fn list_by_entity(pool: &PgPool, entity_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, action, entity_type, entity_id, project_id, user_id, metadata, created_at
            FROM activity_logs
            WHERE entity_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(entity_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_and_entity_serialization() {
        assert_eq!(serde_json::to_string(&ActivityAction::Create).unwrap(), "\"CREATE\"");
        assert_eq!(serde_json::to_string(&ActivityAction::Delete).unwrap(), "\"DELETE\"");
        assert_eq!(serde_json::to_string(&EntityType::Subtask).unwrap(), "\"SUBTASK\"");
        assert_eq!(
            serde_json::from_str::<EntityType>("\"TASK\"").unwrap(),
            EntityType::Task
        );
    }
}
