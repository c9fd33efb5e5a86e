/// Project membership model
///
/// A membership pairs a user with a project and a role. The project owner is
/// added as an `ADMIN` member when the project is created.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('ADMIN', 'MEMBER');
///
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role project_role NOT NULL DEFAULT 'MEMBER',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::user::UserSummary;

/// Role of a user within a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectRole {
    /// Manages the project and its members
    Admin,

    /// Works on tasks
    #[default]
    Member,
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Admin => "ADMIN",
            ProjectRole::Member => "MEMBER",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
}

/// Membership together with the member's public profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithUser {
    #[serde(flatten)]
    pub member: ProjectMember,
    pub user: UserSummary,
}

#[derive(sqlx::FromRow)]
struct MemberWithUserRow {
    id: Uuid,
    project_id: Uuid,
    user_id: Uuid,
    role: ProjectRole,
    joined_at: DateTime<Utc>,
    user_name: Option<String>,
    user_avatar_url: Option<String>,
}

impl From<MemberWithUserRow> for MemberWithUser {
    fn from(row: MemberWithUserRow) -> Self {
        Self {
            member: ProjectMember {
                id: row.id,
                project_id: row.project_id,
                user_id: row.user_id,
                role: row.role,
                joined_at: row.joined_at,
            },
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                avatar_url: row.user_avatar_url,
            },
        }
    }
}

/// Input for adding a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMember {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
}

impl ProjectMember {
    /// Adds a user to a project
    ///
    /// Accepts a pool or an open transaction. Fails with a unique violation
    /// on `project_members_project_user_key` if the user is already a member.
    pub async fn create<'e, E>(executor: E, data: CreateMember) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, user_id, role, joined_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    /// Lists members of a project with their profiles, oldest first
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MemberWithUserRow>(
            r#"
            SELECT m.id, m.project_id, m.user_id, m.role, m.joined_at,
                   u.name AS user_name, u.avatar_url AS user_avatar_url
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(MemberWithUser::from).collect())
    }

    /// Lists every membership held by a user
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, joined_at
            FROM project_members
            WHERE user_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Changes a member's role
    pub async fn update_role(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            UPDATE project_members
            SET role = $3
            WHERE project_id = $1 AND user_id = $2
            RETURNING id, project_id, user_id, role, joined_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(pool)
        .await
    }

    /// Removes a user from a project
    pub async fn delete(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&ProjectRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::from_str::<ProjectRole>("\"MEMBER\"").unwrap(),
            ProjectRole::Member
        );
        assert!(serde_json::from_str::<ProjectRole>("\"admin\"").is_err());
        assert!(serde_json::from_str::<ProjectRole>("\"OWNER\"").is_err());
    }

    #[test]
    fn test_default_role() {
        assert_eq!(ProjectRole::default(), ProjectRole::Member);
        assert_eq!(ProjectRole::default().as_str(), "MEMBER");
    }

    #[test]
    fn test_member_with_user_flattens() {
        let user_id = Uuid::new_v4();
        let member = MemberWithUser {
            member: ProjectMember {
                id: Uuid::new_v4(),
                project_id: Uuid::new_v4(),
                user_id,
                role: ProjectRole::Admin,
                joined_at: Utc::now(),
            },
            user: UserSummary {
                id: user_id,
                name: Some("Alice".to_string()),
                avatar_url: None,
            },
        };

        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["role"], "ADMIN");
        assert_eq!(json["userId"], user_id.to_string());
        assert_eq!(json["user"]["name"], "Alice");
    }
}
