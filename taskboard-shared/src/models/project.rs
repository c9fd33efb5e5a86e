/// Project model and database operations
///
/// A project is the root of a board: it owns lists, tasks, memberships and
/// the activity log. None of those are removed by the database when a
/// project goes away; [`Project::delete`] removes them child-first inside
/// one transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::project::{CreateProject, Project};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let created = Project::create(&pool, CreateProject {
///     name: "Launch".to_string(),
///     description: None,
///     owner_id,
/// }).await?;
///
/// // Todo, In Progress, Done
/// assert_eq!(created.lists.len(), 3);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::activity_log::{ActivityAction, ActivityLog, EntityType, NewActivity};
use super::list::{List, ListWithTasks};
use super::member::{CreateMember, MemberWithUser, ProjectMember, ProjectRole};
use super::task::{Task, TaskWithSubtasks};
use super::user::UserSummary;
use crate::db::locks;
use crate::db::ordering::FIRST_LIST_POSITION;
use crate::error::{BoardError, BoardResult};

/// Lists every new project starts with, in order
pub const DEFAULT_LISTS: [&str; 3] = ["Todo", "In Progress", "Done"];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A freshly created project with its owner membership and default lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedProject {
    #[serde(flatten)]
    pub project: Project,
    pub members: Vec<ProjectMember>,
    pub lists: Vec<List>,
}

/// A project as shown in the project index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    #[serde(flatten)]
    pub project: Project,
    pub owner: UserSummary,
    pub member_count: i64,
    pub task_count: i64,
}

#[derive(sqlx::FromRow)]
struct ProjectOverviewRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_name: Option<String>,
    owner_avatar_url: Option<String>,
    member_count: i64,
    task_count: i64,
}

impl From<ProjectOverviewRow> for ProjectOverview {
    fn from(row: ProjectOverviewRow) -> Self {
        Self {
            project: Project {
                id: row.id,
                name: row.name,
                description: row.description,
                owner_id: row.owner_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            owner: UserSummary {
                id: row.owner_id,
                name: row.owner_name,
                avatar_url: row.owner_avatar_url,
            },
            member_count: row.member_count,
            task_count: row.task_count,
        }
    }
}

/// The full board: people, lists, tasks and subtasks in display order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectBoard {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Option<UserSummary>,
    pub members: Vec<MemberWithUser>,
    pub lists: Vec<ListWithTasks>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

/// Input for updating a project; `description: Some(None)` clears it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl Project {
    /// Creates a project
    ///
    /// In one transaction: inserts the project, adds the owner as an `ADMIN`
    /// member, creates the [`DEFAULT_LISTS`] at positions 0, 1 and 2, and
    /// records `CREATE PROJECT` activity.
    ///
    /// # Errors
    ///
    /// `BoardError::NotFound` if the owner does not exist.
    pub async fn create(pool: &PgPool, data: CreateProject) -> BoardResult<CreatedProject> {
        let mut tx = pool.begin().await?;

        let owner_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(data.owner_id)
            .fetch_one(&mut *tx)
            .await?;

        if !owner_exists {
            return Err(BoardError::not_found("User", data.owner_id));
        }

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, owner_id, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        let owner = ProjectMember::create(
            &mut *tx,
            CreateMember {
                project_id: project.id,
                user_id: project.owner_id,
                role: ProjectRole::Admin,
            },
        )
        .await?;

        let mut lists = Vec::with_capacity(DEFAULT_LISTS.len());
        for (position, name) in (FIRST_LIST_POSITION..).zip(DEFAULT_LISTS) {
            let list = sqlx::query_as::<_, List>(
                r#"
                INSERT INTO lists (name, position, project_id)
                VALUES ($1, $2, $3)
                RETURNING id, name, position, project_id, created_at, updated_at
                "#,
            )
            .bind(name)
            .bind(position)
            .bind(project.id)
            .fetch_one(&mut *tx)
            .await?;
            lists.push(list);
        }

        ActivityLog::record(
            &mut *tx,
            NewActivity {
                action: ActivityAction::Create,
                entity_type: EntityType::Project,
                entity_id: project.id,
                project_id: project.id,
                user_id: project.owner_id,
                metadata: Some(json!({ "name": project.name })),
            },
        )
        .await?;

        tx.commit().await?;

        info!(project_id = %project.id, owner_id = %project.owner_id, "Created project");

        Ok(CreatedProject {
            project,
            members: vec![owner],
            lists,
        })
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, owner_id, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether a project exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// All projects, newest first, with owner and counts
    pub async fn list_overview(pool: &PgPool) -> Result<Vec<ProjectOverview>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProjectOverviewRow>(
            r#"
            SELECT p.id, p.name, p.description, p.owner_id, p.created_at, p.updated_at,
                   u.name AS owner_name, u.avatar_url AS owner_avatar_url,
                   (SELECT COUNT(*) FROM project_members m WHERE m.project_id = p.id) AS member_count,
                   (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id) AS task_count
            FROM projects p
            JOIN users u ON u.id = p.owner_id
            ORDER BY p.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(ProjectOverview::from).collect())
    }

    /// Projects owned by a user, newest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, owner_id, created_at, updated_at
            FROM projects
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    /// Loads the whole board of a project
    pub async fn board(pool: &PgPool, id: Uuid) -> Result<Option<ProjectBoard>, sqlx::Error> {
        let Some(project) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let owner = UserSummary::find_many(pool, &[project.owner_id])
            .await?
            .into_iter()
            .next();
        let members = ProjectMember::list_by_project(pool, id).await?;

        let tasks = Task::list_by_project(pool, id).await?;
        let mut by_list: HashMap<Uuid, Vec<TaskWithSubtasks>> = HashMap::new();
        for task in Task::attach_subtasks(pool, tasks).await? {
            by_list.entry(task.task.list_id).or_default().push(task);
        }

        let lists = List::list_by_project(pool, id)
            .await?
            .into_iter()
            .map(|list| {
                let tasks = by_list.remove(&list.id).unwrap_or_default();
                ListWithTasks { list, tasks }
            })
            .collect();

        Ok(Some(ProjectBoard {
            project,
            owner,
            members,
            lists,
        }))
    }

    /// Updates a project's name or description
    ///
    /// Returns `None` if the project does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let set_description = data.description.is_some();

        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(set_description)
        .bind(data.description.flatten())
        .fetch_optional(pool)
        .await
    }

    /// Deletes a project and everything that belongs to it
    ///
    /// Comments, subtasks, tasks, lists, memberships and activity entries
    /// are removed in that order, then the project, in one transaction.
    /// Returns `false` if the project did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !locks::claim_project(&mut *tx, id).await? {
            return Ok(false);
        }

        let task_ids = locks::lock_project_tasks(&mut *tx, id).await?;

        sqlx::query("DELETE FROM comments WHERE task_id = ANY($1)")
            .bind(&task_ids)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM subtasks WHERE task_id = ANY($1)")
            .bind(&task_ids)
            .execute(&mut *tx)
            .await?;

        let tasks = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let lists = sqlx::query("DELETE FROM lists WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM activity_logs WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(project_id = %id, lists, tasks, "Deleted project");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lists() {
        assert_eq!(DEFAULT_LISTS, ["Todo", "In Progress", "Done"]);
    }

    #[test]
    fn test_overview_serialization() {
        let owner = Uuid::new_v4();
        let overview = ProjectOverview::from(ProjectOverviewRow {
            id: Uuid::new_v4(),
            name: "Website".to_string(),
            description: None,
            owner_id: owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            owner_name: Some("Erin".to_string()),
            owner_avatar_url: None,
            member_count: 3,
            task_count: 12,
        });

        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["ownerId"], owner.to_string());
        assert_eq!(json["owner"]["name"], "Erin");
        assert_eq!(json["memberCount"], 3);
        assert_eq!(json["taskCount"], 12);
    }
}
