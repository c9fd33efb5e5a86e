/// Database models for the task board
///
/// Each module holds one table's row type, its input types and the queries
/// against it.
///
/// # Models
///
/// - `user`: accounts mirrored from the identity provider
/// - `project`: boards, their defaults and cascading deletion
/// - `member`: user-project memberships with roles
/// - `list`: ordered columns of a project
/// - `task`: versioned work items within a list
/// - `subtask`: ordered checklist items of a task
/// - `comment`: discussion on a task
/// - `notification`: per-user inbox, polled by clients
/// - `activity_log`: audit trail of a project
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::project::{CreateProject, Project};
/// use taskboard_shared::models::user::{CreateUser, User};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let owner = User::create(&pool, CreateUser {
///     id: Uuid::new_v4(),
///     email: "owner@example.com".to_string(),
///     name: Some("Owner".to_string()),
///     avatar_url: None,
///     is_super_user: false,
///     meta: None,
/// }).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     name: "Roadmap".to_string(),
///     description: None,
///     owner_id: owner.id,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod activity_log;
pub mod comment;
pub mod list;
pub mod member;
pub mod notification;
pub mod project;
pub mod subtask;
pub mod task;
pub mod user;
