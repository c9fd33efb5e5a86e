/// Row locks taken by board writes
///
/// Every write that touches a project's lists, tasks or comments first takes
/// a lock on the project row, then locks lists or tasks. Project deletion
/// takes the project row exclusively, so it never waits on a transaction
/// that is itself waiting for the project.
///
/// | Function          | Row     | Mode                | Waits for                |
/// |-------------------|---------|---------------------|--------------------------|
/// | [`share_project`] | project | `FOR KEY SHARE`     | project delete           |
/// | [`lock_project`]  | project | `FOR NO KEY UPDATE` | list append, delete      |
/// | [`claim_project`] | project | `FOR UPDATE`        | all of the above         |
/// | [`lock_list`]     | list    | `FOR UPDATE`        | task append to the list  |
/// | [`lock_task`]     | task    | `FOR UPDATE`        | task and subtask writes  |
/// | [`share_task`]    | task    | `FOR KEY SHARE`     | task update or delete    |

use sqlx::PgConnection;
use uuid::Uuid;

/// Holds a project in place for the rest of the transaction
///
/// Returns `false` if the project does not exist.
pub async fn share_project(conn: &mut PgConnection, project_id: Uuid) -> Result<bool, sqlx::Error> {
    let locked: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR KEY SHARE")
            .bind(project_id)
            .fetch_optional(conn)
            .await?;

    Ok(locked.is_some())
}

/// Serializes list appends within a project
///
/// Compatible with [`share_project`], so task writes keep going while a list
/// is appended. Returns `false` if the project does not exist.
pub async fn lock_project(conn: &mut PgConnection, project_id: Uuid) -> Result<bool, sqlx::Error> {
    let locked: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR NO KEY UPDATE")
            .bind(project_id)
            .fetch_optional(conn)
            .await?;

    Ok(locked.is_some())
}

/// Takes a project exclusively ahead of deleting it
pub async fn claim_project(conn: &mut PgConnection, project_id: Uuid) -> Result<bool, sqlx::Error> {
    let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
        .bind(project_id)
        .fetch_optional(conn)
        .await?;

    Ok(locked.is_some())
}

/// Locks a list row and returns the project it belongs to
pub async fn lock_list(conn: &mut PgConnection, list_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT project_id FROM lists WHERE id = $1 FOR UPDATE")
        .bind(list_id)
        .fetch_optional(conn)
        .await
}

/// Locks a task row and returns the project it belongs to
pub async fn lock_task(conn: &mut PgConnection, task_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT project_id FROM tasks WHERE id = $1 FOR UPDATE")
        .bind(task_id)
        .fetch_optional(conn)
        .await
}

/// Keeps a task from being deleted while a child row is attached to it
pub async fn share_task(conn: &mut PgConnection, task_id: Uuid) -> Result<bool, sqlx::Error> {
    let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM tasks WHERE id = $1 FOR KEY SHARE")
        .bind(task_id)
        .fetch_optional(conn)
        .await?;

    Ok(locked.is_some())
}

/// Locks every task of a list and returns their ids
///
/// A task moved out of the list by a transaction that commits first is not
/// returned.
pub async fn lock_list_tasks(conn: &mut PgConnection, list_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM tasks WHERE list_id = $1 FOR UPDATE")
        .bind(list_id)
        .fetch_all(conn)
        .await
}

/// Locks every task of a project and returns their ids
pub async fn lock_project_tasks(
    conn: &mut PgConnection,
    project_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM tasks WHERE project_id = $1 FOR UPDATE")
        .bind(project_id)
        .fetch_all(conn)
        .await
}

/// Project of a task, read without locking
pub async fn task_project(conn: &mut PgConnection, task_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT project_id FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(conn)
        .await
}

/// Project of a list, read without locking
pub async fn list_project(conn: &mut PgConnection, list_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT project_id FROM lists WHERE id = $1")
        .bind(list_id)
        .fetch_optional(conn)
        .await
}
