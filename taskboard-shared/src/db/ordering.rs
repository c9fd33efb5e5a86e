/// Append-order assignment for lists, tasks and subtasks
///
/// Every ordered entity is appended after its last sibling. The read of the
/// current maximum and the insert that uses it must run inside one
/// transaction that first locks the parent row through [`super::locks`];
/// concurrent creators under the same parent then queue on that lock and
/// each sees the previous creator's row.
///
/// | Entity  | Parent  | First position |
/// |---------|---------|----------------|
/// | List    | Project | 0              |
/// | Task    | List    | 1              |
/// | Subtask | Task    | 1              |

use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

/// First position of a list within its project
pub const FIRST_LIST_POSITION: i32 = 0;

/// First position of a task within its list, or a subtask within its task
pub const FIRST_ITEM_POSITION: i32 = 1;

/// Returns the position following `max`, or `first` when there are no siblings
pub fn next_position(max: Option<i32>, first: i32) -> i32 {
    match max {
        Some(max) => max + 1,
        None => first,
    }
}

/// Next list position in a locked project
pub async fn next_list_position(conn: &mut PgConnection, project_id: Uuid) -> Result<i32, sqlx::Error> {
    let max: Option<i32> = sqlx::query_scalar("SELECT MAX(position) FROM lists WHERE project_id = $1")
        .bind(project_id)
        .fetch_one(conn)
        .await?;

    let position = next_position(max, FIRST_LIST_POSITION);
    debug!(%project_id, position, "Assigned list position");
    Ok(position)
}

/// Next task position in a locked list
pub async fn next_task_position(conn: &mut PgConnection, list_id: Uuid) -> Result<i32, sqlx::Error> {
    let max: Option<i32> = sqlx::query_scalar("SELECT MAX(position) FROM tasks WHERE list_id = $1")
        .bind(list_id)
        .fetch_one(conn)
        .await?;

    let position = next_position(max, FIRST_ITEM_POSITION);
    debug!(%list_id, position, "Assigned task position");
    Ok(position)
}

/// Next subtask position in a locked task
pub async fn next_subtask_position(conn: &mut PgConnection, task_id: Uuid) -> Result<i32, sqlx::Error> {
    let max: Option<i32> = sqlx::query_scalar("SELECT MAX(position) FROM subtasks WHERE task_id = $1")
        .bind(task_id)
        .fetch_one(conn)
        .await?;

    let position = next_position(max, FIRST_ITEM_POSITION);
    debug!(%task_id, position, "Assigned subtask position");
    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_list_is_zero() {
        assert_eq!(next_position(None, FIRST_LIST_POSITION), 0);
    }

    #[test]
    fn test_first_task_is_one() {
        assert_eq!(next_position(None, FIRST_ITEM_POSITION), 1);
        assert_eq!(next_position(Some(1), FIRST_ITEM_POSITION), 2);
    }

    #[test]
    fn test_appends_after_gap() {
        // positions 0 and 2 remain after deleting 1
        assert_eq!(next_position(Some(2), FIRST_LIST_POSITION), 3);
    }

    #[test]
    fn test_sequence_is_dense() {
        let mut max = None;
        let mut assigned = Vec::new();
        for _ in 0..5 {
            let position = next_position(max, FIRST_LIST_POSITION);
            assigned.push(position);
            max = Some(position);
        }
        assert_eq!(assigned, vec![0, 1, 2, 3, 4]);
    }
}
