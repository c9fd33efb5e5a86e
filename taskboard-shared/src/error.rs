/// Domain errors raised by model operations
///
/// Plain lookups return `Result<_, sqlx::Error>` and signal absence with
/// `Ok(None)`. Operations that check references, versions or parent rows
/// inside a transaction return [`BoardResult`] so callers can tell a missing
/// parent from a stale write from a storage failure.

use uuid::Uuid;

/// Result alias for model operations that can fail for domain reasons
pub type BoardResult<T> = Result<T, BoardError>;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// A referenced row does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// The client's task version is behind the stored one
    #[error("Task version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: i32, actual: i32 },

    /// References that exist but do not fit together
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Storage failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl BoardError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        BoardError::NotFound { entity, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let id = Uuid::nil();
        let err = BoardError::not_found("List", id);
        assert_eq!(
            err.to_string(),
            "List 00000000-0000-0000-0000-000000000000 not found"
        );
    }

    #[test]
    fn test_version_conflict_message() {
        let err = BoardError::VersionConflict {
            expected: 3,
            actual: 5,
        };
        assert_eq!(
            err.to_string(),
            "Task version conflict: expected 3, found 5"
        );
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: BoardError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, BoardError::Database(sqlx::Error::RowNotFound)));
    }
}
