//! Demo error handling

use infra_db::{Constraint, DatabaseError};
use thiserror::Error;

/// Why a demo run stopped
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("news with title '{0}' already exists")]
    DuplicateTitle(String),

    #[error("wrong number of {what}, expected {expected} but got {got}")]
    CountMismatch {
        what: &'static str,
        expected: i64,
        got: i64,
    },

    #[error("{constraint} was not enforced: the insert succeeded")]
    ConstraintNotEnforced { constraint: Constraint },

    #[error("constraint not caught properly, expected {expected} but got {got:?}")]
    UnexpectedConstraint {
        expected: Constraint,
        got: Option<Constraint>,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl DemoError {
    pub fn count_mismatch(what: &'static str, expected: usize, got: i64) -> Self {
        DemoError::CountMismatch {
            what,
            expected: expected as i64,
            got,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DemoError::count_mismatch("comments", 20, 19);
        assert_eq!(err.to_string(), "wrong number of comments, expected 20 but got 19");

        let err = DemoError::UnexpectedConstraint {
            expected: Constraint::CategoryParentIdFkey,
            got: None,
        };
        assert!(err.to_string().contains("category_parent_id_fkey"));
    }

    #[test]
    fn test_database_error_converts() {
        let err: DemoError = DatabaseError::PoolExhausted.into();
        assert!(matches!(err, DemoError::Database(DatabaseError::PoolExhausted)));
    }
}
