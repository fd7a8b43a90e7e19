//! Database error types
//!
//! Every store failure is classified once, when it crosses from SQLx into
//! this crate, into a closed set of variants. Constraint violations naming a
//! known schema constraint become [`DatabaseError::ConstraintViolation`] and
//! carry the [`Constraint`] as data.

use core_kernel::CoreError;
use thiserror::Error;

use crate::constraint::Constraint;

/// Errors that can occur during repository operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A named uniqueness or referential rule was violated
    #[error("Constraint violated: {0}")]
    ConstraintViolation(Constraint),

    /// Unique violation on a constraint this crate does not know
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key violation on a constraint this crate does not know
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Input rejected before or by the store at column level
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Failed to establish or keep a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Cursor misuse or a row that could not be decoded while streaming
    #[error("Iteration failed: {0}")]
    Iteration(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Criteria rejected by the kernel
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl DatabaseError {
    /// Creates a not found error for a specific entity kind and identifier
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("news", 42);
    /// assert!(error.to_string().contains("news"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DatabaseError::Validation(message.into())
    }

    pub fn iteration(message: impl Into<String>) -> Self {
        DatabaseError::Iteration(message.into())
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error is a constraint violation, named or not
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConstraintViolation(_)
                | DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }

    /// The violated named constraint, if any
    pub fn constraint(&self) -> Option<Constraint> {
        crate::constraint::error_constraint(self)
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// Named constraints win over SQLSTATE codes; otherwise the PostgreSQL error
/// code decides the variant.
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DatabaseError::ConnectionFailed(error.to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = Constraint::classify(error) {
                    return DatabaseError::ConstraintViolation(constraint);
                }

                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(message),
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23502") | Some("23514") => DatabaseError::Validation(message),
                    Some(code) if code.starts_with("22") => DatabaseError::Validation(message),
                    Some(code) if code.starts_with("08") => DatabaseError::ConnectionFailed(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct FakePgError {
        code: &'static str,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for FakePgError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake error {}", self.code)
        }
    }

    impl StdError for FakePgError {}

    impl sqlx::error::DatabaseError for FakePgError {
        fn message(&self) -> &str {
            "violates something"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.code {
                "23505" => sqlx::error::ErrorKind::UniqueViolation,
                "23503" => sqlx::error::ErrorKind::ForeignKeyViolation,
                _ => sqlx::error::ErrorKind::Other,
            }
        }
    }

    fn db_error(code: &'static str, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakePgError { code, constraint }))
    }

    #[test]
    fn test_named_unique_violation() {
        let err = DatabaseError::from(db_error("23505", Some("news_title_unique")));
        assert!(matches!(
            err,
            DatabaseError::ConstraintViolation(Constraint::NewsTitleUnique)
        ));
        assert!(err.is_constraint_violation());
        assert_eq!(err.constraint(), Some(Constraint::NewsTitleUnique));
    }

    #[test]
    fn test_named_foreign_key_violation() {
        let err = DatabaseError::from(db_error("23503", Some("category_parent_id_fkey")));
        assert_eq!(err.constraint(), Some(Constraint::CategoryParentIdFkey));
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_unknown_constraint_falls_back_to_code() {
        let err = DatabaseError::from(db_error("23505", Some("some_other_key")));
        assert!(matches!(err, DatabaseError::DuplicateEntry(_)));
        assert_eq!(err.constraint(), None);

        let err = DatabaseError::from(db_error("23503", None));
        assert!(matches!(err, DatabaseError::ForeignKeyViolation(_)));
    }

    #[test]
    fn test_column_level_errors_are_validation() {
        for code in ["23502", "23514", "22001", "22P02"] {
            let err = DatabaseError::from(db_error(code, None));
            assert!(
                matches!(err, DatabaseError::Validation(_)),
                "code {} mapped to {:?}",
                code,
                err
            );
        }
    }

    #[test]
    fn test_other_database_errors_are_query_failures() {
        let err = DatabaseError::from(db_error("42P01", None));
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }

    #[test]
    fn test_transport_errors_are_connection_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(DatabaseError::from(sqlx::Error::Io(io)).is_connection_error());
        assert!(DatabaseError::from(sqlx::Error::PoolClosed).is_connection_error());
        assert!(matches!(
            DatabaseError::from(sqlx::Error::PoolTimedOut),
            DatabaseError::PoolExhausted
        ));
    }

    #[test]
    fn test_row_not_found() {
        assert!(DatabaseError::from(sqlx::Error::RowNotFound).is_not_found());
    }

    #[test]
    fn test_core_error_is_wrapped() {
        let err: DatabaseError = CoreError::invalid_criteria("limit").into();
        assert!(matches!(err, DatabaseError::Core(CoreError::InvalidCriteria(_))));
    }
}
