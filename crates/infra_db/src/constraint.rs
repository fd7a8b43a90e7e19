//! Named schema constraints
//!
//! PostgreSQL reports which constraint a failing statement violated by name.
//! Those names are fixed by the schema and are part of this crate's public
//! contract: callers match on [`Constraint`] rather than on message text, which
//! varies across server versions and locales.
//!
//! ```rust,ignore
//! match repos.news.insert(&news).await {
//!     Err(e) if error_constraint(&e) == Some(Constraint::NewsTitleUnique) => {
//!         // title taken, pick another one
//!     }
//!     other => other?,
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DatabaseError;

/// What kind of rule a constraint enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
}

/// Every named constraint in the newsroom schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    NewsPkey,
    NewsTitleUnique,
    CommentPkey,
    CommentNewsIdFkey,
    CategoryPkey,
    CategoryParentIdFkey,
}

impl Constraint {
    pub const ALL: [Constraint; 6] = [
        Constraint::NewsPkey,
        Constraint::NewsTitleUnique,
        Constraint::CommentPkey,
        Constraint::CommentNewsIdFkey,
        Constraint::CategoryPkey,
        Constraint::CategoryParentIdFkey,
    ];

    /// The constraint's name in the schema
    pub const fn as_str(self) -> &'static str {
        match self {
            Constraint::NewsPkey => "news_pkey",
            Constraint::NewsTitleUnique => "news_title_unique",
            Constraint::CommentPkey => "comment_pkey",
            Constraint::CommentNewsIdFkey => "comment_news_id_fkey",
            Constraint::CategoryPkey => "category_pkey",
            Constraint::CategoryParentIdFkey => "category_parent_id_fkey",
        }
    }

    /// The table the constraint is declared on
    pub const fn table(self) -> &'static str {
        match self {
            Constraint::NewsPkey | Constraint::NewsTitleUnique => "news",
            Constraint::CommentPkey | Constraint::CommentNewsIdFkey => "comment",
            Constraint::CategoryPkey | Constraint::CategoryParentIdFkey => "category",
        }
    }

    pub const fn kind(self) -> ConstraintKind {
        match self {
            Constraint::NewsPkey | Constraint::CommentPkey | Constraint::CategoryPkey => {
                ConstraintKind::PrimaryKey
            }
            Constraint::NewsTitleUnique => ConstraintKind::Unique,
            Constraint::CommentNewsIdFkey | Constraint::CategoryParentIdFkey => {
                ConstraintKind::ForeignKey
            }
        }
    }

    /// Looks a constraint up by the name the store reported
    ///
    /// A schema-qualified name (`public.news_title_unique`) is accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        let bare = name.rsplit('.').next().unwrap_or(name);
        Self::ALL.into_iter().find(|c| c.as_str() == bare)
    }

    /// Classifies a raw driver error
    ///
    /// Returns `None` unless the error is a database error naming one of the
    /// schema's constraints.
    pub fn classify(error: &sqlx::Error) -> Option<Self> {
        match error {
            sqlx::Error::Database(db_err) => db_err.constraint().and_then(Self::from_name),
            _ => None,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Constraint {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| DatabaseError::validation(format!("unknown constraint '{}'", s)))
    }
}

/// Returns the violated constraint, or `None` for any other error
pub fn error_constraint(error: &DatabaseError) -> Option<Constraint> {
    match error {
        DatabaseError::ConstraintViolation(constraint) => Some(*constraint),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for constraint in Constraint::ALL {
            assert_eq!(Constraint::from_name(constraint.as_str()), Some(constraint));
        }
    }

    #[test]
    fn test_schema_qualified_name() {
        assert_eq!(
            Constraint::from_name("public.category_parent_id_fkey"),
            Some(Constraint::CategoryParentIdFkey)
        );
    }

    #[test]
    fn test_unknown_name_is_no_match() {
        assert_eq!(Constraint::from_name("news_title_key"), None);
        assert_eq!(Constraint::from_name(""), None);
        assert!("bogus".parse::<Constraint>().is_err());
    }

    #[test]
    fn test_kind_and_table() {
        assert_eq!(Constraint::NewsTitleUnique.kind(), ConstraintKind::Unique);
        assert_eq!(Constraint::CategoryParentIdFkey.kind(), ConstraintKind::ForeignKey);
        assert_eq!(Constraint::CommentNewsIdFkey.table(), "comment");
    }

    #[test]
    fn test_classify_ignores_non_database_errors() {
        assert_eq!(Constraint::classify(&sqlx::Error::RowNotFound), None);
        assert_eq!(Constraint::classify(&sqlx::Error::PoolTimedOut), None);
    }

    #[test]
    fn test_error_constraint() {
        let err = DatabaseError::ConstraintViolation(Constraint::NewsTitleUnique);
        assert_eq!(error_constraint(&err), Some(Constraint::NewsTitleUnique));
        assert_eq!(error_constraint(&DatabaseError::PoolExhausted), None);
        assert_eq!(
            error_constraint(&DatabaseError::DuplicateEntry("x".into())),
            None
        );
    }
}
