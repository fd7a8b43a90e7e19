//! Criteria compilation
//!
//! Turns an entity's [`Criteria`] into parameterized SQL. Column names only
//! ever come from the entity's constants; every caller-provided value is a
//! bind parameter.
//!
//! - Filters: one conjunct per present predicate, joined with `AND`.
//! - Sort: resolved against `Entity::COLUMNS`; unknown columns are dropped and
//!   the identity column closes the key list (see [`core_kernel::Sort`]).
//! - Pagination: `LIMIT`/`OFFSET` after `ORDER BY`.

use sqlx::postgres::PgHasArrayType;
use sqlx::{Encode, Postgres, QueryBuilder, Type};
use tracing::debug;

use core_kernel::{Predicate, TextPredicate};

use crate::entity::{Criteria, Entity};
use crate::error::DatabaseError;

/// Suffix of the server-side cursor behind a result iterator
///
/// Each table gets its own cursor name so the `FETCH` text, and any
/// statement metadata cached for it, is never shared across entity kinds.
pub const CURSOR_SUFFIX: &str = "_iter_cursor";

/// Accumulates the `WHERE` clause of a query
pub struct Filter<'qb, 'args> {
    builder: &'qb mut QueryBuilder<'args, Postgres>,
    conditions: usize,
}

impl<'qb, 'args> Filter<'qb, 'args> {
    pub fn new(builder: &'qb mut QueryBuilder<'args, Postgres>) -> Self {
        Self {
            builder,
            conditions: 0,
        }
    }

    /// Adds `predicate` on `column` when present; `None` adds nothing
    pub fn push<P>(&mut self, column: &'static str, predicate: Option<&P>) -> &mut Self
    where
        P: FilterPredicate + ?Sized,
    {
        if let Some(predicate) = predicate {
            let keyword = if self.conditions == 0 { " WHERE " } else { " AND " };
            self.builder.push(keyword);
            predicate.push_condition(column, self.builder);
            self.conditions += 1;
        }
        self
    }

    /// Number of conditions pushed so far
    pub fn len(&self) -> usize {
        self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions == 0
    }
}

/// A predicate that can render itself as one SQL condition on a column
pub trait FilterPredicate {
    fn push_condition<'args>(&self, column: &'static str, builder: &mut QueryBuilder<'args, Postgres>);
}

impl<T> FilterPredicate for Predicate<T>
where
    T: for<'q> Encode<'q, Postgres> + Type<Postgres> + PgHasArrayType + Clone + Send + 'static,
    Vec<T>: for<'q> Encode<'q, Postgres> + Type<Postgres>,
{
    fn push_condition<'args>(&self, column: &'static str, builder: &mut QueryBuilder<'args, Postgres>) {
        match self {
            Predicate::Equal(v) => compare(builder, column, "=", v.clone()),
            Predicate::NotEqual(v) => compare(builder, column, "<>", v.clone()),
            Predicate::GreaterThan(v) => compare(builder, column, ">", v.clone()),
            Predicate::GreaterThanOrEqual(v) => compare(builder, column, ">=", v.clone()),
            Predicate::LessThan(v) => compare(builder, column, "<", v.clone()),
            Predicate::LessThanOrEqual(v) => compare(builder, column, "<=", v.clone()),
            Predicate::Between(lo, hi) => {
                builder
                    .push(column)
                    .push(" BETWEEN ")
                    .push_bind(lo.clone())
                    .push(" AND ")
                    .push_bind(hi.clone());
            }
            Predicate::In(values) if values.is_empty() => {
                builder.push("FALSE");
            }
            Predicate::In(values) => {
                builder
                    .push(column)
                    .push(" = ANY(")
                    .push_bind(values.clone())
                    .push(")");
            }
            Predicate::IsNull => {
                builder.push(column).push(" IS NULL");
            }
            Predicate::IsNotNull => {
                builder.push(column).push(" IS NOT NULL");
            }
        }
    }
}

impl FilterPredicate for TextPredicate {
    fn push_condition<'args>(&self, column: &'static str, builder: &mut QueryBuilder<'args, Postgres>) {
        if let TextPredicate::Is(predicate) = self {
            predicate.push_condition(column, builder);
        } else if let Some(pattern) = self.like_pattern() {
            compare(builder, column, "LIKE", pattern);
        }
    }
}

fn compare<'args, T>(builder: &mut QueryBuilder<'args, Postgres>, column: &str, op: &str, value: T)
where
    T: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + 'static,
{
    builder
        .push(column)
        .push(" ")
        .push(op)
        .push(" ")
        .push_bind(value);
}

/// `SELECT <columns> FROM <table>`, optionally behind a statement prefix
/// such as a cursor declaration, plus filters, order and window
pub fn select<E: Entity>(
    prefix: &str,
    criteria: &E::Criteria,
) -> Result<QueryBuilder<'static, Postgres>, DatabaseError> {
    let pagination = criteria.pagination();
    pagination.validate()?;

    let mut builder = QueryBuilder::new(prefix);
    builder
        .push("SELECT ")
        .push(E::COLUMNS.join(", "))
        .push(" FROM ")
        .push(E::TABLE);

    criteria.push_filters(&mut Filter::new(&mut builder));

    let resolved = criteria.sort().resolve(E::COLUMNS, E::IDENTITY);
    if !resolved.discarded.is_empty() {
        debug!(
            table = E::TABLE,
            discarded = ?resolved.discarded,
            "ignoring sort on unknown columns"
        );
    }
    builder.push(" ORDER BY ");
    for (i, (column, direction)) in resolved.keys.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(*column).push(" ").push(direction.as_sql());
    }

    if !pagination.is_unbounded() {
        if let Some(limit) = pagination.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = pagination.offset {
            builder.push(" OFFSET ").push_bind(offset);
        }
    }

    Ok(builder)
}

/// `SELECT COUNT(*)` over the filtered rows; sort and window do not apply
pub fn count<E: Entity>(criteria: &E::Criteria) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM ");
    builder.push(E::TABLE);
    criteria.push_filters(&mut Filter::new(&mut builder));
    builder
}

/// `INSERT ... RETURNING <columns>` for a new entity
pub fn insert<E: Entity>(entity: &E) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("INSERT INTO ");
    builder
        .push(E::TABLE)
        .push(" (")
        .push(E::INSERT_COLUMNS.join(", "))
        .push(") VALUES (");
    {
        let mut values = builder.separated(", ");
        entity.bind_insert(&mut values);
    }
    builder.push(") RETURNING ").push(E::COLUMNS.join(", "));
    builder
}

/// Single-row lookup by identity
pub fn find_by_id<E: Entity>(id: E::Id) -> QueryBuilder<'static, Postgres> {
    let id: i64 = id.into();
    let mut builder = QueryBuilder::new("SELECT ");
    builder
        .push(E::COLUMNS.join(", "))
        .push(" FROM ")
        .push(E::TABLE)
        .push(" WHERE ")
        .push(E::IDENTITY)
        .push(" = ")
        .push_bind(id);
    builder
}

pub fn delete_by_id<E: Entity>(id: E::Id) -> QueryBuilder<'static, Postgres> {
    let id: i64 = id.into();
    let mut builder = QueryBuilder::new("DELETE FROM ");
    builder
        .push(E::TABLE)
        .push(" WHERE ")
        .push(E::IDENTITY)
        .push(" = ")
        .push_bind(id);
    builder
}

/// Cursor name used when iterating `E`'s table
pub fn cursor_name<E: Entity>() -> String {
    format!("{}{}", E::TABLE, CURSOR_SUFFIX)
}

/// Statement prefix that turns a select into a cursor declaration
pub fn declare_cursor_prefix(cursor: &str) -> String {
    format!("DECLARE {} NO SCROLL CURSOR FOR ", cursor)
}

/// Reads the next batch from `cursor`
pub fn fetch_cursor(cursor: &str, batch: u32) -> String {
    format!("FETCH FORWARD {} FROM {}", batch, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_kernel::{CategoryId, NewsId, Pagination, Sort};

    use crate::repositories::{
        Category, CategoryCriteria, Comment, CommentCriteria, News, NewsCriteria,
    };

    #[test]
    fn test_empty_criteria_selects_everything_in_identity_order() {
        let builder = select::<News>("", &NewsCriteria::default()).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT id, title, lead, content, score, created_at, updated_at FROM news ORDER BY id ASC"
        );
    }

    #[test]
    fn test_filters_are_conjunctive_and_bound() {
        let criteria = CommentCriteria {
            news_id: Some(Predicate::Equal(NewsId::new(7))),
            content: Some(TextPredicate::Contains("rust".into())),
            is_visible: Some(Predicate::Equal(true)),
            ..Default::default()
        };
        let builder = select::<Comment>("", &criteria).unwrap();
        let sql = builder.sql();

        assert!(sql.contains(" WHERE news_id = $1 AND content LIKE $2 AND is_visible = $3 "));
        assert!(!sql.contains("rust"));
        assert!(sql.ends_with("ORDER BY id ASC"));
    }

    #[test]
    fn test_unknown_sort_column_is_dropped() {
        let criteria = CommentCriteria {
            news_id: Some(Predicate::Equal(NewsId::new(1))),
            sort: Sort::new().asc("id").desc("non_existing_column"),
            ..Default::default()
        };
        let builder = select::<Comment>("", &criteria).unwrap();

        assert!(builder.sql().ends_with(" ORDER BY id ASC"));
        assert!(!builder.sql().contains("non_existing_column"));
    }

    #[test]
    fn test_identity_closes_composite_sort() {
        let criteria = NewsCriteria {
            sort: Sort::new().desc("score").asc("created_at"),
            ..Default::default()
        };
        let builder = select::<News>("", &criteria).unwrap();
        assert!(builder
            .sql()
            .ends_with(" ORDER BY score DESC, created_at ASC, id ASC"));
    }

    #[test]
    fn test_range_and_null_predicates() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let criteria = CategoryCriteria {
            parent_id: Some(Predicate::IsNull),
            created_at: Some(Predicate::Between(start, end)),
            ..Default::default()
        };
        let builder = select::<Category>("", &criteria).unwrap();

        assert!(builder
            .sql()
            .contains(" WHERE parent_id IS NULL AND created_at BETWEEN $1 AND $2 "));
    }

    #[test]
    fn test_in_predicate() {
        let criteria = CategoryCriteria {
            parent_id: Some(Predicate::any_of([CategoryId::new(1), CategoryId::new(2)])),
            ..Default::default()
        };
        let builder = select::<Category>("", &criteria).unwrap();
        assert!(builder.sql().contains(" WHERE parent_id = ANY($1) "));

        let criteria = CategoryCriteria {
            id: Some(Predicate::In(vec![])),
            ..Default::default()
        };
        let builder = select::<Category>("", &criteria).unwrap();
        assert!(builder.sql().contains(" WHERE FALSE "));
    }

    #[test]
    fn test_pagination_binds_after_order() {
        let criteria = NewsCriteria {
            title: Some(TextPredicate::StartsWith("Lorem".into())),
            pagination: Pagination::new(Some(20), Some(10)),
            ..Default::default()
        };
        let builder = select::<News>("", &criteria).unwrap();
        assert!(builder
            .sql()
            .ends_with(" ORDER BY id ASC LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn test_unbounded_pagination_adds_no_window() {
        let builder = select::<News>("", &NewsCriteria::default()).unwrap();
        assert!(!builder.sql().contains("LIMIT"));
        assert!(!builder.sql().contains("OFFSET"));

        let criteria = NewsCriteria {
            pagination: Pagination::new(Some(3), None),
            ..Default::default()
        };
        let builder = select::<News>("", &criteria).unwrap();
        assert!(builder.sql().ends_with(" ORDER BY id ASC OFFSET $1"));
    }

    #[test]
    fn test_negative_limit_is_rejected() {
        let criteria = NewsCriteria {
            pagination: Pagination::first(-1),
            ..Default::default()
        };
        let err = select::<News>("", &criteria)
            .err()
            .expect("negative limit should be rejected");
        assert!(matches!(err, DatabaseError::Core(_)));
    }

    #[test]
    fn test_count_ignores_sort_and_window() {
        let criteria = CategoryCriteria {
            parent_id: Some(Predicate::Equal(CategoryId::new(3))),
            sort: Sort::new().desc("name"),
            pagination: Pagination::first(1),
            ..Default::default()
        };
        let builder = count::<Category>(&criteria);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM category WHERE parent_id = $1"
        );
    }

    #[test]
    fn test_insert_binds_every_insert_column() {
        let news = News::new("Lorem Ipsum", "Lorem ipsum dolor sit amet");
        let builder = insert(&news);
        let sql = builder.sql();

        assert!(sql.starts_with("INSERT INTO news (title, lead, content, score) VALUES ($1, $2, $3, $4)"));
        assert!(sql.ends_with("RETURNING id, title, lead, content, score, created_at, updated_at"));
        assert_eq!(sql.matches('$').count(), News::INSERT_COLUMNS.len());
    }

    #[test]
    fn test_cursor_declaration_wraps_select() {
        let cursor = cursor_name::<News>();
        let builder = select::<News>(&declare_cursor_prefix(&cursor), &NewsCriteria::default()).unwrap();
        assert!(builder
            .sql()
            .starts_with("DECLARE news_iter_cursor NO SCROLL CURSOR FOR SELECT id,"));
        assert_eq!(fetch_cursor(&cursor, 50), "FETCH FORWARD 50 FROM news_iter_cursor");
    }

    #[test]
    fn test_cursor_names_differ_per_table() {
        let news = cursor_name::<News>();
        let comment = cursor_name::<Comment>();
        let category = cursor_name::<Category>();

        assert_eq!(comment, "comment_iter_cursor");
        assert_ne!(news, comment);
        assert_ne!(comment, category);
        assert_ne!(fetch_cursor(&news, 5), fetch_cursor(&comment, 5));
    }

    #[test]
    fn test_lookup_and_delete_by_id() {
        assert_eq!(
            find_by_id::<Comment>(core_kernel::CommentId::new(5)).sql(),
            "SELECT id, news_id, news_title, content, is_visible, created_at, updated_at FROM comment WHERE id = $1"
        );
        assert_eq!(
            delete_by_id::<News>(NewsId::new(5)).sql(),
            "DELETE FROM news WHERE id = $1"
        );
    }
}
