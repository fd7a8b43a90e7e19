//! Entity and criteria traits
//!
//! An [`Entity`] is one decoded row of a table together with the fixed facts
//! the engine needs about that table. Implementations live in
//! [`crate::repositories`].

use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};
use std::fmt;
use validator::Validate;

use core_kernel::{Pagination, Sort};

use crate::query::Filter;

/// A table row kind the generic repository can serve
pub trait Entity:
    for<'r> FromRow<'r, PgRow> + Validate + Clone + fmt::Debug + Send + Sync + Unpin + 'static
{
    /// Store-assigned identity type
    type Id: Copy + fmt::Display + Into<i64> + Send + Sync + 'static;

    /// Filter and sort request for this kind
    type Criteria: Criteria;

    /// Human-readable kind, used in errors and logs
    const KIND: &'static str;

    const TABLE: &'static str;

    /// Identity column; also the default and final sort key
    const IDENTITY: &'static str = "id";

    /// Whitelist of filterable and sortable columns, in select order
    const COLUMNS: &'static [&'static str];

    /// Columns supplied by the caller on insert, in `bind_insert` order
    const INSERT_COLUMNS: &'static [&'static str];

    fn id(&self) -> Self::Id;

    /// Binds one value per `INSERT_COLUMNS` entry
    fn bind_insert<'args>(&self, values: &mut Separated<'_, 'args, Postgres, &'static str>);
}

/// Filter and sort request against one entity kind
pub trait Criteria: Send + Sync {
    /// Pushes one condition per present predicate
    fn push_filters(&self, filter: &mut Filter<'_, '_>);

    fn sort(&self) -> &Sort;

    fn pagination(&self) -> Pagination {
        Pagination::default()
    }
}
