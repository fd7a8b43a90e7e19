//! Generic entity repository
//!
//! One [`Repository`] type serves every [`Entity`]: the entity supplies its
//! table, whitelisted columns and insert bindings, and the repository compiles
//! criteria into SQL, runs it on the pool and classifies failures.
//!
//! Every call borrows a pool connection for its own duration, except
//! [`Repository::find_iter`], whose iterator keeps one until it is drained,
//! closed or dropped.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, instrument};
use validator::Validate;

use crate::entity::Entity;
use crate::error::DatabaseError;
use crate::iterator::{CursorSource, ResultIterator, DEFAULT_FETCH_SIZE};
use crate::query;

/// Engine knobs shared by all repositories built from one configuration
///
/// # Example
///
/// ```rust
/// use infra_db::RepositoryConfig;
///
/// let config = RepositoryConfig::new().log_queries(true).fetch_size(25);
/// assert!(config.log_queries);
/// assert_eq!(config.fetch_size, 25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Log every compiled statement at debug level
    pub log_queries: bool,
    /// Rows pulled per round trip by result iterators
    pub fetch_size: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            log_queries: false,
            fetch_size: DEFAULT_FETCH_SIZE,
        }
    }
}

impl RepositoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    /// Sets the iterator batch size; zero is treated as one
    pub fn fetch_size(mut self, rows: u32) -> Self {
        self.fetch_size = rows.max(1);
        self
    }
}

/// Typed CRUD and criteria queries for one entity kind
pub struct Repository<E> {
    pool: PgPool,
    config: RepositoryConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            config: self.config,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("table", &E::TABLE)
            .field("config", &self.config)
            .finish()
    }
}

impl<E: Entity> Repository<E> {
    /// Creates a repository with the default configuration
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, RepositoryConfig::default())
    }

    pub fn with_config(pool: PgPool, config: RepositoryConfig) -> Self {
        Self {
            pool,
            config,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> RepositoryConfig {
        self.config
    }

    /// Counts the rows matching `criteria`
    ///
    /// Sort and pagination are ignored. An empty match is `Ok(0)`.
    #[instrument(skip(self, criteria), fields(kind = E::KIND))]
    pub async fn count(&self, criteria: &E::Criteria) -> Result<i64, DatabaseError> {
        let mut builder = query::count::<E>(criteria);
        self.log_sql(&builder);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        debug!(count, "rows counted");
        Ok(count)
    }

    /// Inserts a new entity and returns the stored row
    ///
    /// The entity's identity must be unassigned. The returned snapshot carries
    /// the store-assigned identity and column defaults.
    ///
    /// # Errors
    ///
    /// - `Validation` when the identity is set or the entity's own checks fail
    /// - `ConstraintViolation` for a named uniqueness or referential failure
    /// - `ConnectionFailed`/`PoolExhausted` when the store is unreachable
    #[instrument(skip(self, entity), fields(kind = E::KIND))]
    pub async fn insert(&self, entity: &E) -> Result<E, DatabaseError> {
        let id: i64 = entity.id().into();
        if id != 0 {
            return Err(DatabaseError::validation(format!(
                "{} identity must be unassigned on insert, got {}",
                E::KIND,
                entity.id()
            )));
        }
        entity
            .validate()
            .map_err(|e| DatabaseError::validation(e.to_string()))?;

        let mut builder = query::insert(entity);
        self.log_sql(&builder);

        let inserted: E = builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await?;

        debug!(id = %inserted.id(), "entity inserted");
        Ok(inserted)
    }

    /// Returns every matching row, ordered and windowed per `criteria`
    #[instrument(skip(self, criteria), fields(kind = E::KIND))]
    pub async fn find(&self, criteria: &E::Criteria) -> Result<Vec<E>, DatabaseError> {
        let mut builder = query::select::<E>("", criteria)?;
        self.log_sql(&builder);

        let rows: Vec<E> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        debug!(rows = rows.len(), "rows fetched");
        Ok(rows)
    }

    /// Opens a lazy iterator over the matching rows
    ///
    /// The query is compiled and the cursor declared before this returns, so
    /// bad criteria and connectivity problems surface here. No row is read
    /// until the first `next()`.
    #[instrument(skip(self, criteria), fields(kind = E::KIND))]
    pub async fn find_iter(
        &self,
        criteria: &E::Criteria,
    ) -> Result<ResultIterator<E>, DatabaseError> {
        let cursor = query::cursor_name::<E>();
        let builder = query::select::<E>(&query::declare_cursor_prefix(&cursor), criteria)?;
        self.log_sql(&builder);

        let source = CursorSource::open(&self.pool, cursor, builder).await?;
        debug!(fetch_size = self.config.fetch_size, "cursor opened");
        Ok(ResultIterator::new(source, self.config.fetch_size, E::KIND))
    }

    /// Looks one row up by identity
    #[instrument(skip(self, id), fields(kind = E::KIND, id = %id))]
    pub async fn find_one_by_id(&self, id: E::Id) -> Result<E, DatabaseError> {
        let mut builder = query::find_by_id::<E>(id);
        self.log_sql(&builder);

        let row: Option<E> = builder
            .build_query_as()
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| DatabaseError::not_found(E::KIND, id))
    }

    /// Deletes one row by identity and returns the number of rows removed
    #[instrument(skip(self, id), fields(kind = E::KIND, id = %id))]
    pub async fn delete_one_by_id(&self, id: E::Id) -> Result<u64, DatabaseError> {
        let mut builder = query::delete_by_id::<E>(id);
        self.log_sql(&builder);

        let deleted = builder.build().execute(&self.pool).await?.rows_affected();

        debug!(deleted, "entity deleted");
        Ok(deleted)
    }

    fn log_sql(&self, builder: &QueryBuilder<'_, Postgres>) {
        if self.config.log_queries {
            debug!(table = E::TABLE, sql = builder.sql(), "compiled query");
        }
    }
}
