//! Infrastructure Database Layer
//!
//! This crate provides the repository engine for the newsroom store: one
//! generic [`Repository`] instantiated for each entity kind (news, comments,
//! categories) on PostgreSQL using SQLx.
//!
//! # Architecture
//!
//! - [`Entity`] describes a table: its whitelisted columns, how a row decodes,
//!   and how a new row binds for insert.
//! - [`Criteria`] describes *what to match* and *in which order*, compiled by
//!   [`query`] into parameterized SQL restricted to the whitelist.
//! - [`ResultIterator`] streams rows from a server-side cursor.
//! - [`Constraint`] names the schema's constraints so callers branch on a
//!   stable identifier instead of store wording.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, Repositories};
//! use infra_db::repositories::{News, NewsCriteria};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/newsroom")).await?;
//! let repos = Repositories::new(pool);
//! let news = repos.news.insert(&News::new("Title", "Body")).await?;
//! let total = repos.news.count(&NewsCriteria::default()).await?;
//! ```

pub mod constraint;
pub mod entity;
pub mod error;
pub mod iterator;
pub mod pool;
pub mod query;
pub mod repositories;
pub mod repository;
pub mod schema;

pub use constraint::{error_constraint, Constraint, ConstraintKind};
pub use entity::{Criteria, Entity};
pub use error::DatabaseError;
pub use iterator::{CursorSource, IteratorState, ResultIterator, RowSource};
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use query::{Filter, FilterPredicate};
pub use repositories::Repositories;
pub use repository::{Repository, RepositoryConfig};
pub use schema::SCHEMA_SQL;
