//! Core Kernel - Foundational types for the newsroom repository engine
//!
//! This crate provides the vocabulary shared by every entity repository:
//! - Strongly-typed, store-assigned identifiers
//! - Filter predicates that describe *what* to match
//! - Sort requests and their whitelist normalization
//! - Offset/limit pagination
//!
//! Nothing in here knows how a query is rendered; `infra_db` compiles these
//! types into parameterized SQL.

pub mod error;
pub mod identifiers;
pub mod pagination;
pub mod predicate;
pub mod sort;

pub use error::CoreError;
pub use identifiers::{CategoryId, CommentId, NewsId};
pub use pagination::Pagination;
pub use predicate::{escape_like, Predicate, TextPredicate};
pub use sort::{Direction, ResolvedSort, Sort, SortKey};
