//! Newsroom schema
//!
//! The repositories never create or migrate tables. The DDL lives here so the
//! demo bootstrap and the test harness apply the same statements, and so the
//! constraint names in [`Constraint`](crate::Constraint) are checked against it.

/// Idempotent DDL for the `news`, `comment` and `category` tables
pub const SCHEMA_SQL: &str = include_str!("../../../migrations/20240101_000001_newsroom_schema.sql");
