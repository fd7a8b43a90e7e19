//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! newsroom repository engine test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for news, comments and categories
//! - `builders`: Builder patterns for unsaved entities
//! - `database`: PostgreSQL test container with the newsroom schema
//! - `assertions`: Assertion helpers for repository results
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
