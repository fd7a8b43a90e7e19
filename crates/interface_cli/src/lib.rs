//! Newsroom Demonstration Harness
//!
//! Drives the repository engine the way an application would: bootstraps the
//! schema, writes news, comments and a category tree, streams rows back and
//! provokes a referential violation on purpose.
//!
//! The library half returns errors; only the `newsroom-demo` binary decides
//! to exit on them.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_cli::{config::DemoConfig, scenario::Scenario};
//!
//! let config = DemoConfig::from_env()?;
//! let report = Scenario::new(repos, config.scenario()).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod scenario;
pub mod schema;

pub use config::DemoConfig;
pub use error::DemoError;
pub use scenario::{Scenario, ScenarioOptions, ScenarioReport};
