//! Demo configuration

use serde::Deserialize;

use crate::scenario::ScenarioOptions;

const ENV_PREFIX: &str = "NEWSROOM";

/// Demo configuration, read from `NEWSROOM_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    /// Log compiled SQL and engine debug events
    pub debug: bool,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// Comments written for the demo article
    pub comments: usize,
    /// Children written under the demo category
    pub children: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost:5432/test?sslmode=disable".to_string(),
            debug: true,
            log_level: "info".to_string(),
            max_connections: 10,
            comments: 20,
            children: 20,
        }
    }
}

impl DemoConfig {
    /// Loads configuration from the environment over the defaults
    ///
    /// `DATABASE_URL` is honoured when `NEWSROOM_DATABASE_URL` is unset.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        config::Config::builder()
            .set_default("database_url", database_url)?
            .set_default("debug", defaults.debug)?
            .set_default("log_level", defaults.log_level)?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("comments", defaults.comments as i64)?
            .set_default("children", defaults.children as i64)?
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// The effective log filter: `debug` raises the engine crates to debug
    pub fn log_filter(&self) -> String {
        if self.debug {
            format!("{},infra_db=debug,interface_cli=debug", self.log_level)
        } else {
            self.log_level.clone()
        }
    }

    pub fn scenario(&self) -> ScenarioOptions {
        ScenarioOptions {
            comments: self.comments,
            children: self.children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_local_database() {
        let config = DemoConfig::default();
        assert_eq!(
            config.database_url,
            "postgres://localhost:5432/test?sslmode=disable"
        );
        assert!(config.debug);
        assert_eq!(config.scenario().comments, 20);
        assert_eq!(config.scenario().children, 20);
    }

    #[test]
    fn test_log_filter() {
        let mut config = DemoConfig::default();
        assert_eq!(config.log_filter(), "info,infra_db=debug,interface_cli=debug");

        config.debug = false;
        config.log_level = "warn".into();
        assert_eq!(config.log_filter(), "warn");
    }
}
