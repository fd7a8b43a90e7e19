//! Newsroom repository demo
//!
//! Bootstraps the schema on the configured database and runs the demo
//! scenario once. Any failure ends the process with a non-zero status.
//!
//! # Usage
//!
//! ```bash
//! NEWSROOM_DATABASE_URL=postgres://localhost:5432/test?sslmode=disable cargo run --bin newsroom-demo
//! ```
//!
//! # Environment Variables
//!
//! * `NEWSROOM_DATABASE_URL` - PostgreSQL connection string (falls back to `DATABASE_URL`)
//! * `NEWSROOM_DEBUG` - Log compiled SQL and engine events (default: true)
//! * `NEWSROOM_LOG_LEVEL` - Base log filter when `RUST_LOG` is unset (default: info)
//! * `NEWSROOM_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `NEWSROOM_COMMENTS` / `NEWSROOM_CHILDREN` - Rows written per step (default: 20)

use anyhow::Context;
use infra_db::{create_pool, DatabaseConfig, Repositories, RepositoryConfig};
use interface_cli::{schema, DemoConfig, Scenario};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = DemoConfig::from_env().context("invalid NEWSROOM_* configuration")?;
    init_tracing(&config.log_filter());

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.as_str()).max_connections(config.max_connections),
    )
    .await
    .context("failed to connect to database")?;

    schema::bootstrap(&pool)
        .await
        .context("failed to bootstrap schema")?;

    let repos = Repositories::with_config(
        pool.clone(),
        RepositoryConfig::new().log_queries(config.debug),
    );

    let report = Scenario::new(repos, config.scenario())
        .run()
        .await
        .context("demo scenario failed")?;

    tracing::info!(
        news_id = %report.news.id,
        comments = report.comments_streamed,
        categories = report.children_counted,
        "demo finished"
    );

    pool.close().await;
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
