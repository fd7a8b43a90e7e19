//! Schema bootstrap
//!
//! The engine does not manage schema; the demo applies the newsroom schema
//! itself before touching any repository. Statements are idempotent.

use sqlx::PgPool;
use tracing::info;

use infra_db::{DatabaseError, SCHEMA_SQL};

pub async fn bootstrap(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    info!("schema ready");
    Ok(())
}
