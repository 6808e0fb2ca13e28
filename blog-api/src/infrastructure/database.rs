use anyhow::{Context, Result, anyhow};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

use super::settings::{DatabaseSettings, PoolSettings};

/// Builds the pool and checks it can reach the store within the connect timeout.
pub(crate) async fn create_pool(database: &DatabaseSettings, pool: &PoolSettings) -> Result<PgPool> {
    let options = database.connect_options()?;
    let target = database.describe();

    info!(
        db = %target,
        max_connections = pool.max_connections,
        min_connections = pool.min_connections,
        max_lifetime_secs = pool.max_lifetime.as_secs(),
        idle_timeout_secs = pool.idle_timeout.as_secs(),
        "creating database pool"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .max_lifetime(pool.max_lifetime)
        .idle_timeout(pool.idle_timeout)
        .acquire_timeout(pool.acquire_timeout)
        .connect_lazy_with(options);

    match tokio::time::timeout(pool.connect_timeout, sqlx::query("SELECT 1").execute(&pg_pool))
        .await
    {
        Ok(Ok(_)) => {
            info!(db = %target, "database pool verified");
            Ok(pg_pool)
        }
        Ok(Err(err)) => {
            error!(db = %target, error = %err, "failed to ping postgres");
            Err(err).context("failed to ping postgres")
        }
        Err(_) => {
            error!(
                db = %target,
                timeout_secs = pool.connect_timeout.as_secs(),
                "postgres ping timed out"
            );
            Err(anyhow!(
                "postgres ping timed out after {}s",
                pool.connect_timeout.as_secs()
            ))
        }
    }
}

pub(crate) async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!("database migrations applied");
    Ok(())
}
