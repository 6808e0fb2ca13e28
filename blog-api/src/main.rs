use std::sync::Arc;

use anyhow::Result;
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::blog_service::BlogService;
use data::post_repository::DynPostRepository;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level, settings.log_format)?;
    info!(database = ?settings.database, "starting blog-api");

    let pool = create_pool(&settings.database, &settings.pool).await?;
    run_migrations(&pool).await?;

    let repo: DynPostRepository = Arc::new(PostgresPostRepository::new(
        pool.clone(),
        settings.pool.query_timeout,
    ));
    let state = AppState::new(Arc::new(BlogService::new(repo)));

    server::run_http(&settings, state).await?;

    pool.close().await;
    Ok(())
}
