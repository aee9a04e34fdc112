use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

use crate::{api::error, ENV};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn connect_database() -> Result<PgPool, error::SystemError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(&ENV.database_url)
        .await?;
    Ok(pool)
}

/// Creates the documents table and its indexes if they are missing.
pub async fn run_migrations(pool: &PgPool) -> Result<(), error::SystemError> {
    MIGRATOR.run(pool).await?;
    log::info!("Database migrations applied");
    Ok(())
}
