//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by commands that need a database connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Neither `PITSTOP_DATABASE_URL` nor `DATABASE_URL` is set.
    #[error("missing environment variable: PITSTOP_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the shop database using the same environment variables as
/// the storefront: `PITSTOP_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("PITSTOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = pitstop_storefront::db::create_pool(&database_url).await?;
    Ok(pool)
}
