use std::env;

use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres};

use crate::error::Result;

pub mod transaction;

// Re-export transaction types
pub use transaction::{
    DBTransaction, InMemoryTransaction, InMemoryTransactionManager, PgTransaction,
    PgTransactionManager, TransactionManager,
};

/// Database pool type
pub type DbPool = Pool<Postgres>;

/// Initialize the database connection pool from `DATABASE_URL`
pub async fn init_db_pool() -> Result<DbPool> {
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| crate::error::Error::ConfigurationError("DATABASE_URL must be set".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await?;

    Ok(pool)
}

/// Run migrations on the database
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrations_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("migrations");

    sqlx::migrate::Migrator::new(migrations_path)
        .await?
        .run(pool)
        .await?;

    Ok(())
}
