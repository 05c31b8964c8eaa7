// File: tests/test_helpers.rs

#![allow(dead_code)]

use uuid::Uuid;

// Fresh owner ID for a test so runs never see each other's rows
pub fn test_user() -> Uuid {
    Uuid::new_v4()
}

// Unique email per test run
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4())
}

// Database test utilities
#[cfg(feature = "db_tests")]
use sqlx::{postgres::PgPoolOptions, PgPool};

#[cfg(feature = "db_tests")]
pub struct DbTestContext {
    pub pool: PgPool,
    pub database_url: String,
}

#[cfg(feature = "db_tests")]
impl DbTestContext {
    // Create a new test database context
    pub async fn new() -> Self {
        // Use a test-specific database configuration
        let database_url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set for database tests");

        // Connect to the test database
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        // Run migrations to set up schema; the migrator is idempotent so
        // repeated calls across tests are harmless
        common::db::run_migrations(&pool)
            .await
            .expect("Failed to run database migrations");

        Self { pool, database_url }
    }

    // Clean up test data after tests
    pub async fn cleanup(&self) {
        // Delete all test data, in the correct order to respect foreign key constraints
        sqlx::query("DELETE FROM bot_trades")
            .execute(&self.pool)
            .await
            .expect("Failed to clean up bot_trades table");

        sqlx::query("DELETE FROM bots")
            .execute(&self.pool)
            .await
            .expect("Failed to clean up bots table");

        sqlx::query("DELETE FROM copytrader_settings")
            .execute(&self.pool)
            .await
            .expect("Failed to clean up copytrader_settings table");

        sqlx::query("DELETE FROM copytraders")
            .execute(&self.pool)
            .await
            .expect("Failed to clean up copytraders table");

        sqlx::query("DELETE FROM transfers")
            .execute(&self.pool)
            .await
            .expect("Failed to clean up transfers table");

        sqlx::query("DELETE FROM system_funds")
            .execute(&self.pool)
            .await
            .expect("Failed to clean up system_funds table");

        sqlx::query("DELETE FROM notifications")
            .execute(&self.pool)
            .await
            .expect("Failed to clean up notifications table");
    }
}
