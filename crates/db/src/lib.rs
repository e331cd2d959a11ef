//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the billing schema
//! - Row to engine type conversions
//! - The `BillingRepository` implementing the billing runner's storage traits
//! - Database migrations

pub mod entities;
pub mod mapping;
pub mod migration;
pub mod repositories;

pub use migration::Migrator;
pub use repositories::BillingRepository;

use std::time::Duration;

use billrun_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
