//! Database operations for the ParcelDesk dashboard.
//!
//! ## Tables
//!
//! - `products` - Catalog with cached `current_stock` and fallback unit cost
//! - `inventory_batches` - FIFO cost layers, one per stock receipt
//! - `allocation_line_items` - Ledger of which batches satisfied which order
//! - `orders` - Orders with allocation guard flag and frozen cost fields
//!
//! Pool-level reads live on the repository structs; mutations that must be
//! atomic with other writes are free functions taking the caller's open
//! transaction, so the service layer controls commit boundaries.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p parceldesk-cli -- migrate
//! ```

pub mod allocations;
pub mod inventory_batches;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use allocations::AllocationRepository;
pub use inventory_batches::BatchRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate product name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
