//! Seed pre-existing stock as FIFO batches.
//!
//! A shop migrating onto ParcelDesk usually has products with a known
//! on-hand quantity but no receipt history. This command creates one
//! opening batch per such product, at the product's default unit cost, so
//! FIFO allocation has a cost layer to draw from. Products that already
//! have batches are left alone.

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from the seed command.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A product that has stock but no batches yet.
#[derive(Debug, sqlx::FromRow)]
struct UnseededProduct {
    id: i32,
    name: String,
    current_stock: i32,
    default_unit_cost: Decimal,
}

/// Create one opening batch per product with stock but no batches.
///
/// # Errors
///
/// Returns `SeedError` if the database URL is missing or a query fails.
pub async fn opening_stock() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| SeedError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    let pool = parceldesk_admin::db::create_pool(&database_url).await?;
    info!("Connected to database");

    let products = unseeded_products(&pool).await?;
    if products.is_empty() {
        info!("No products need opening batches");
        return Ok(());
    }

    let mut seeded = 0u32;
    for product in &products {
        if product.default_unit_cost == Decimal::ZERO {
            warn!(
                product_id = product.id,
                name = %product.name,
                "Seeding opening batch with zero unit cost; set default_unit_cost first for accurate COGS"
            );
        }

        sqlx::query(
            r"
            INSERT INTO inventory_batches (
                product_id, quantity_received, remaining_quantity,
                unit_cost, reference
            )
            VALUES ($1, $2, $2, $3, 'opening stock')
            ",
        )
        .bind(product.id)
        .bind(product.current_stock)
        .bind(product.default_unit_cost)
        .execute(&pool)
        .await?;

        seeded += 1;
        info!(
            product_id = product.id,
            name = %product.name,
            quantity = product.current_stock,
            unit_cost = %product.default_unit_cost,
            "Seeded opening batch"
        );
    }

    info!("Seeding complete! Opening batches created: {seeded}");
    Ok(())
}

/// Products with positive stock and no batch rows.
async fn unseeded_products(pool: &PgPool) -> Result<Vec<UnseededProduct>, SeedError> {
    let rows = sqlx::query_as::<_, UnseededProduct>(
        r"
        SELECT p.id, p.name, p.current_stock, p.default_unit_cost
        FROM products p
        LEFT JOIN inventory_batches b ON b.product_id = p.id
        WHERE b.id IS NULL AND p.current_stock > 0
        ORDER BY p.name ASC
        ",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
