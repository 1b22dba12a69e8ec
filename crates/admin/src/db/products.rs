//! Database operations for products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use parceldesk_core::ProductId;

use super::RepositoryError;
use crate::models::product::{CreateProductInput, Product, ProductCostSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    current_stock: i32,
    default_unit_cost: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            current_stock: row.current_stock,
            default_unit_cost: row.default_unit_cost,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for the cost summary aggregate.
#[derive(Debug, sqlx::FromRow)]
struct CostSummaryRow {
    id: i32,
    name: String,
    remaining_total: i64,
    active_batch_count: i64,
    weighted_avg_cost: Option<Decimal>,
}

impl From<CostSummaryRow> for ProductCostSummary {
    fn from(row: CostSummaryRow) -> Self {
        Self {
            product_id: ProductId::new(row.id),
            name: row.name,
            remaining_total: row.remaining_total,
            active_batch_count: row.active_batch_count,
            weighted_avg_cost: row.weighted_avg_cost,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a product with the same name
    /// (case-insensitive) already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &CreateProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (name, default_unit_cost)
            VALUES ($1, $2)
            RETURNING id, name, current_stock, default_unit_cost, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(input.default_unit_cost)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("idx_products_name_lower")
            {
                return RepositoryError::Conflict(format!(
                    "product name already exists: {}",
                    input.name
                ));
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, current_stock, default_unit_cost, created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a product by canonical name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, current_stock, default_unit_cost, created_at, updated_at
            FROM products
            WHERE LOWER(name) = LOWER($1)
            ",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List all products, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, current_stock, default_unit_cost, created_at, updated_at
            FROM products
            ORDER BY name ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Per-product inventory aggregates for dashboard tiles: remaining total,
    /// active batch count, and remaining-weighted average unit cost.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cost_summary(&self) -> Result<Vec<ProductCostSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CostSummaryRow>(
            r"
            SELECT
                p.id,
                p.name,
                COALESCE(SUM(b.remaining_quantity), 0)::bigint AS remaining_total,
                COUNT(b.id) FILTER (WHERE b.remaining_quantity > 0) AS active_batch_count,
                CASE
                    WHEN COALESCE(SUM(b.remaining_quantity), 0) > 0
                    THEN SUM(b.remaining_quantity * b.unit_cost) / SUM(b.remaining_quantity)
                END AS weighted_avg_cost
            FROM products p
            LEFT JOIN inventory_batches b ON b.product_id = p.id
            GROUP BY p.id, p.name
            ORDER BY p.name ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Recompute `current_stock` from the product's batches.
    ///
    /// Drift-recovery routine: the cache is maintained transactionally by
    /// allocation and reversal, but this recomputes it from the batch rows
    /// (the source of truth) on demand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn reconcile_stock(&self, id: ProductId) -> Result<i32, RepositoryError> {
        let row = sqlx::query_scalar::<_, i32>(
            r"
            UPDATE products
            SET current_stock = COALESCE((
                    SELECT SUM(remaining_quantity)::int
                    FROM inventory_batches
                    WHERE product_id = products.id
                ), 0),
                updated_at = NOW()
            WHERE id = $1
            RETURNING current_stock
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row)
    }
}

// =============================================================================
// Transactional helpers
// =============================================================================

/// Adjust the cached `current_stock` by `delta` (negative to deduct),
/// clamped at a minimum of 0.
///
/// Returns `false` if the product row no longer exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn adjust_stock(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    delta: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE products
        SET current_stock = GREATEST(current_stock + $2, 0),
            updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id.as_i32())
    .bind(delta)
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Bump the cached `current_stock` when a batch is received.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub(crate) async fn receive_stock(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE products
        SET current_stock = current_stock + $2,
            updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id.as_i32())
    .bind(quantity)
    .execute(tx.as_mut())
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
