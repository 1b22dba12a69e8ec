//! Database operations for inventory batches (FIFO cost layers).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use parceldesk_core::{InventoryBatchId, ProductId};

use super::RepositoryError;
use crate::models::inventory_batch::{CreateBatchInput, InventoryBatch};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for inventory batch queries.
#[derive(Debug, sqlx::FromRow)]
struct InventoryBatchRow {
    id: i32,
    product_id: i32,
    quantity_received: i32,
    remaining_quantity: i32,
    unit_cost: Decimal,
    received_at: DateTime<Utc>,
    reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<InventoryBatchRow> for InventoryBatch {
    fn from(row: InventoryBatchRow) -> Self {
        Self {
            id: InventoryBatchId::new(row.id),
            product_id: ProductId::new(row.product_id),
            quantity_received: row.quantity_received,
            remaining_quantity: row.remaining_quantity,
            unit_cost: row.unit_cost,
            received_at: row.received_at,
            reference: row.reference,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for inventory batch database operations.
pub struct BatchRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BatchRepository<'a> {
    /// Create a new batch repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a stock receipt: insert a batch with `remaining_quantity`
    /// equal to `quantity_received`, and bump the product's cached stock in
    /// the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_batch(
        &self,
        input: &CreateBatchInput,
    ) -> Result<InventoryBatch, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;

        let row = sqlx::query_as::<_, InventoryBatchRow>(
            r"
            INSERT INTO inventory_batches (
                product_id, quantity_received, remaining_quantity,
                unit_cost, received_at, reference
            )
            VALUES ($1, $2, $2, $3, COALESCE($4, NOW()), $5)
            RETURNING id, product_id, quantity_received, remaining_quantity,
                      unit_cost, received_at, reference, created_at
            ",
        )
        .bind(input.product_id.as_i32())
        .bind(input.quantity_received)
        .bind(input.unit_cost)
        .bind(input.received_at)
        .bind(&input.reference)
        .fetch_one(tx.as_mut())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        super::products::receive_stock(&mut tx, input.product_id, input.quantity_received)
            .await?;

        tx.commit().await.map_err(RepositoryError::Database)?;

        Ok(row.into())
    }

    /// Get a batch by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: InventoryBatchId) -> Result<Option<InventoryBatch>, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryBatchRow>(
            r"
            SELECT id, product_id, quantity_received, remaining_quantity,
                   unit_cost, received_at, reference, created_at
            FROM inventory_batches
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List all batches for a product in FIFO order (oldest receipt first,
    /// ties broken by insertion order), including exhausted batches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<InventoryBatch>, RepositoryError> {
        let rows = sqlx::query_as::<_, InventoryBatchRow>(
            r"
            SELECT id, product_id, quantity_received, remaining_quantity,
                   unit_cost, received_at, reference, created_at
            FROM inventory_batches
            WHERE product_id = $1
            ORDER BY received_at ASC, id ASC
            ",
        )
        .bind(product_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Transactional helpers
// =============================================================================

/// Load and row-lock the product's open batches (remaining > 0) in FIFO
/// order. The lock holds until the caller's transaction commits, so the
/// allocation walk sees a consistent snapshot of `remaining_quantity`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn lock_open_layers(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
) -> Result<Vec<InventoryBatch>, RepositoryError> {
    let rows = sqlx::query_as::<_, InventoryBatchRow>(
        r"
        SELECT id, product_id, quantity_received, remaining_quantity,
               unit_cost, received_at, reference, created_at
        FROM inventory_batches
        WHERE product_id = $1 AND remaining_quantity > 0
        ORDER BY received_at ASC, id ASC
        FOR UPDATE
        ",
    )
    .bind(product_id.as_i32())
    .fetch_all(tx.as_mut())
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Decrement a batch's remaining quantity by `quantity`.
///
/// The caller computed `quantity` from rows it holds locks on, so the guard
/// failing means the snapshot was violated.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the batch no longer has
/// `quantity` units remaining.
/// Returns `RepositoryError::Database` for other database errors.
pub(crate) async fn take_from_batch(
    tx: &mut Transaction<'_, Postgres>,
    id: InventoryBatchId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE inventory_batches
        SET remaining_quantity = remaining_quantity - $2
        WHERE id = $1 AND remaining_quantity >= $2
        ",
    )
    .bind(id.as_i32())
    .bind(quantity)
    .execute(tx.as_mut())
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::DataCorruption(format!(
            "batch {id} has fewer than {quantity} units remaining"
        )));
    }
    Ok(())
}

/// Restore `quantity` units to a batch, clamped so remaining never exceeds
/// `quantity_received`.
///
/// Returns `false` if the batch row no longer exists (the caller logs and
/// skips rather than aborting).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn restore_to_batch(
    tx: &mut Transaction<'_, Postgres>,
    id: InventoryBatchId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE inventory_batches
        SET remaining_quantity = LEAST(remaining_quantity + $2, quantity_received)
        WHERE id = $1
        ",
    )
    .bind(id.as_i32())
    .bind(quantity)
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Re-remove `quantity` units from a batch (return un-received), clamped at
/// a minimum of 0.
///
/// Returns `false` if the batch row no longer exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn remove_from_batch(
    tx: &mut Transaction<'_, Postgres>,
    id: InventoryBatchId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE inventory_batches
        SET remaining_quantity = GREATEST(remaining_quantity - $2, 0)
        WHERE id = $1
        ",
    )
    .bind(id.as_i32())
    .bind(quantity)
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected() > 0)
}
