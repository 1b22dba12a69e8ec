//! Database operations for the allocation ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use parceldesk_core::{AllocationLineItemId, InventoryBatchId, OrderId, ProductId};

use super::RepositoryError;
use crate::models::allocation::AllocationLineItem;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for allocation line item queries.
#[derive(Debug, sqlx::FromRow)]
struct AllocationLineItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    batch_id: i32,
    quantity: i32,
    unit_cost: Decimal,
    allocated_at: DateTime<Utc>,
}

impl From<AllocationLineItemRow> for AllocationLineItem {
    fn from(row: AllocationLineItemRow) -> Self {
        Self {
            id: AllocationLineItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            batch_id: InventoryBatchId::new(row.batch_id),
            quantity: row.quantity,
            unit_cost: row.unit_cost,
            allocated_at: row.allocated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for allocation ledger database operations.
pub struct AllocationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AllocationRepository<'a> {
    /// Create a new allocation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get line items for an order, in allocation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<AllocationLineItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, AllocationLineItemRow>(
            r"
            SELECT id, order_id, product_id, batch_id, quantity, unit_cost, allocated_at
            FROM allocation_line_items
            WHERE order_id = $1
            ORDER BY allocated_at ASC, id ASC
            ",
        )
        .bind(order_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Transactional helpers
// =============================================================================

/// Append one ledger entry for a batch draw.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub(crate) async fn insert_line_item(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    product_id: ProductId,
    batch_id: InventoryBatchId,
    quantity: i32,
    unit_cost: Decimal,
) -> Result<AllocationLineItem, RepositoryError> {
    let row = sqlx::query_as::<_, AllocationLineItemRow>(
        r"
        INSERT INTO allocation_line_items (order_id, product_id, batch_id, quantity, unit_cost)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, order_id, product_id, batch_id, quantity, unit_cost, allocated_at
        ",
    )
    .bind(order_id.as_i32())
    .bind(product_id.as_i32())
    .bind(batch_id.as_i32())
    .bind(quantity)
    .bind(unit_cost)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(row.into())
}

/// Get an order's line items inside the caller's transaction, so the batch
/// restores that follow operate on the same snapshot the delete will clear.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn list_for_order(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<Vec<AllocationLineItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, AllocationLineItemRow>(
        r"
        SELECT id, order_id, product_id, batch_id, quantity, unit_cost, allocated_at
        FROM allocation_line_items
        WHERE order_id = $1
        ORDER BY allocated_at ASC, id ASC
        ",
    )
    .bind(order_id.as_i32())
    .fetch_all(tx.as_mut())
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Delete all of an order's line items. Returns the number deleted.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn delete_for_order(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM allocation_line_items WHERE order_id = $1")
        .bind(order_id.as_i32())
        .execute(tx.as_mut())
        .await?;

    Ok(result.rows_affected())
}
