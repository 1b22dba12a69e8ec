//! Database operations for orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use parceldesk_core::{OrderId, OrderStatus};

use super::RepositoryError;
use crate::models::order::{CreateOrderInput, Order};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    description: String,
    tracking_number: Option<String>,
    status: OrderStatus,
    allocated: bool,
    return_received: bool,
    provisional_cost: Option<Decimal>,
    final_cost: Option<Decimal>,
    sale_price: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            description: row.description,
            tracking_number: row.tracking_number,
            status: row.status,
            allocated: row.allocated,
            return_received: row.return_received,
            provisional_cost: row.provisional_cost,
            final_cost: row.final_cost,
            sale_price: row.sale_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new order in the unallocated state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &CreateOrderInput) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders (description, tracking_number, sale_price)
            VALUES ($1, $2, $3)
            RETURNING id, description, tracking_number, status, allocated, return_received,
                      provisional_cost, final_cost, sale_price, created_at, updated_at
            ",
        )
        .bind(&input.description)
        .bind(&input.tracking_number)
        .bind(input.sale_price)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, description, tracking_number, status, allocated, return_received,
                   provisional_cost, final_cost, sale_price, created_at, updated_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, description, tracking_number, status, allocated, return_received,
                   provisional_cost, final_cost, sale_price, created_at, updated_at
            FROM orders
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List undelivered orders that have a tracking number, for the
    /// status-refresh sweep.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_undelivered_with_tracking(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, description, tracking_number, status, allocated, return_received,
                   provisional_cost, final_cost, sale_price, created_at, updated_at
            FROM orders
            WHERE status <> 'delivered' AND tracking_number IS NOT NULL
            ORDER BY created_at ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Transactional helpers
// =============================================================================

/// Check-and-set the allocate-once guard. Returns `true` if this call won
/// the flag, `false` if the order was already allocated or doesn't exist.
///
/// Part of the same transaction that writes the ledger, so a retried
/// allocation call is rejected instead of double-deducting stock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn try_mark_allocated(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE orders
        SET allocated = TRUE, updated_at = NOW()
        WHERE id = $1 AND allocated = FALSE
        ",
    )
    .bind(id.as_i32())
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Store the cost computed at allocation time.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn set_provisional_cost(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
    cost: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE orders
        SET provisional_cost = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id.as_i32())
    .bind(cost)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

/// Reset the order to its unallocated-equivalent state: clear the guard
/// flag and the provisional cost.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn clear_allocation(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE orders
        SET allocated = FALSE, provisional_cost = NULL, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id.as_i32())
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

/// Persist the return-received flag. Returns `false` if the order row no
/// longer exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn set_return_received(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
    received: bool,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE orders
        SET return_received = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id.as_i32())
    .bind(received)
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Transition the order's status. Returns `false` if the order row no
/// longer exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
    status: OrderStatus,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE orders
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id.as_i32())
    .bind(status)
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Copy the provisional cost into the final cost, exactly once.
///
/// The `final_cost IS NULL` guard makes re-delivery a no-op: once frozen,
/// the recorded cost is never recalculated from current catalog prices.
///
/// Returns `true` if the cost was frozen by this call.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn finalize_cost(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE orders
        SET final_cost = provisional_cost, updated_at = NOW()
        WHERE id = $1 AND final_cost IS NULL AND provisional_cost IS NOT NULL
        ",
    )
    .bind(id.as_i32())
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete an order row. Returns `true` if a row was deleted.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn delete(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id.as_i32())
        .execute(tx.as_mut())
        .await?;

    Ok(result.rows_affected() > 0)
}
