//! FIFO allocation service: allocation, reversal, return toggling, and cost
//! finalization.
//!
//! Every order-level operation runs in a single transaction: the batch
//! decrements, the ledger writes, the cached stock adjustment, and the
//! order's flag/cost updates commit together or not at all. The allocate-once
//! guard is check-and-set inside that same transaction, so a retried call is
//! rejected rather than double-deducting stock.

pub mod plan;

use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{info, warn};

use parceldesk_core::{OrderId, OrderStatus, ProductId};

use crate::db::{
    self, AllocationRepository, OrderRepository, ProductRepository, RepositoryError,
};
use crate::models::allocation::{AllocationLineItem, AllocationOutcome};
use crate::models::order::BulkDeleteReport;
use crate::services::resolver::ProductResolver;

pub use plan::{BatchLayer, FifoPlan, PlannedTake, plan_allocation, sum_by_batch, sum_by_product};

/// Errors from allocation-service operations.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Requested quantity was zero or negative. Rejected before any mutation.
    #[error("requested quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    /// The product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order's allocate-once guard was already consumed.
    #[error("order {0} is already allocated")]
    AlreadyAllocated(OrderId),

    /// Underlying repository failure. The transaction rolled back; the call
    /// took no effect and is safe to retry.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// FIFO allocation service over the batch store and allocation ledger.
pub struct AllocationService<'a> {
    pool: &'a PgPool,
}

impl<'a> AllocationService<'a> {
    /// Create a new allocation service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocate `requested` units of a product to an order, oldest batches
    /// first.
    ///
    /// On insufficient stock the available units are still allocated and the
    /// outcome reports `success = false`; nothing is rolled back. Zero open
    /// batches is an expected out-of-stock outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError::InvalidQuantity` for `requested <= 0`,
    /// `ProductNotFound`/`OrderNotFound` for unknown ids (all rejected before
    /// any mutation), `AlreadyAllocated` if the order's guard flag was
    /// already consumed, and `Repository` for database failures.
    pub async fn allocate(
        &self,
        product_id: ProductId,
        order_id: OrderId,
        requested: i32,
    ) -> Result<AllocationOutcome, AllocationError> {
        if requested <= 0 {
            return Err(AllocationError::InvalidQuantity(requested));
        }
        if ProductRepository::new(self.pool)
            .get(product_id)
            .await?
            .is_none()
        {
            return Err(AllocationError::ProductNotFound(product_id));
        }
        if OrderRepository::new(self.pool).get(order_id).await?.is_none() {
            return Err(AllocationError::OrderNotFound(order_id));
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;

        if !db::orders::try_mark_allocated(&mut tx, order_id).await? {
            return Err(AllocationError::AlreadyAllocated(order_id));
        }

        let outcome = Self::allocate_line(&mut tx, product_id, order_id, requested).await?;
        db::orders::set_provisional_cost(&mut tx, order_id, outcome.total_cost).await?;

        tx.commit().await.map_err(RepositoryError::Database)?;

        if outcome.success {
            info!(
                %order_id,
                %product_id,
                quantity = outcome.allocated_quantity,
                cost = %outcome.total_cost,
                "Allocated order"
            );
        } else {
            warn!(
                %order_id,
                %product_id,
                "Could not fully allocate {} of {} units",
                outcome.allocated_quantity,
                requested
            );
        }

        Ok(outcome)
    }

    /// Resolve an order's free-text description and allocate every resolved
    /// line in one transaction.
    ///
    /// The resolver runs strictly before the transaction opens. A description
    /// that resolves to nothing leaves the order unallocated (the guard flag
    /// is not consumed) and returns an empty, unsuccessful outcome.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError::OrderNotFound` for an unknown order,
    /// `AlreadyAllocated` if the guard flag was already consumed, and
    /// `Repository` for database failures.
    pub async fn allocate_order<R>(
        &self,
        order_id: OrderId,
        resolver: &R,
    ) -> Result<AllocationOutcome, AllocationError>
    where
        R: ProductResolver + ?Sized,
    {
        let order = OrderRepository::new(self.pool)
            .get(order_id)
            .await?
            .ok_or(AllocationError::OrderNotFound(order_id))?;
        if order.allocated {
            return Err(AllocationError::AlreadyAllocated(order_id));
        }

        let lines = resolver.resolve(&order.description).await?;
        if lines.is_empty() {
            warn!(%order_id, description = %order.description, "No catalog match; order left unallocated");
            return Ok(AllocationOutcome::empty());
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;

        if !db::orders::try_mark_allocated(&mut tx, order_id).await? {
            return Err(AllocationError::AlreadyAllocated(order_id));
        }

        let mut total = AllocationOutcome {
            allocated_quantity: 0,
            total_cost: rust_decimal::Decimal::ZERO,
            success: true,
        };
        let mut requested_total = 0;
        for line in &lines {
            if line.quantity <= 0 {
                warn!(%order_id, product_id = %line.product_id, quantity = line.quantity, "Skipping resolved line with non-positive quantity");
                continue;
            }
            requested_total += line.quantity;
            let outcome =
                Self::allocate_line(&mut tx, line.product_id, order_id, line.quantity).await?;
            total.allocated_quantity += outcome.allocated_quantity;
            total.total_cost += outcome.total_cost;
            total.success &= outcome.success;
        }
        db::orders::set_provisional_cost(&mut tx, order_id, total.total_cost).await?;

        tx.commit().await.map_err(RepositoryError::Database)?;

        if !total.success {
            warn!(
                %order_id,
                "Could not fully allocate {} of {requested_total} units",
                total.allocated_quantity
            );
        }

        Ok(total)
    }

    /// Walk the product's open batches inside the caller's transaction and
    /// apply the FIFO plan: decrement batches, append ledger entries, and
    /// deduct the allocated (not requested) quantity from the cached stock.
    async fn allocate_line(
        tx: &mut Transaction<'_, Postgres>,
        product_id: ProductId,
        order_id: OrderId,
        requested: i32,
    ) -> Result<AllocationOutcome, AllocationError> {
        let batches = db::inventory_batches::lock_open_layers(tx, product_id).await?;
        let layers: Vec<BatchLayer> = batches.iter().map(BatchLayer::from).collect();
        let plan = plan_allocation(&layers, requested);

        for take in &plan.takes {
            db::inventory_batches::take_from_batch(tx, take.batch_id, take.quantity).await?;
            db::allocations::insert_line_item(
                tx,
                order_id,
                product_id,
                take.batch_id,
                take.quantity,
                take.unit_cost,
            )
            .await?;
        }
        if plan.allocated_quantity > 0 {
            db::products::adjust_stock(tx, product_id, -plan.allocated_quantity).await?;
        }

        Ok(AllocationOutcome {
            allocated_quantity: plan.allocated_quantity,
            total_cost: plan.total_cost,
            success: plan.fully_allocates(requested),
        })
    }

    // =========================================================================
    // Reversal
    // =========================================================================

    /// Undo an order's allocation: restore quantities to the exact batches
    /// recorded in the ledger, credit the cached stock, delete the ledger
    /// entries, and clear the guard flag.
    ///
    /// An order with no ledger entries is a no-op success ("nothing to
    /// reverse"). Reversing immediately after allocating returns every
    /// touched batch and the product's cached stock to their pre-allocation
    /// values.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError::OrderNotFound` for an unknown order, and
    /// `Repository` for database failures (fully rolled back).
    pub async fn reverse(&self, order_id: OrderId) -> Result<bool, AllocationError> {
        if OrderRepository::new(self.pool).get(order_id).await?.is_none() {
            return Err(AllocationError::OrderNotFound(order_id));
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;

        let items = db::allocations::list_for_order(&mut tx, order_id).await?;
        Self::restore_quantities(&mut tx, order_id, &items).await?;
        db::allocations::delete_for_order(&mut tx, order_id).await?;
        db::orders::clear_allocation(&mut tx, order_id).await?;

        tx.commit().await.map_err(RepositoryError::Database)?;

        info!(%order_id, line_items = items.len(), "Reversed order allocation");
        Ok(true)
    }

    // =========================================================================
    // Return toggling
    // =========================================================================

    /// Toggle whether an order's items physically came back.
    ///
    /// `received = true` restores the ledger quantities to the exact batches
    /// they came from; `false` re-removes them from those same batches (not a
    /// fresh FIFO draw, so the cost layers stay intact). The ledger and the
    /// allocate-once flag are preserved either way - the cost history must
    /// survive for reporting. Toggling to the current state is a no-op;
    /// toggling twice returns every batch to its starting quantity.
    ///
    /// Returns `false` if the order disappeared while toggling (the flag
    /// write persisted nothing, so no stock change was committed either).
    ///
    /// # Errors
    ///
    /// Returns `AllocationError::OrderNotFound` for an unknown order, and
    /// `Repository` for database failures.
    pub async fn set_return_received(
        &self,
        order_id: OrderId,
        received: bool,
    ) -> Result<bool, AllocationError> {
        let order = OrderRepository::new(self.pool)
            .get(order_id)
            .await?
            .ok_or(AllocationError::OrderNotFound(order_id))?;
        if order.return_received == received {
            return Ok(true);
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;

        let items = db::allocations::list_for_order(&mut tx, order_id).await?;
        if received {
            Self::restore_quantities(&mut tx, order_id, &items).await?;
        } else {
            Self::remove_quantities(&mut tx, order_id, &items).await?;
        }

        if !db::orders::set_return_received(&mut tx, order_id, received).await? {
            // Flag write hit nothing; drop the transaction so the stock
            // mutations never commit.
            warn!(%order_id, "Order vanished during return toggle");
            return Ok(false);
        }

        tx.commit().await.map_err(RepositoryError::Database)?;

        info!(%order_id, received, "Toggled return-received");
        Ok(true)
    }

    /// Restore ledger quantities to their batches (clamped at each batch's
    /// received quantity) and credit the cached stock. Missing rows are
    /// logged and skipped so one lost batch never aborts the operation.
    async fn restore_quantities(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        items: &[AllocationLineItem],
    ) -> Result<(), AllocationError> {
        for (batch_id, quantity) in sum_by_batch(items) {
            if !db::inventory_batches::restore_to_batch(tx, batch_id, quantity).await? {
                warn!(%order_id, %batch_id, quantity, "Batch missing during restore; skipping");
            }
        }
        for (product_id, quantity) in sum_by_product(items) {
            if !db::products::adjust_stock(tx, product_id, quantity).await? {
                warn!(%order_id, %product_id, quantity, "Product missing during restore; skipping");
            }
        }
        Ok(())
    }

    /// Re-remove ledger quantities from their batches (clamped at zero) and
    /// deduct the cached stock. Missing rows are logged and skipped.
    async fn remove_quantities(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        items: &[AllocationLineItem],
    ) -> Result<(), AllocationError> {
        for (batch_id, quantity) in sum_by_batch(items) {
            if !db::inventory_batches::remove_from_batch(tx, batch_id, quantity).await? {
                warn!(%order_id, %batch_id, quantity, "Batch missing during re-removal; skipping");
            }
        }
        for (product_id, quantity) in sum_by_product(items) {
            if !db::products::adjust_stock(tx, product_id, -quantity).await? {
                warn!(%order_id, %product_id, quantity, "Product missing during re-removal; skipping");
            }
        }
        Ok(())
    }

    // =========================================================================
    // Cost finalization
    // =========================================================================

    /// Transition an order to delivered, freezing its recorded cost on the
    /// first such transition.
    ///
    /// The provisional cost is copied into the final cost exactly once;
    /// later re-deliveries, catalog price edits, or new batches never touch
    /// the frozen value.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError::OrderNotFound` for an unknown order, and
    /// `Repository` for database failures.
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<(), AllocationError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;

        if !db::orders::set_status(&mut tx, order_id, OrderStatus::Delivered).await? {
            return Err(AllocationError::OrderNotFound(order_id));
        }
        let frozen = db::orders::finalize_cost(&mut tx, order_id).await?;

        tx.commit().await.map_err(RepositoryError::Database)?;

        info!(%order_id, cost_frozen = frozen, "Order delivered");
        Ok(())
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Delete an order, restoring stock first when the order still holds it.
    ///
    /// Stock is restored only when the order is allocated and NOT already
    /// return-received: a received return was restored through the toggle
    /// path, and restoring again would double-credit the batches. The ledger
    /// rows go away with the order either way.
    ///
    /// Returns `false` if the order didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError::Repository` for database failures; the
    /// order and its stock are then untouched.
    pub async fn delete_order(&self, order_id: OrderId) -> Result<bool, AllocationError> {
        let Some(order) = OrderRepository::new(self.pool).get(order_id).await? else {
            return Ok(false);
        };

        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;

        if order.allocated && !order.return_received {
            let items = db::allocations::list_for_order(&mut tx, order_id).await?;
            Self::restore_quantities(&mut tx, order_id, &items).await?;
        }
        db::allocations::delete_for_order(&mut tx, order_id).await?;
        let deleted = db::orders::delete(&mut tx, order_id).await?;

        tx.commit().await.map_err(RepositoryError::Database)?;

        if deleted {
            info!(%order_id, "Deleted order");
        }
        Ok(deleted)
    }

    /// Delete several orders, one transaction each.
    ///
    /// A failure on one order never rolls back or blocks the others; the
    /// report carries success/failure counts and one message per failure.
    pub async fn bulk_delete(&self, order_ids: &[OrderId]) -> BulkDeleteReport {
        let mut report = BulkDeleteReport::default();

        for &order_id in order_ids {
            match self.delete_order(order_id).await {
                Ok(true) => report.succeeded += 1,
                Ok(false) => {
                    report.failed += 1;
                    report.errors.push(format!("order {order_id}: not found"));
                }
                Err(e) => {
                    warn!(%order_id, error = %e, "Inventory restore failed during bulk delete");
                    report.failed += 1;
                    report.errors.push(format!("order {order_id}: {e}"));
                }
            }
        }

        report
    }

    /// Line items recorded for an order, for display and debugging.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError::Repository` if the query fails.
    pub async fn line_items(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<AllocationLineItem>, AllocationError> {
        Ok(AllocationRepository::new(self.pool)
            .list_for_order(order_id)
            .await?)
    }
}
