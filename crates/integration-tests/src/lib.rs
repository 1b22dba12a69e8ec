//! Integration tests for ParcelDesk.
//!
//! These tests exercise the FIFO allocation logic and order lifecycle
//! behavior across crate boundaries without requiring a live database: the
//! planner and its reversal grouping are pure, so the conservation and
//! idempotence properties are checked directly against them.
//!
//! # Test Categories
//!
//! - `fifo_allocation` - FIFO ordering, partial fulfillment, conservation
//! - `order_lifecycle` - Status transitions and outcome reporting

use chrono::Utc;
use rust_decimal::Decimal;

use parceldesk_admin::models::allocation::AllocationLineItem;
use parceldesk_admin::services::allocation::{BatchLayer, FifoPlan};
use parceldesk_core::{AllocationLineItemId, InventoryBatchId, OrderId, ProductId};

/// A batch as the tests track it: fixed capacity, mutable remaining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeBatch {
    pub id: InventoryBatchId,
    pub quantity_received: i32,
    pub remaining_quantity: i32,
    pub unit_cost: Decimal,
}

impl FakeBatch {
    #[must_use]
    pub fn new(id: i32, quantity: i32, unit_cost: i64) -> Self {
        Self {
            id: InventoryBatchId::new(id),
            quantity_received: quantity,
            remaining_quantity: quantity,
            unit_cost: Decimal::from(unit_cost),
        }
    }

    #[must_use]
    pub fn layer(&self) -> BatchLayer {
        BatchLayer {
            batch_id: self.id,
            remaining_quantity: self.remaining_quantity,
            unit_cost: self.unit_cost,
        }
    }
}

/// Apply a plan's takes to the fake batch store, mirroring what the
/// allocation transaction does to the real rows.
pub fn apply_plan(batches: &mut [FakeBatch], plan: &FifoPlan) {
    for take in &plan.takes {
        if let Some(batch) = batches.iter_mut().find(|b| b.id == take.batch_id) {
            batch.remaining_quantity -= take.quantity;
        }
    }
}

/// Restore grouped quantities, clamped at each batch's received quantity,
/// mirroring the reversal/return path.
pub fn apply_restore(batches: &mut [FakeBatch], grouped: &[(InventoryBatchId, i32)]) {
    for (batch_id, quantity) in grouped {
        if let Some(batch) = batches.iter_mut().find(|b| b.id == *batch_id) {
            batch.remaining_quantity =
                (batch.remaining_quantity + quantity).min(batch.quantity_received);
        }
    }
}

/// Re-remove grouped quantities, clamped at zero, mirroring the return
/// un-received path.
pub fn apply_remove(batches: &mut [FakeBatch], grouped: &[(InventoryBatchId, i32)]) {
    for (batch_id, quantity) in grouped {
        if let Some(batch) = batches.iter_mut().find(|b| b.id == *batch_id) {
            batch.remaining_quantity = (batch.remaining_quantity - quantity).max(0);
        }
    }
}

/// Turn a plan into the ledger entries the allocation transaction would
/// write for it.
#[must_use]
pub fn ledger_for_plan(order_id: i32, product_id: i32, plan: &FifoPlan) -> Vec<AllocationLineItem> {
    plan.takes
        .iter()
        .enumerate()
        .map(|(i, take)| AllocationLineItem {
            id: AllocationLineItemId::new(i32::try_from(i).unwrap_or(i32::MAX)),
            order_id: OrderId::new(order_id),
            product_id: ProductId::new(product_id),
            batch_id: take.batch_id,
            quantity: take.quantity,
            unit_cost: take.unit_cost,
            allocated_at: Utc::now(),
        })
        .collect()
}
