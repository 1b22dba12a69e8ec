//! Allocation ledger domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parceldesk_core::{AllocationLineItemId, InventoryBatchId, OrderId, ProductId};

/// One ledger entry: "order X consumed Y units of product P from batch B at
/// cost C per unit."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationLineItem {
    /// Unique line item ID.
    pub id: AllocationLineItemId,
    /// Order the units were allocated to.
    pub order_id: OrderId,
    /// Product allocated.
    pub product_id: ProductId,
    /// Batch the units were drawn from.
    pub batch_id: InventoryBatchId,
    /// Units drawn from this batch (summed per batch).
    pub quantity: i32,
    /// Unit cost frozen at allocation time.
    pub unit_cost: Decimal,
    /// When the allocation was made.
    pub allocated_at: DateTime<Utc>,
}

/// Result of a FIFO allocation call.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationOutcome {
    /// Units actually allocated (may be less than requested).
    pub allocated_quantity: i32,
    /// Total cost of the allocated units.
    pub total_cost: Decimal,
    /// Whether the full requested quantity was allocated.
    pub success: bool,
}

impl AllocationOutcome {
    /// An outcome for a request that found nothing to allocate.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            allocated_quantity: 0,
            total_cost: Decimal::ZERO,
            success: false,
        }
    }
}
