//! Inventory batch domain models.
//!
//! A batch is one stock-receipt event at a fixed unit cost, forming one FIFO
//! cost layer. `received_at` defines consumption order, ties broken by
//! ascending id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parceldesk_core::{InventoryBatchId, ProductId};

/// An inventory batch - units received into stock at one unit cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryBatch {
    /// Unique batch ID.
    pub id: InventoryBatchId,
    /// Product this batch belongs to.
    pub product_id: ProductId,
    /// Number of units received. Immutable after creation.
    pub quantity_received: i32,
    /// Units not yet consumed by allocations.
    ///
    /// Invariant: `0 <= remaining_quantity <= quantity_received`.
    pub remaining_quantity: i32,
    /// Cost per unit for this FIFO layer. Immutable after creation.
    pub unit_cost: Decimal,
    /// When the stock was received; defines FIFO order.
    pub received_at: DateTime<Utc>,
    /// Optional free-text reference (supplier invoice, seeding note).
    pub reference: Option<String>,
    /// When the batch row was created.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a stock receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBatchInput {
    /// Product receiving stock.
    pub product_id: ProductId,
    /// Number of units received.
    pub quantity_received: i32,
    /// Cost per unit.
    pub unit_cost: Decimal,
    /// Receipt time; defaults to now when omitted.
    pub received_at: Option<DateTime<Utc>>,
    /// Optional free-text reference.
    pub reference: Option<String>,
}
