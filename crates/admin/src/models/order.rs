//! Order domain models.
//!
//! Only the fields the inventory core touches live here, plus the routine
//! tracking fields the dashboard displays. The cost fields form a small
//! state machine: unallocated (both empty) -> provisional (allocation ran)
//! -> finalized (first delivered transition copies provisional into final,
//! exactly once).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parceldesk_core::{OrderId, OrderStatus};

/// An order for one parcel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Free-text product description as entered.
    pub description: String,
    /// Carrier tracking number, once known.
    pub tracking_number: Option<String>,
    /// Fulfillment status.
    pub status: OrderStatus,
    /// Whether FIFO allocation has run for this order.
    pub allocated: bool,
    /// Whether the items physically came back through the return path.
    pub return_received: bool,
    /// Cost computed at allocation time; cleared on reversal.
    pub provisional_cost: Option<Decimal>,
    /// Cost frozen on the first delivered transition. Never recalculated.
    pub final_cost: Option<Decimal>,
    /// Sale price charged to the customer.
    pub sale_price: Option<Decimal>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    /// Free-text product description.
    pub description: String,
    /// Carrier tracking number, if already known.
    pub tracking_number: Option<String>,
    /// Sale price charged to the customer.
    pub sale_price: Option<Decimal>,
}

/// Aggregate result of a bulk order deletion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkDeleteReport {
    /// Orders fully reversed and deleted.
    pub succeeded: u32,
    /// Orders whose deletion failed; the rest are unaffected.
    pub failed: u32,
    /// One message per failed order.
    pub errors: Vec<String>,
}

/// Aggregate result of a status-refresh sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Orders whose tracking status was checked.
    pub checked: u32,
    /// Orders transitioned to delivered (cost finalized).
    pub updated: u32,
    /// Orders whose check or update failed.
    pub failed: u32,
}
