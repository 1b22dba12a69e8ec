//! Product domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parceldesk_core::ProductId;

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Canonical name (unique, case-insensitive).
    pub name: String,
    /// Cached total remaining across this product's batches.
    ///
    /// Maintained in lockstep with batch writes; allocation decisions always
    /// derive from the batch rows themselves, never from this cache.
    pub current_stock: i32,
    /// Fallback unit cost used only when no batch exists.
    pub default_unit_cost: Decimal,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    /// Canonical name.
    pub name: String,
    /// Fallback unit cost.
    pub default_unit_cost: Decimal,
}

/// Per-product inventory aggregate for dashboard tiles.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCostSummary {
    /// Product ID.
    pub product_id: ProductId,
    /// Canonical product name.
    pub name: String,
    /// Total remaining quantity across all batches.
    pub remaining_total: i64,
    /// Number of batches with remaining quantity > 0.
    pub active_batch_count: i64,
    /// Remaining-quantity-weighted average unit cost. `None` when no stock
    /// remains.
    pub weighted_avg_cost: Option<Decimal>,
}
