//! Pure FIFO planning: which batches satisfy a request, and the grouping
//! used to undo it.
//!
//! Keeping the walk free of I/O means the allocation service can compute a
//! plan against row-locked batches and apply it verbatim, and the FIFO
//! properties can be tested without a database.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use parceldesk_core::{InventoryBatchId, ProductId};

use crate::models::allocation::AllocationLineItem;
use crate::models::inventory_batch::InventoryBatch;

/// One FIFO cost layer as seen by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLayer {
    /// Batch providing this layer.
    pub batch_id: InventoryBatchId,
    /// Units still available in this layer.
    pub remaining_quantity: i32,
    /// Cost per unit for this layer.
    pub unit_cost: Decimal,
}

impl From<&InventoryBatch> for BatchLayer {
    fn from(batch: &InventoryBatch) -> Self {
        Self {
            batch_id: batch.id,
            remaining_quantity: batch.remaining_quantity,
            unit_cost: batch.unit_cost,
        }
    }
}

/// One planned draw against a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTake {
    /// Batch to draw from.
    pub batch_id: InventoryBatchId,
    /// Units to take.
    pub quantity: i32,
    /// Unit cost frozen from the layer.
    pub unit_cost: Decimal,
}

/// The result of walking the layers for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FifoPlan {
    /// Draws in FIFO order, one per batch touched.
    pub takes: Vec<PlannedTake>,
    /// Total units the plan allocates (requested minus shortfall).
    pub allocated_quantity: i32,
    /// Sum of `quantity * unit_cost` over the takes.
    pub total_cost: Decimal,
}

impl FifoPlan {
    /// Whether the plan covers the full requested quantity.
    #[must_use]
    pub const fn fully_allocates(&self, requested: i32) -> bool {
        self.allocated_quantity == requested
    }
}

/// Walk `layers` oldest-first and plan draws until `requested` units are
/// covered or the layers are exhausted.
///
/// The caller provides layers already in FIFO order (`received_at` ascending,
/// ties by insertion order). Layers with nothing remaining are skipped.
/// A partial plan is returned as-is when stock is insufficient; the caller
/// decides whether partial fulfillment is acceptable.
#[must_use]
pub fn plan_allocation(layers: &[BatchLayer], requested: i32) -> FifoPlan {
    let mut takes = Vec::new();
    let mut total_cost = Decimal::ZERO;
    let mut still_needed = requested;

    for layer in layers {
        if still_needed <= 0 {
            break;
        }
        if layer.remaining_quantity <= 0 {
            continue;
        }

        let take = still_needed.min(layer.remaining_quantity);
        total_cost += layer.unit_cost * Decimal::from(take);
        takes.push(PlannedTake {
            batch_id: layer.batch_id,
            quantity: take,
            unit_cost: layer.unit_cost,
        });
        still_needed -= take;
    }

    FifoPlan {
        takes,
        allocated_quantity: requested - still_needed,
        total_cost,
    }
}

/// Sum an order's ledger quantities per batch.
///
/// An order may have drawn from the same batch through multiple line items;
/// reversal and return toggling restore one summed quantity per batch, to
/// the exact batches the units came from.
#[must_use]
pub fn sum_by_batch(items: &[AllocationLineItem]) -> Vec<(InventoryBatchId, i32)> {
    let mut totals: BTreeMap<i32, i32> = BTreeMap::new();
    for item in items {
        *totals.entry(item.batch_id.as_i32()).or_insert(0) += item.quantity;
    }
    totals
        .into_iter()
        .map(|(batch_id, quantity)| (InventoryBatchId::new(batch_id), quantity))
        .collect()
}

/// Sum an order's ledger quantities per product, for the cached
/// `current_stock` adjustments that accompany the batch restores.
#[must_use]
pub fn sum_by_product(items: &[AllocationLineItem]) -> Vec<(ProductId, i32)> {
    let mut totals: BTreeMap<i32, i32> = BTreeMap::new();
    for item in items {
        *totals.entry(item.product_id.as_i32()).or_insert(0) += item.quantity;
    }
    totals
        .into_iter()
        .map(|(product_id, quantity)| (ProductId::new(product_id), quantity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parceldesk_core::{AllocationLineItemId, OrderId};

    fn layer(id: i32, remaining: i32, cost: i64) -> BatchLayer {
        BatchLayer {
            batch_id: InventoryBatchId::new(id),
            remaining_quantity: remaining,
            unit_cost: Decimal::from(cost),
        }
    }

    fn line_item(batch_id: i32, product_id: i32, quantity: i32) -> AllocationLineItem {
        AllocationLineItem {
            id: AllocationLineItemId::new(0),
            order_id: OrderId::new(1),
            product_id: ProductId::new(product_id),
            batch_id: InventoryBatchId::new(batch_id),
            quantity,
            unit_cost: Decimal::from(10),
            allocated_at: Utc::now(),
        }
    }

    #[test]
    fn test_fifo_ordering_splits_across_layers() {
        // B1 (qty 5 @ 10) received before B2 (qty 5 @ 20); requesting 7
        // drains B1 and takes 2 from B2 at B2's cost.
        let layers = vec![layer(1, 5, 10), layer(2, 5, 20)];

        let plan = plan_allocation(&layers, 7);

        assert_eq!(plan.takes.len(), 2);
        assert_eq!(plan.takes[0].batch_id, InventoryBatchId::new(1));
        assert_eq!(plan.takes[0].quantity, 5);
        assert_eq!(plan.takes[0].unit_cost, Decimal::from(10));
        assert_eq!(plan.takes[1].batch_id, InventoryBatchId::new(2));
        assert_eq!(plan.takes[1].quantity, 2);
        assert_eq!(plan.takes[1].unit_cost, Decimal::from(20));
        assert_eq!(plan.allocated_quantity, 7);
        assert_eq!(plan.total_cost, Decimal::from(90));
        assert!(plan.fully_allocates(7));
    }

    #[test]
    fn test_partial_allocation_when_stock_insufficient() {
        let layers = vec![layer(1, 5, 10)];

        let plan = plan_allocation(&layers, 8);

        assert_eq!(plan.allocated_quantity, 5);
        assert_eq!(plan.total_cost, Decimal::from(50));
        assert!(!plan.fully_allocates(8));
        assert_eq!(plan.takes.len(), 1);
    }

    #[test]
    fn test_no_layers_yields_empty_plan() {
        let plan = plan_allocation(&[], 3);

        assert!(plan.takes.is_empty());
        assert_eq!(plan.allocated_quantity, 0);
        assert_eq!(plan.total_cost, Decimal::ZERO);
        assert!(!plan.fully_allocates(3));
    }

    #[test]
    fn test_exact_fit_consumes_single_layer() {
        let layers = vec![layer(1, 4, 25), layer(2, 9, 30)];

        let plan = plan_allocation(&layers, 4);

        assert_eq!(plan.takes.len(), 1);
        assert_eq!(plan.takes[0].quantity, 4);
        assert_eq!(plan.total_cost, Decimal::from(100));
        assert!(plan.fully_allocates(4));
    }

    #[test]
    fn test_exhausted_layers_are_skipped() {
        let layers = vec![layer(1, 0, 10), layer(2, 3, 20)];

        let plan = plan_allocation(&layers, 2);

        assert_eq!(plan.takes.len(), 1);
        assert_eq!(plan.takes[0].batch_id, InventoryBatchId::new(2));
        assert_eq!(plan.total_cost, Decimal::from(40));
    }

    #[test]
    fn test_fractional_unit_costs_accumulate_exactly() {
        let layers = vec![
            BatchLayer {
                batch_id: InventoryBatchId::new(1),
                remaining_quantity: 3,
                unit_cost: Decimal::new(1050, 2), // 10.50
            },
            BatchLayer {
                batch_id: InventoryBatchId::new(2),
                remaining_quantity: 3,
                unit_cost: Decimal::new(1295, 2), // 12.95
            },
        ];

        let plan = plan_allocation(&layers, 4);

        // 3 * 10.50 + 1 * 12.95 = 44.45
        assert_eq!(plan.total_cost, Decimal::new(4445, 2));
    }

    #[test]
    fn test_sum_by_batch_merges_repeat_draws() {
        let items = vec![
            line_item(5, 1, 2),
            line_item(3, 1, 1),
            line_item(5, 1, 4),
        ];

        let grouped = sum_by_batch(&items);

        assert_eq!(
            grouped,
            vec![
                (InventoryBatchId::new(3), 1),
                (InventoryBatchId::new(5), 6),
            ]
        );
    }

    #[test]
    fn test_sum_by_product_totals_across_batches() {
        let items = vec![
            line_item(1, 7, 2),
            line_item(2, 7, 3),
            line_item(3, 9, 1),
        ];

        let grouped = sum_by_product(&items);

        assert_eq!(
            grouped,
            vec![(ProductId::new(7), 5), (ProductId::new(9), 1)]
        );
    }

    #[test]
    fn test_plan_then_group_conserves_quantities() {
        // The grouping used for reversal must restore exactly what the plan
        // took from each batch.
        let layers = vec![layer(1, 5, 10), layer(2, 5, 20), layer(3, 5, 30)];
        let plan = plan_allocation(&layers, 12);

        let items: Vec<AllocationLineItem> = plan
            .takes
            .iter()
            .map(|take| AllocationLineItem {
                id: AllocationLineItemId::new(0),
                order_id: OrderId::new(1),
                product_id: ProductId::new(1),
                batch_id: take.batch_id,
                quantity: take.quantity,
                unit_cost: take.unit_cost,
                allocated_at: Utc::now(),
            })
            .collect();

        let restored = sum_by_batch(&items);
        let total_restored: i32 = restored.iter().map(|(_, q)| q).sum();

        assert_eq!(total_restored, plan.allocated_quantity);
        assert_eq!(
            restored,
            vec![
                (InventoryBatchId::new(1), 5),
                (InventoryBatchId::new(2), 5),
                (InventoryBatchId::new(3), 2),
            ]
        );
    }
}
