//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness check (DB ping)
//!
//! # Products
//! POST   /products                - Create product
//! GET    /products                - Product listing
//! GET    /products/{id}/batches   - Product's batches in FIFO order
//! POST   /products/{id}/reconcile - Recompute cached stock from batches
//!
//! # Inventory
//! POST   /batches                 - Record a stock receipt (new FIFO batch)
//! GET    /inventory/cost-summary  - Per-product cost aggregates
//!
//! # Orders
//! POST   /orders                  - Create order + FIFO-allocate from description
//! GET    /orders                  - Order listing
//! GET    /orders/{id}             - Order detail
//! GET    /orders/{id}/line-items  - Order's allocation ledger entries
//! POST   /orders/{id}/allocate    - Allocate (direct or via resolver)
//! POST   /orders/{id}/reverse     - Undo allocation, restore batches
//! POST   /orders/{id}/deliver     - Mark delivered, freeze recorded cost
//! POST   /orders/{id}/return      - Toggle return-received
//! DELETE /orders/{id}             - Delete (reverses allocation first)
//! POST   /orders/bulk-delete      - Delete many, isolated per order
//! POST   /orders/sweep            - Run carrier status sweep
//! GET    /orders/sweep            - Sweep in-progress probe
//! ```

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod inventory;
pub mod orders;
pub mod products;

/// Build the application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Products
        .route("/products", post(products::create).get(products::list))
        .route("/products/{id}/batches", get(products::batches))
        .route("/products/{id}/reconcile", post(products::reconcile))
        // Inventory
        .route("/batches", post(inventory::create_batch))
        .route("/inventory/cost-summary", get(inventory::cost_summary))
        // Orders
        .route("/orders", post(orders::create).get(orders::list))
        .route("/orders/bulk-delete", post(orders::bulk_delete))
        .route("/orders/sweep", post(orders::sweep).get(orders::sweep_status))
        .route("/orders/{id}", get(orders::get).delete(orders::delete))
        .route("/orders/{id}/line-items", get(orders::line_items))
        .route("/orders/{id}/allocate", post(orders::allocate))
        .route("/orders/{id}/reverse", post(orders::reverse))
        .route("/orders/{id}/deliver", post(orders::deliver))
        .route("/orders/{id}/return", post(orders::toggle_return))
}
