//! Inventory route handlers: stock receipts and dashboard aggregates.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::db::{BatchRepository, ProductRepository};
use crate::error::AppError;
use crate::models::inventory_batch::{CreateBatchInput, InventoryBatch};
use crate::models::product::ProductCostSummary;
use crate::state::AppState;

/// Record a stock receipt as a new FIFO batch.
#[instrument(skip(state, input))]
pub async fn create_batch(
    State(state): State<AppState>,
    Json(input): Json<CreateBatchInput>,
) -> Result<(StatusCode, Json<InventoryBatch>), AppError> {
    if input.quantity_received <= 0 {
        return Err(AppError::BadRequest(
            "quantity received must be positive".to_string(),
        ));
    }
    if input.unit_cost.is_sign_negative() {
        return Err(AppError::BadRequest(
            "unit cost must not be negative".to_string(),
        ));
    }

    let batch = BatchRepository::new(state.pool()).create_batch(&input).await?;
    tracing::info!(
        batch_id = %batch.id,
        product_id = %batch.product_id,
        quantity = batch.quantity_received,
        unit_cost = %batch.unit_cost,
        "Received stock batch"
    );
    Ok((StatusCode::CREATED, Json(batch)))
}

/// Per-product cost summary for dashboard tiles: remaining total, active
/// batch count, weighted average cost.
#[instrument(skip(state))]
pub async fn cost_summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductCostSummary>>, AppError> {
    let summary = ProductRepository::new(state.pool()).cost_summary().await?;
    Ok(Json(summary))
}
