//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use parceldesk_core::ProductId;

use crate::db::{BatchRepository, ProductRepository};
use crate::error::AppError;
use crate::models::inventory_batch::InventoryBatch;
use crate::models::product::{CreateProductInput, Product};
use crate::state::AppState;

/// Response for the stock reconciliation routine.
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    /// Product whose cache was recomputed.
    pub product_id: ProductId,
    /// The recomputed stock value.
    pub current_stock: i32,
}

/// Create a product.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("product name is required".to_string()));
    }
    if input.default_unit_cost.is_sign_negative() {
        return Err(AppError::BadRequest(
            "default unit cost must not be negative".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool()).create(&input).await?;
    tracing::info!(product_id = %product.id, name = %product.name, "Created product");
    Ok((StatusCode::CREATED, Json(product)))
}

/// List all products.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// List a product's batches in FIFO order, for display.
#[instrument(skip(state))]
pub async fn batches(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<InventoryBatch>>, AppError> {
    let product_id = ProductId::new(id);
    if ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!("product {product_id}")));
    }

    let batches = BatchRepository::new(state.pool())
        .list_for_product(product_id)
        .await?;
    Ok(Json(batches))
}

/// Recompute a product's cached stock from its batches (drift recovery).
#[instrument(skip(state))]
pub async fn reconcile(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ReconcileResponse>, AppError> {
    let product_id = ProductId::new(id);
    let current_stock = ProductRepository::new(state.pool())
        .reconcile_stock(product_id)
        .await?;

    tracing::info!(%product_id, current_stock, "Reconciled cached stock");
    Ok(Json(ReconcileResponse {
        product_id,
        current_stock,
    }))
}
