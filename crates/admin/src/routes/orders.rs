//! Order route handlers: lifecycle, allocation, returns, bulk actions.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use parceldesk_core::{OrderId, ProductId};

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::models::allocation::{AllocationLineItem, AllocationOutcome};
use crate::models::order::{BulkDeleteReport, CreateOrderInput, Order, SweepReport};
use crate::state::AppState;

/// Query parameters for the order list.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for explicit allocation. When `product_id`/`quantity` are
/// omitted the order's description is resolved instead.
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
}

/// Request body for the return-received toggle.
#[derive(Debug, Deserialize)]
pub struct ToggleReturnRequest {
    pub received: bool,
}

/// Request body for bulk deletion.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub order_ids: Vec<i32>,
}

/// Response carrying an order plus its allocation outcome.
#[derive(Debug, Serialize)]
pub struct OrderWithAllocation {
    pub order: Order,
    pub allocated_quantity: i32,
    pub total_cost: Decimal,
    pub success: bool,
    /// Present when the allocation was partial or found no match.
    pub warning: Option<String>,
}

/// Response for the sweep status probe.
#[derive(Debug, Serialize)]
pub struct SweepStatusResponse {
    pub in_progress: bool,
}

fn allocation_warning(outcome: &AllocationOutcome) -> Option<String> {
    if outcome.success {
        None
    } else if outcome.allocated_quantity == 0 {
        Some("no stock allocated".to_string())
    } else {
        Some(format!(
            "partially allocated ({} units)",
            outcome.allocated_quantity
        ))
    }
}

/// Create an order and run FIFO allocation from its description.
///
/// A description with no catalog match leaves the order unallocated; the
/// response carries a warning instead of failing.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> Result<(StatusCode, Json<OrderWithAllocation>), AppError> {
    if input.description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "order description is required".to_string(),
        ));
    }

    let orders = OrderRepository::new(state.pool());
    let order = orders.create(&input).await?;

    let outcome = state
        .allocation()
        .allocate_order(order.id, &state.resolver())
        .await?;

    // Refetch so the response reflects the allocation flag and cost.
    let order = orders
        .get(order.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {}", order.id)))?;

    let warning = allocation_warning(&outcome);
    Ok((
        StatusCode::CREATED,
        Json(OrderWithAllocation {
            order,
            allocated_quantity: outcome.allocated_quantity,
            total_cost: outcome.total_cost,
            success: outcome.success,
            warning,
        }),
    ))
}

/// List orders, newest first.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);

    let orders = OrderRepository::new(state.pool()).list(limit, offset).await?;
    Ok(Json(orders))
}

/// Get an order by ID.
#[instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Order>, AppError> {
    let order_id = OrderId::new(id);
    let order = OrderRepository::new(state.pool())
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
    Ok(Json(order))
}

/// Get an order's allocation ledger entries, for display and debugging.
#[instrument(skip(state))]
pub async fn line_items(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AllocationLineItem>>, AppError> {
    let order_id = OrderId::new(id);
    if OrderRepository::new(state.pool()).get(order_id).await?.is_none() {
        return Err(AppError::NotFound(format!("order {order_id}")));
    }

    let items = state.allocation().line_items(order_id).await?;
    Ok(Json(items))
}

/// Allocate stock to an existing order.
///
/// With a `product_id` and `quantity` in the body the allocation is direct;
/// otherwise the order's description is resolved against the catalog.
#[instrument(skip(state))]
pub async fn allocate(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AllocateRequest>,
) -> Result<Json<OrderWithAllocation>, AppError> {
    let order_id = OrderId::new(id);

    let outcome = match (request.product_id, request.quantity) {
        (Some(product_id), Some(quantity)) => {
            state
                .allocation()
                .allocate(product_id, order_id, quantity)
                .await?
        }
        (None, None) => {
            state
                .allocation()
                .allocate_order(order_id, &state.resolver())
                .await?
        }
        _ => {
            return Err(AppError::BadRequest(
                "provide both product_id and quantity, or neither".to_string(),
            ));
        }
    };

    let order = OrderRepository::new(state.pool())
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    let warning = allocation_warning(&outcome);
    Ok(Json(OrderWithAllocation {
        order,
        allocated_quantity: outcome.allocated_quantity,
        total_cost: outcome.total_cost,
        success: outcome.success,
        warning,
    }))
}

/// Reverse an order's allocation without deleting it: stock returns to the
/// exact batches it came from, the ledger is cleared, and the order can be
/// allocated again.
#[instrument(skip(state))]
pub async fn reverse(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Order>, AppError> {
    let order_id = OrderId::new(id);
    state.allocation().reverse(order_id).await?;

    let order = OrderRepository::new(state.pool())
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
    Ok(Json(order))
}

/// Mark an order delivered, freezing its recorded cost on the first call.
#[instrument(skip(state))]
pub async fn deliver(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Order>, AppError> {
    let order_id = OrderId::new(id);
    state.allocation().mark_delivered(order_id).await?;

    let order = OrderRepository::new(state.pool())
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
    Ok(Json(order))
}

/// Toggle whether an order's items physically came back.
#[instrument(skip(state))]
pub async fn toggle_return(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ToggleReturnRequest>,
) -> Result<Json<Order>, AppError> {
    let order_id = OrderId::new(id);
    let persisted = state
        .allocation()
        .set_return_received(order_id, request.received)
        .await?;
    if !persisted {
        return Err(AppError::Internal(format!(
            "inventory restore failed for order {order_id}"
        )));
    }

    let order = OrderRepository::new(state.pool())
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
    Ok(Json(order))
}

/// Delete an order, restoring stock first when the order still holds it.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let order_id = OrderId::new(id);
    if state.allocation().delete_order(order_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("order {order_id}")))
    }
}

/// Delete several orders, one transaction each; failures are reported
/// per-order and never block the rest.
#[instrument(skip(state, request))]
pub async fn bulk_delete(
    State(state): State<AppState>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<(StatusCode, Json<BulkDeleteReport>), AppError> {
    if request.order_ids.is_empty() {
        return Err(AppError::BadRequest("no orders specified".to_string()));
    }

    let order_ids: Vec<OrderId> = request.order_ids.iter().copied().map(OrderId::new).collect();
    let report = state.allocation().bulk_delete(&order_ids).await;

    let status = if report.failed == 0 {
        StatusCode::OK
    } else {
        tracing::warn!(
            succeeded = report.succeeded,
            failed = report.failed,
            "Bulk delete completed with errors"
        );
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(report)))
}

/// Run a status-refresh sweep against the carrier tracking API.
#[instrument(skip(state))]
pub async fn sweep(State(state): State<AppState>) -> Result<Json<SweepReport>, AppError> {
    let Some(tracking) = state.tracking() else {
        return Err(AppError::Unavailable(
            "carrier tracking is not configured".to_string(),
        ));
    };

    let report = state.sweep().run(tracking).await?;
    Ok(Json(report))
}

/// Whether a sweep is currently running.
#[instrument(skip(state))]
pub async fn sweep_status(State(state): State<AppState>) -> Json<SweepStatusResponse> {
    Json(SweepStatusResponse {
        in_progress: state.sweep().is_in_progress(),
    })
}
