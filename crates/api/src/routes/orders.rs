//! Order lifecycle endpoints: checkout, history, cancellation, and the
//! admin listing and status transitions.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::storage::OrderFilter;
use domain::{CommerceStore, OrderStatus, PlaceOrder, Principal, UpdateStatus};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

/// Query string for the admin listing, GET /orders.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<OrderStatus>,
    pub is_bulk: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// POST /orders — convert the caller's cart into an order.
#[tracing::instrument(skip(state, req))]
pub async fn place<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(req): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let placed = state.orders.place_order(principal.user_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": placed.message,
            "order": placed.order,
        })),
    ))
}

/// GET /orders/my-orders — the caller's order history, newest first.
#[tracing::instrument(skip(state))]
pub async fn my_orders<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
) -> Result<Json<serde_json::Value>, ApiError> {
    let orders = state.orders.my_orders(principal.user_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "count": orders.len(),
        "orders": orders,
    })))
}

/// GET /orders/{id} — one order; owners see their own, admins see any.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order = state.orders.get_order(principal, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "order": order })))
}

/// GET /orders — admin listing with status / bulk filters.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = OrderFilter {
        status: params.status,
        is_bulk: params.is_bulk,
        page: params.page.unwrap_or(0),
        limit: params.limit.unwrap_or(0),
    };
    let page = state.orders.list_orders(principal, filter).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "orders": page.orders,
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
    })))
}

/// PUT /orders/{id}/status — admin status transition. Confirming a bulk
/// order triggers the deferred stock deduction.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatus>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order = state.orders.update_status(principal, id, req).await?;
    Ok(Json(serde_json::json!({ "success": true, "order": order })))
}

/// PUT /orders/{id}/cancel — owner-only cancellation.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order = state.orders.cancel(principal, id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Order cancelled.",
        "order": order,
    })))
}
