//! Cart endpoints. All require authentication; the cart belongs to the
//! calling user.

use axum::Json;
use axum::extract::{Path, State};
use common::{CartItemId, ProductId};
use domain::{CartView, CommerceStore, Principal, Size};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct AddLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Size,
}

#[derive(Deserialize)]
pub struct UpdateLineRequest {
    /// Zero or negative removes the line.
    pub quantity: i64,
}

fn cart_body(cart: CartView) -> serde_json::Value {
    serde_json::json!({ "success": true, "cart": cart })
}

/// GET /cart — the populated cart, or the empty shape.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cart = state.carts.get(principal.user_id).await?;
    Ok(Json(cart_body(cart)))
}

/// POST /cart — add a (product, size, quantity) line.
#[tracing::instrument(skip(state, req))]
pub async fn add<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(req): Json<AddLineRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cart = state
        .carts
        .add_line(principal.user_id, req.product_id, req.quantity, req.size)
        .await?;
    Ok(Json(cart_body(cart)))
}

/// PUT /cart/{item_id} — set a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Path(item_id): Path<CartItemId>,
    Json(req): Json<UpdateLineRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cart = state
        .carts
        .update_line(principal.user_id, item_id, req.quantity)
        .await?;
    Ok(Json(cart_body(cart)))
}

/// DELETE /cart/{item_id} — remove one line.
#[tracing::instrument(skip(state))]
pub async fn remove<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cart = state.carts.remove_line(principal.user_id, item_id).await?;
    Ok(Json(cart_body(cart)))
}

/// DELETE /cart — clear the whole cart. Idempotent.
#[tracing::instrument(skip(state))]
pub async fn clear<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.carts.clear(principal.user_id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "message": "Cart cleared." }),
    ))
}
