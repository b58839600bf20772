//! Catalog endpoints: public listing and admin CRUD.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Money, ProductId};
use domain::storage::{CatalogStore, ProductQuery, ProductSort};
use domain::{Category, CommerceStore, NewProduct, Principal, Product, ProductUpdate, Size};
use serde::Deserialize;

use crate::AppState;
use crate::auth::require_admin;
use crate::error::ApiError;

/// Query string for GET /products. Prices are in cents.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<Category>,
    pub size: Option<Size>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    fn into_query(self) -> Result<ProductQuery, ApiError> {
        let sort = match self.sort.as_deref() {
            None | Some("newest") => ProductSort::Newest,
            Some("price_asc") => ProductSort::PriceAsc,
            Some("price_desc") => ProductSort::PriceDesc,
            Some(other) => {
                return Err(ApiError::BadRequest(format!("Unknown sort \"{other}\".")));
            }
        };
        Ok(ProductQuery {
            category: self.category,
            size: self.size,
            min_price: self.min_price.map(Money::from_cents),
            max_price: self.max_price.map(Money::from_cents),
            search: self.search,
            sort,
            page: self.page.unwrap_or(0),
            limit: self.limit.unwrap_or(0),
        })
    }
}

/// GET /products — public listing with filters, sort, and pagination.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = params.into_query()?;
    let page = state.store.list_products(&query).await?;

    let limit = u64::from(query.limit());
    Ok(Json(serde_json::json!({
        "success": true,
        "products": page.items,
        "total": page.total,
        "page": query.page(),
        "pages": page.total.div_ceil(limit),
    })))
}

/// GET /products/{id} — one product.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<ProductId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))?;

    Ok(Json(serde_json::json!({ "success": true, "product": product })))
}

/// POST /products — create a product (admin).
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    require_admin(&principal)?;

    let product = Product::new(req)?;
    state.store.insert_product(&product).await?;

    tracing::info!(product_id = %product.id, name = %product.name, "product created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "product": product })),
    ))
}

/// PUT /products/{id} — partial update (admin).
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Path(id): Path<ProductId>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&principal)?;

    let mut product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))?;

    product.apply_update(req)?;

    if !state.store.update_product(&product).await? {
        // deleted between the read and the write
        return Err(ApiError::NotFound(format!("Product not found: {id}")));
    }

    Ok(Json(serde_json::json!({ "success": true, "product": product })))
}

/// DELETE /products/{id} — remove a product from the catalog (admin).
#[tracing::instrument(skip(state))]
pub async fn remove<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Path(id): Path<ProductId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&principal)?;

    if !state.store.delete_product(id).await? {
        return Err(ApiError::NotFound(format!("Product not found: {id}")));
    }

    tracing::info!(product_id = %id, "product deleted");
    Ok(Json(
        serde_json::json!({ "success": true, "message": "Product deleted." }),
    ))
}
