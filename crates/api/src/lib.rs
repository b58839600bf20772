//! HTTP API server with observability for the storefront.
//!
//! Provides REST endpoints for the catalog, carts, orders, and auth,
//! with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::{CartService, CommerceStore, OrderEngine};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState<S: CommerceStore> {
    pub store: S,
    pub carts: CartService<S>,
    pub orders: OrderEngine<S>,
}

impl<S: CommerceStore> AppState<S> {
    /// Wires the domain services around one storage adapter.
    pub fn new(store: S) -> Self {
        Self {
            carts: CartService::new(store.clone()),
            orders: OrderEngine::new(store.clone()),
            store,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CommerceStore>(state: AppState<S>, metrics_handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/auth/signup", post(routes::auth::signup::<S>))
        .route("/auth/login", post(routes::auth::login::<S>))
        .route("/auth/me", get(routes::auth::me::<S>))
        .route("/auth/addresses", post(routes::auth::add_address::<S>))
        .route(
            "/auth/addresses/{id}/default",
            put(routes::auth::set_default_address::<S>),
        )
        .route("/products", get(routes::products::list::<S>))
        .route("/products", post(routes::products::create::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", put(routes::products::update::<S>))
        .route("/products/{id}", delete(routes::products::remove::<S>))
        .route("/cart", get(routes::cart::get::<S>))
        .route("/cart", post(routes::cart::add::<S>))
        .route("/cart", delete(routes::cart::clear::<S>))
        .route("/cart/{item_id}", put(routes::cart::update::<S>))
        .route("/cart/{item_id}", delete(routes::cart::remove::<S>))
        .route("/orders", post(routes::orders::place::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/my-orders", get(routes::orders::my_orders::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", put(routes::orders::cancel::<S>))
        .route("/orders/{id}/status", put(routes::orders::update_status::<S>))
        .with_state(state)
        .merge(routes::metrics::router(metrics_handle))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
