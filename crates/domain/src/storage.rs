//! Storage ports implemented by the `store` crate.
//!
//! The order engine never touches stock with read-modify-write: the catalog
//! port exposes a conditional decrement (`try_deduct_stock`, all-or-nothing
//! `try_deduct_all`) and `commit_checkout` folds order insert, stock
//! deduction, and cart deletion into one storage commit. This is what keeps
//! stock non-negative under concurrent checkouts.

use async_trait::async_trait;
use common::{Money, OrderId, ProductId, UserId};
use thiserror::Error;
use uuid::Uuid;

use crate::cart::Cart;
use crate::order::{Order, OrderStatus};
use crate::product::{Category, Product, Size};
use crate::user::User;

/// Errors surfaced by a storage adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-constraint violation (e.g. duplicate email).
    #[error("Duplicate {0}")]
    Duplicate(&'static str),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backend (database) failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Wraps any displayable backend failure.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcome of a conditional stock mutation or a checkout commit.
///
/// `Insufficient` and `Missing` identify the offending product so callers
/// can produce an error naming it; on either outcome nothing was mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeductOutcome {
    /// Every requested decrement was applied.
    Applied,
    /// A product had fewer units than requested.
    Insufficient {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },
    /// A product no longer exists.
    Missing { product_id: ProductId },
}

/// Sort order for the public product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    #[default]
    Newest,
}

/// Filter and pagination for the public product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category: Option<Category>,
    pub size: Option<Size>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// Case-insensitive substring match on name, description, sub-category.
    pub search: Option<String>,
    pub sort: ProductSort,
    pub page: u32,
    pub limit: u32,
}

impl ProductQuery {
    /// 1-based page, clamped to at least 1.
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Page size, defaulting to 12 as the storefront grid expects.
    pub fn limit(&self) -> u32 {
        if self.limit == 0 { 12 } else { self.limit }
    }
}

/// Filter and pagination for the admin order listing.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub is_bulk: Option<bool>,
    pub page: u32,
    pub limit: u32,
}

impl OrderFilter {
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn limit(&self) -> u32 {
        if self.limit == 0 { 20 } else { self.limit }
    }
}

/// One page of results plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Catalog persistence and atomic stock mutation.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Replaces an existing product. Returns false if it does not exist.
    async fn update_product(&self, product: &Product) -> Result<bool>;

    /// Returns false if the product does not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Newest-first unless the query says otherwise.
    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>>;

    /// Decrements stock only if at least `quantity` units remain.
    async fn try_deduct_stock(&self, id: ProductId, quantity: u32) -> Result<DeductOutcome>;

    /// All-or-nothing batch decrement across several products.
    async fn try_deduct_all(&self, lines: &[(ProductId, u32)]) -> Result<DeductOutcome>;

    /// Increments stock. A no-op when the product has been deleted, so a
    /// cancellation can still complete after catalog cleanup.
    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<()>;
}

/// One mutable cart per user.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Inserts or replaces the user's cart.
    async fn put_cart(&self, cart: &Cart) -> Result<()>;

    /// Deletes the cart; a no-op when none exists.
    async fn delete_cart(&self, user_id: UserId) -> Result<()>;
}

/// Order persistence, including the single-commit checkout.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically: re-checks and (when `deduct_stock`) decrements stock for
    /// every line, persists the order, and deletes the user's cart. On any
    /// non-`Applied` outcome nothing is committed.
    async fn commit_checkout(&self, order: &Order, deduct_stock: bool) -> Result<DeductOutcome>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Replaces an existing order (status-transition persistence).
    async fn save_order(&self, order: &Order) -> Result<()>;

    /// All orders for one user, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Admin listing, newest first.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Page<Order>>;
}

/// Users, address books, and opaque session tokens.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate("email")` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Replaces an existing user (address-book mutations).
    async fn save_user(&self, user: &User) -> Result<()>;

    async fn create_session(&self, token: Uuid, user_id: UserId) -> Result<()>;

    async fn get_session(&self, token: Uuid) -> Result<Option<UserId>>;
}

/// Everything the API and the order engine need from one storage adapter.
pub trait CommerceStore:
    CatalogStore + CartStore + OrderStore + UserStore + Clone + Send + Sync + 'static
{
}

impl<T> CommerceStore for T where
    T: CatalogStore + CartStore + OrderStore + UserStore + Clone + Send + Sync + 'static
{
}
