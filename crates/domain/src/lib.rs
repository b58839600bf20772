//! Domain layer for the storefront.
//!
//! This crate provides:
//! - Entities: products, users with embedded address books, carts, orders
//! - The order status state machine and bulk-order policy
//! - Storage ports implemented by the `store` crate
//! - Services: cart aggregate, stock validator, and the order engine

pub mod cart;
pub mod error;
pub mod order;
pub mod product;
pub mod stock;
pub mod storage;
pub mod user;

pub use cart::{Cart, CartItem, CartLineView, CartService, CartView};
pub use error::DomainError;
pub use order::{
    BULK_ORDER_THRESHOLD, BulkClassification, Order, OrderEngine, OrderLine, OrderPage,
    OrderStatus, PaymentMethod, PlaceOrder, PlacedOrder, ShippingAddress, UpdateStatus, classify,
};
pub use product::{Category, NewProduct, Product, ProductImage, ProductUpdate, Size};
pub use stock::StockValidator;
pub use storage::{
    CartStore, CatalogStore, CommerceStore, DeductOutcome, OrderFilter, OrderStore, Page,
    ProductQuery, ProductSort, StoreError, UserStore,
};
pub use user::{Address, NewAddress, Principal, Role, User};
