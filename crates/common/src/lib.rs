//! Shared primitives for the storefront: typed UUID identifiers and
//! an integer-cents money type.

pub mod ids;
pub mod money;

pub use ids::{AddressId, CartItemId, OrderId, ProductId, UserId};
pub use money::Money;
