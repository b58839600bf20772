//! Domain error types.

use common::{AddressId, CartItemId, OrderId, ProductId};
use thiserror::Error;

use crate::order::OrderStatus;
use crate::storage::StoreError;

/// Errors that can occur during domain operations.
///
/// Insufficient-stock errors name the product and the exact quantity still
/// available so the client can offer a corrected quantity.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Product does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A product referenced by the cart no longer exists.
    #[error("A product in your cart no longer exists.")]
    ProductGone,

    /// Order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The user has no cart.
    #[error("Cart not found.")]
    CartNotFound,

    /// Cart line does not exist.
    #[error("Item not found in cart: {0}")]
    ItemNotFound(CartItemId),

    /// The requested address is not in the user's address book.
    #[error("Address not found: {0}")]
    AddressNotFound(AddressId),

    /// No address was supplied and none is marked as default.
    #[error("No shipping address provided or set as default.")]
    NoAddressAvailable,

    /// User record does not exist.
    #[error("User not found.")]
    UserNotFound,

    /// Checkout attempted with no cart or an empty one.
    #[error("Your cart is empty.")]
    EmptyCart,

    /// Not enough units in stock for the requested quantity.
    #[error("\"{name}\" only has {available} units left in stock ({requested} requested).")]
    InsufficientStock {
        name: String,
        available: u32,
        requested: u32,
    },

    /// Illegal order status transition.
    #[error("Cannot move an order from \"{from}\" to \"{to}\".")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Cancellation attempted outside Pending / Quote Requested.
    #[error("Cannot cancel an order that is \"{current}\".")]
    InvalidStateForCancellation { current: OrderStatus },

    /// Ownership or role violation.
    #[error("Not authorized.")]
    NotAuthorized,

    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// A storage-layer failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// True when the error is the caller's fault rather than a system fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DomainError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_names_product_and_counts() {
        let err = DomainError::InsufficientStock {
            name: "Linen Shirt".to_string(),
            available: 3,
            requested: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("Linen Shirt"));
        assert!(msg.contains('3'));
        assert!(msg.contains('5'));
    }

    #[test]
    fn store_errors_are_not_client_errors() {
        let err = DomainError::Store(StoreError::backend("connection refused"));
        assert!(!err.is_client_error());
        assert!(DomainError::EmptyCart.is_client_error());
    }
}
