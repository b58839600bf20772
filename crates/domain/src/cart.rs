//! The cart aggregate: one mutable cart per user.

use chrono::{DateTime, Utc};
use common::{CartItemId, Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::product::{Product, ProductImage, Size};
use crate::stock::StockValidator;
use crate::storage::CommerceStore;

/// One cart line: a (product, size) pair with a quantity and the price
/// snapshot taken when the line was first added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Size,
    /// Snapshot of the product price at add time, immune to later changes.
    pub price_at_addition: Money,
}

/// A user's cart. Created lazily on first add, deleted wholesale on
/// checkout or explicit clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Sum of line price snapshots times quantities.
    pub fn total_price(&self) -> Money {
        self.items
            .iter()
            .map(|i| i.price_at_addition.multiply(i.quantity))
            .sum()
    }

    /// Total unit count across all lines.
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Finds the line for a (product, size) pair, if present.
    pub fn line_for(&self, product_id: ProductId, size: Size) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|i| i.product_id == product_id && i.size == size)
    }

    /// Adds quantity to an existing (product, size) line or appends a new
    /// one with the given price snapshot. Never creates a duplicate line.
    pub fn upsert_line(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        size: Size,
        price_snapshot: Money,
    ) -> CartItemId {
        self.updated_at = Utc::now();
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id && i.size == size)
        {
            // Saturating: callers validate against stock before merging, so
            // a capped value can never pass the stock check anyway.
            line.quantity = line.quantity.saturating_add(quantity);
            return line.id;
        }
        let id = CartItemId::new();
        self.items.push(CartItem {
            id,
            product_id,
            quantity,
            size,
            price_at_addition: price_snapshot,
        });
        id
    }

    /// Looks up a line by its ID.
    pub fn item(&self, item_id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    fn item_mut(&mut self, item_id: CartItemId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    /// Removes a line; returns false if it was not present.
    pub fn remove_item(&mut self, item_id: CartItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        self.updated_at = Utc::now();
        self.items.len() != before
    }
}

/// One cart line populated with current catalog details for display.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub images: Vec<ProductImage>,
    /// Current catalog price, which may differ from the snapshot.
    pub price: Money,
    pub stock_quantity: u32,
    pub quantity: u32,
    pub size: Size,
    pub price_at_addition: Money,
}

/// The populated cart shape returned to clients. A user with no cart gets
/// the empty shape rather than an error.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_price: Money,
    pub total_items: u32,
}

impl CartView {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_price: Money::zero(),
            total_items: 0,
        }
    }
}

/// Service maintaining the single active cart per user.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: CommerceStore> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn validator(&self) -> StockValidator<S> {
        StockValidator::new(self.store.clone())
    }

    /// Returns the user's populated cart, or the empty shape.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user_id: UserId) -> Result<CartView, DomainError> {
        match self.store.get_cart(user_id).await? {
            Some(cart) => self.populate(cart).await,
            None => Ok(CartView::empty()),
        }
    }

    /// Adds a (product, size, quantity) line, validating the product, the
    /// size membership, and stock for the combined quantity when the pair
    /// already has a line.
    #[tracing::instrument(skip(self))]
    pub async fn add_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        size: Size,
    ) -> Result<CartView, DomainError> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "Quantity must be at least 1.".to_string(),
            ));
        }

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(DomainError::ProductNotFound(product_id))?;

        if !product.has_size(size) {
            return Err(DomainError::Validation(format!(
                "\"{}\" is not available in size {size}.",
                product.name
            )));
        }

        let mut cart = self
            .store
            .get_cart(user_id)
            .await?
            .unwrap_or_else(|| Cart::new(user_id));

        // Stock check covers existing line quantity plus the new units.
        let existing = cart.line_for(product_id, size).map_or(0, |l| l.quantity);
        let combined = existing
            .checked_add(quantity)
            .ok_or_else(|| DomainError::Validation("Quantity out of range.".to_string()))?;
        if product.stock_quantity < combined {
            return Err(DomainError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock_quantity,
                requested: combined,
            });
        }

        cart.upsert_line(product_id, quantity, size, product.price);
        self.store.put_cart(&cart).await?;
        self.populate(cart).await
    }

    /// Sets a line's quantity after re-validating stock. A quantity of
    /// zero or less removes the line, which is the documented
    /// removal-via-update path.
    #[tracing::instrument(skip(self))]
    pub async fn update_line(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        new_quantity: i64,
    ) -> Result<CartView, DomainError> {
        let mut cart = self
            .store
            .get_cart(user_id)
            .await?
            .ok_or(DomainError::CartNotFound)?;

        let line = cart.item(item_id).ok_or(DomainError::ItemNotFound(item_id))?;
        let product_id = line.product_id;

        if new_quantity <= 0 {
            cart.remove_item(item_id);
        } else {
            let quantity = u32::try_from(new_quantity)
                .map_err(|_| DomainError::Validation("Quantity out of range.".to_string()))?;
            self.validator()
                .check_availability(product_id, quantity)
                .await?;
            if let Some(line) = cart.item_mut(item_id) {
                line.quantity = quantity;
                cart.updated_at = Utc::now();
            }
        }

        self.store.put_cart(&cart).await?;
        self.populate(cart).await
    }

    /// Removes a line unconditionally.
    #[tracing::instrument(skip(self))]
    pub async fn remove_line(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<CartView, DomainError> {
        let mut cart = self
            .store
            .get_cart(user_id)
            .await?
            .ok_or(DomainError::CartNotFound)?;

        if !cart.remove_item(item_id) {
            return Err(DomainError::ItemNotFound(item_id));
        }

        self.store.put_cart(&cart).await?;
        self.populate(cart).await
    }

    /// Deletes the whole cart. Idempotent: clearing a missing cart is a
    /// no-op, not an error.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<(), DomainError> {
        self.store.delete_cart(user_id).await?;
        Ok(())
    }

    async fn populate(&self, cart: Cart) -> Result<CartView, DomainError> {
        let total_price = cart.total_price();
        let total_items = cart.total_items();

        let mut items = Vec::with_capacity(cart.items.len());
        for line in cart.items {
            // Lines whose product vanished still render, with empty details,
            // so the client can show and remove them.
            let product = self.store.get_product(line.product_id).await?;
            items.push(view_line(line, product));
        }

        Ok(CartView {
            items,
            total_price,
            total_items,
        })
    }
}

fn view_line(line: CartItem, product: Option<Product>) -> CartLineView {
    let (name, images, price, stock_quantity) = match product {
        Some(p) => (p.name, p.images, p.price, p.stock_quantity),
        None => (String::new(), Vec::new(), Money::zero(), 0),
    };
    CartLineView {
        id: line.id,
        product_id: line.product_id,
        name,
        images,
        price,
        stock_quantity,
        quantity: line.quantity,
        size: line.size,
        price_at_addition: line.price_at_addition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_merges_same_product_and_size() {
        let mut cart = Cart::new(UserId::new());
        let product = ProductId::new();
        let first = cart.upsert_line(product, 2, Size::M, Money::from_cents(1000));
        let second = cart.upsert_line(product, 3, Size::M, Money::from_cents(1000));
        assert_eq!(first, second);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[test]
    fn upsert_saturates_instead_of_wrapping() {
        let mut cart = Cart::new(UserId::new());
        let product = ProductId::new();
        cart.upsert_line(product, u32::MAX - 1, Size::M, Money::from_cents(100));
        cart.upsert_line(product, 5, Size::M, Money::from_cents(100));
        assert_eq!(cart.items[0].quantity, u32::MAX);
    }

    #[test]
    fn same_product_different_size_gets_its_own_line() {
        let mut cart = Cart::new(UserId::new());
        let product = ProductId::new();
        cart.upsert_line(product, 1, Size::M, Money::from_cents(1000));
        cart.upsert_line(product, 1, Size::L, Money::from_cents(1000));
        assert_eq!(cart.items.len(), 2);
    }

    #[test]
    fn totals() {
        let mut cart = Cart::new(UserId::new());
        cart.upsert_line(ProductId::new(), 2, Size::M, Money::from_cents(1000));
        cart.upsert_line(ProductId::new(), 1, Size::S, Money::from_cents(500));
        assert_eq!(cart.total_price().cents(), 2500);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn price_snapshot_is_kept_on_merge() {
        let mut cart = Cart::new(UserId::new());
        let product = ProductId::new();
        cart.upsert_line(product, 1, Size::M, Money::from_cents(1000));
        // Catalog price changed between adds; the line keeps its snapshot.
        cart.upsert_line(product, 1, Size::M, Money::from_cents(9999));
        assert_eq!(cart.items[0].price_at_addition.cents(), 1000);
    }

    #[test]
    fn remove_item_reports_presence() {
        let mut cart = Cart::new(UserId::new());
        let id = cart.upsert_line(ProductId::new(), 1, Size::M, Money::from_cents(100));
        assert!(cart.remove_item(id));
        assert!(!cart.remove_item(id));
    }
}
