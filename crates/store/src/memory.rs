//! In-memory storage adapter.
//!
//! All state lives behind a single `RwLock`; conditional stock mutations
//! and the checkout commit do their check-then-mutate inside one write
//! guard, which is what makes them atomic with respect to concurrent
//! requests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::storage::{
    CartStore, CatalogStore, DeductOutcome, OrderFilter, OrderStore, Page, ProductQuery,
    ProductSort, Result, StoreError, UserStore,
};
use domain::{Cart, Order, Product, User};

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    orders: HashMap<OrderId, Order>,
    users: HashMap<UserId, User>,
    sessions: HashMap<Uuid, UserId>,
}

impl State {
    /// Checks every line against current stock; on success decrements them
    /// all. Nothing is mutated unless every line fits.
    fn deduct_all(&mut self, lines: &[(ProductId, u32)]) -> DeductOutcome {
        for &(product_id, requested) in lines {
            match self.products.get(&product_id) {
                None => return DeductOutcome::Missing { product_id },
                Some(p) if p.stock_quantity < requested => {
                    return DeductOutcome::Insufficient {
                        product_id,
                        available: p.stock_quantity,
                        requested,
                    };
                }
                Some(_) => {}
            }
        }
        for &(product_id, requested) in lines {
            if let Some(p) = self.products.get_mut(&product_id) {
                p.stock_quantity -= requested;
            }
        }
        DeductOutcome::Applied
    }
}

/// In-memory store for tests and single-process deployments.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock for a product, for test assertions.
    pub async fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(&id)
            .map(|p| p.stock_quantity)
    }

    /// Number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.products.remove(&id).is_some())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.get(&id).cloned())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        let state = self.state.read().await;
        let search = query.search.as_ref().map(|s| s.to_lowercase());

        let mut matches: Vec<Product> = state
            .products
            .values()
            .filter(|p| {
                if let Some(category) = query.category
                    && p.category != category
                {
                    return false;
                }
                if let Some(size) = query.size
                    && !p.has_size(size)
                {
                    return false;
                }
                if let Some(min) = query.min_price
                    && p.price < min
                {
                    return false;
                }
                if let Some(max) = query.max_price
                    && p.price > max
                {
                    return false;
                }
                if let Some(ref needle) = search {
                    let hit = p.name.to_lowercase().contains(needle)
                        || p.description.to_lowercase().contains(needle)
                        || p.sub_category
                            .as_ref()
                            .is_some_and(|s| s.to_lowercase().contains(needle));
                    if !hit {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        match query.sort {
            ProductSort::PriceAsc => matches.sort_by_key(|p| p.price),
            ProductSort::PriceDesc => matches.sort_by_key(|p| std::cmp::Reverse(p.price)),
            ProductSort::Newest => {
                matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
        }

        let total = matches.len() as u64;
        let skip = (query.page() - 1) as usize * query.limit() as usize;
        let items = matches
            .into_iter()
            .skip(skip)
            .take(query.limit() as usize)
            .collect();

        Ok(Page { items, total })
    }

    async fn try_deduct_stock(&self, id: ProductId, quantity: u32) -> Result<DeductOutcome> {
        let mut state = self.state.write().await;
        Ok(state.deduct_all(&[(id, quantity)]))
    }

    async fn try_deduct_all(&self, lines: &[(ProductId, u32)]) -> Result<DeductOutcome> {
        let mut state = self.state.write().await;
        Ok(state.deduct_all(lines))
    }

    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(p) = state.products.get_mut(&id) {
            p.stock_quantity += quantity;
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        Ok(state.carts.get(&user_id).cloned())
    }

    async fn put_cart(&self, cart: &Cart) -> Result<()> {
        let mut state = self.state.write().await;
        state.carts.insert(cart.user_id, cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, user_id: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        state.carts.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn commit_checkout(&self, order: &Order, deduct_stock: bool) -> Result<DeductOutcome> {
        // One write guard across the check, the deduction, the order
        // insert, and the cart delete: concurrent checkouts serialize here.
        let mut state = self.state.write().await;

        if deduct_stock {
            let outcome = state.deduct_all(&order.deduction_lines());
            if outcome != DeductOutcome::Applied {
                return Ok(outcome);
            }
        }

        state.orders.insert(order.id, order.clone());
        state.carts.remove(&order.user_id);
        Ok(DeductOutcome::Applied)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&id).cloned())
    }

    async fn save_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let mut matches: Vec<Order> = state
            .orders
            .values()
            .filter(|o| {
                if let Some(status) = filter.status
                    && o.status != status
                {
                    return false;
                }
                if let Some(is_bulk) = filter.is_bulk
                    && o.is_bulk_order != is_bulk
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as u64;
        let skip = (filter.page() - 1) as usize * filter.limit() as usize;
        let items = matches
            .into_iter()
            .skip(skip)
            .take(filter.limit() as usize)
            .collect();

        Ok(Page { items, total })
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write().await;
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn create_session(&self, token: Uuid, user_id: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        state.sessions.insert(token, user_id);
        Ok(())
    }

    async fn get_session(&self, token: Uuid) -> Result<Option<UserId>> {
        let state = self.state.read().await;
        Ok(state.sessions.get(&token).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::Money;
    use domain::{Category, NewProduct, Size};

    fn product(name: &str, stock: u32, price_cents: i64) -> Product {
        Product::new(NewProduct {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Money::from_cents(price_cents),
            category: Category::Men,
            sub_category: None,
            sizes: vec![Size::M, Size::L],
            stock_quantity: stock,
            images: vec![],
            is_featured: false,
            discount: 0,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn deduct_is_conditional() {
        let store = MemoryStore::new();
        let p = product("Tee", 3, 999);
        store.insert_product(&p).await.unwrap();

        assert_eq!(
            store.try_deduct_stock(p.id, 2).await.unwrap(),
            DeductOutcome::Applied
        );
        assert_eq!(store.stock_of(p.id).await, Some(1));

        let outcome = store.try_deduct_stock(p.id, 2).await.unwrap();
        assert_eq!(
            outcome,
            DeductOutcome::Insufficient {
                product_id: p.id,
                available: 1,
                requested: 2
            }
        );
        // failed deduct mutated nothing
        assert_eq!(store.stock_of(p.id).await, Some(1));
    }

    #[tokio::test]
    async fn deduct_all_is_all_or_nothing() {
        let store = MemoryStore::new();
        let a = product("Shirt", 10, 1000);
        let b = product("Jacket", 1, 5000);
        store.insert_product(&a).await.unwrap();
        store.insert_product(&b).await.unwrap();

        let outcome = store
            .try_deduct_all(&[(a.id, 5), (b.id, 2)])
            .await
            .unwrap();
        assert!(matches!(outcome, DeductOutcome::Insufficient { .. }));
        // the first line must not have been applied
        assert_eq!(store.stock_of(a.id).await, Some(10));
        assert_eq!(store.stock_of(b.id).await, Some(1));
    }

    #[tokio::test]
    async fn missing_product_reported() {
        let store = MemoryStore::new();
        let ghost = ProductId::new();
        assert_eq!(
            store.try_deduct_stock(ghost, 1).await.unwrap(),
            DeductOutcome::Missing { product_id: ghost }
        );
    }

    #[tokio::test]
    async fn restore_on_deleted_product_is_noop() {
        let store = MemoryStore::new();
        store.restore_stock(ProductId::new(), 5).await.unwrap();
    }

    #[tokio::test]
    async fn listing_filters_and_sorts() {
        let store = MemoryStore::new();
        let cheap = product("Essential Tee", 10, 999);
        let pricey = product("Denim Jacket", 10, 4999);
        store.insert_product(&cheap).await.unwrap();
        store.insert_product(&pricey).await.unwrap();

        let page = store
            .list_products(&ProductQuery {
                sort: ProductSort::PriceAsc,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].name, "Essential Tee");

        let page = store
            .list_products(&ProductQuery {
                search: Some("denim".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Denim Jacket");

        let page = store
            .list_products(&ProductQuery {
                min_price: Some(Money::from_cents(2000)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn listing_paginates() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert_product(&product(&format!("Item {i}"), 1, 1000))
                .await
                .unwrap();
        }
        let page = store
            .list_products(&ProductQuery {
                page: 2,
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let store = MemoryStore::new();
        let u1 = User::new(
            "A".to_string(),
            "a@example.com".to_string(),
            "h1".to_string(),
        )
        .unwrap();
        let u2 = User::new(
            "B".to_string(),
            "a@example.com".to_string(),
            "h2".to_string(),
        )
        .unwrap();
        store.insert_user(&u1).await.unwrap();
        assert!(matches!(
            store.insert_user(&u2).await,
            Err(StoreError::Duplicate("email"))
        ));
    }

    #[tokio::test]
    async fn sessions_resolve_to_users() {
        let store = MemoryStore::new();
        let user_id = UserId::new();
        let token = Uuid::new_v4();
        store.create_session(token, user_id).await.unwrap();
        assert_eq!(store.get_session(token).await.unwrap(), Some(user_id));
        assert_eq!(store.get_session(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn cart_roundtrip_and_idempotent_delete() {
        let store = MemoryStore::new();
        let user_id = UserId::new();
        let mut cart = Cart::new(user_id);
        cart.upsert_line(ProductId::new(), 2, Size::M, Money::from_cents(1000));

        store.delete_cart(user_id).await.unwrap(); // no cart yet, no error
        store.put_cart(&cart).await.unwrap();
        assert!(store.get_cart(user_id).await.unwrap().is_some());
        store.delete_cart(user_id).await.unwrap();
        assert!(store.get_cart(user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn newest_first_ordering_uses_created_at() {
        let store = MemoryStore::new();
        let mut older = product("Old", 1, 1000);
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        let newer = product("New", 1, 1000);
        store.insert_product(&older).await.unwrap();
        store.insert_product(&newer).await.unwrap();

        let page = store.list_products(&ProductQuery::default()).await.unwrap();
        assert_eq!(page.items[0].name, "New");
    }
}
