//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need a running Docker
//! daemon. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{Money, OrderId, ProductId, UserId};
use domain::storage::{
    CartStore, CatalogStore, DeductOutcome, OrderFilter, OrderStore, ProductQuery, ProductSort,
    StoreError, UserStore,
};
use domain::{
    Cart, Category, NewProduct, Order, OrderLine, OrderStatus, PaymentMethod, Product,
    ShippingAddress, Size, User,
};
use sqlx::PgPool;
use store::PgStore;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!(
                "../../../migrations/0001_create_commerce_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PgStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE products, carts, orders, sessions, users")
        .execute(&pool)
        .await
        .unwrap();

    PgStore::new(pool)
}

fn test_product(name: &str, stock: u32, price_cents: i64) -> Product {
    Product::new(NewProduct {
        name: name.to_string(),
        description: format!("{name} description"),
        price: Money::from_cents(price_cents),
        category: Category::Men,
        sub_category: Some("Shirts".to_string()),
        sizes: vec![Size::M, Size::L],
        stock_quantity: stock,
        images: vec![],
        is_featured: false,
        discount: 0,
    })
    .unwrap()
}

fn test_user(email: &str) -> User {
    User::new("Tester".to_string(), email.to_string(), "hash".to_string()).unwrap()
}

fn test_order(user_id: UserId, product: &Product, quantity: u32) -> Order {
    let line = OrderLine {
        product_id: product.id,
        name: product.name.clone(),
        quantity,
        size: Size::M,
        price_at_purchase: product.price,
    };
    Order {
        id: OrderId::new(),
        user_id,
        total_price: line.line_total(),
        lines: vec![line],
        shipping_address: ShippingAddress {
            label: "Home".to_string(),
            street: "12 Lake Rd".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: "411001".to_string(),
            country: "India".to_string(),
        },
        is_bulk_order: false,
        bulk_order_note: None,
        status: OrderStatus::Pending,
        payment_method: PaymentMethod::Online,
        is_paid: false,
        paid_at: None,
        tracking_number: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn product_roundtrip_and_update() {
    let store = get_test_store().await;
    let mut product = test_product("Linen Shirt", 10, 2499);
    store.insert_product(&product).await.unwrap();

    let loaded = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(loaded, product);

    product.stock_quantity = 7;
    product.price = Money::from_cents(1999);
    assert!(store.update_product(&product).await.unwrap());

    let loaded = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(loaded.stock_quantity, 7);
    assert_eq!(loaded.price.cents(), 1999);

    assert!(store.delete_product(product.id).await.unwrap());
    assert!(store.get_product(product.id).await.unwrap().is_none());
    assert!(!store.delete_product(product.id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn conditional_deduct_never_goes_negative() {
    let store = get_test_store().await;
    let product = test_product("Tee", 3, 999);
    store.insert_product(&product).await.unwrap();

    assert_eq!(
        store.try_deduct_stock(product.id, 2).await.unwrap(),
        DeductOutcome::Applied
    );

    let outcome = store.try_deduct_stock(product.id, 2).await.unwrap();
    assert_eq!(
        outcome,
        DeductOutcome::Insufficient {
            product_id: product.id,
            available: 1,
            requested: 2
        }
    );

    let loaded = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(loaded.stock_quantity, 1);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn deduct_all_rolls_back_on_failure() {
    let store = get_test_store().await;
    let a = test_product("Shirt", 10, 1000);
    let b = test_product("Jacket", 1, 5000);
    store.insert_product(&a).await.unwrap();
    store.insert_product(&b).await.unwrap();

    let outcome = store.try_deduct_all(&[(a.id, 5), (b.id, 2)]).await.unwrap();
    assert!(matches!(outcome, DeductOutcome::Insufficient { .. }));

    // the transaction rolled the first decrement back
    let loaded = store.get_product(a.id).await.unwrap().unwrap();
    assert_eq!(loaded.stock_quantity, 10);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn commit_checkout_is_atomic() {
    let store = get_test_store().await;
    let user = test_user("checkout@example.com");
    store.insert_user(&user).await.unwrap();

    let product = test_product("Boots", 5, 6999);
    store.insert_product(&product).await.unwrap();

    let mut cart = Cart::new(user.id);
    cart.upsert_line(product.id, 2, Size::M, product.price);
    store.put_cart(&cart).await.unwrap();

    let order = test_order(user.id, &product, 2);
    let outcome = store.commit_checkout(&order, true).await.unwrap();
    assert_eq!(outcome, DeductOutcome::Applied);

    let loaded = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(loaded.stock_quantity, 3);
    assert!(store.get_cart(user.id).await.unwrap().is_none());

    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.total_price, order.total_price);
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn failed_checkout_commits_nothing() {
    let store = get_test_store().await;
    let user = test_user("short@example.com");
    store.insert_user(&user).await.unwrap();

    let product = test_product("Scarf", 1, 2199);
    store.insert_product(&product).await.unwrap();

    let mut cart = Cart::new(user.id);
    cart.upsert_line(product.id, 2, Size::M, product.price);
    store.put_cart(&cart).await.unwrap();

    let order = test_order(user.id, &product, 2);
    let outcome = store.commit_checkout(&order, true).await.unwrap();
    assert!(matches!(outcome, DeductOutcome::Insufficient { .. }));

    // order not stored, cart untouched, stock untouched
    assert!(store.get_order(order.id).await.unwrap().is_none());
    assert!(store.get_cart(user.id).await.unwrap().is_some());
    let loaded = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(loaded.stock_quantity, 1);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn bulk_checkout_skips_deduction() {
    let store = get_test_store().await;
    let user = test_user("bulk@example.com");
    store.insert_user(&user).await.unwrap();

    let product = test_product("Tote", 100, 1199);
    store.insert_product(&product).await.unwrap();

    let mut order = test_order(user.id, &product, 60);
    order.is_bulk_order = true;
    order.status = OrderStatus::QuoteRequested;
    order.payment_method = PaymentMethod::BankTransfer;

    let outcome = store.commit_checkout(&order, false).await.unwrap();
    assert_eq!(outcome, DeductOutcome::Applied);

    let loaded = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(loaded.stock_quantity, 100);

    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::QuoteRequested);
    assert_eq!(stored.payment_method, PaymentMethod::BankTransfer);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn listing_filters_sorts_and_paginates() {
    let store = get_test_store().await;
    let cheap = test_product("Essential Tee", 10, 999);
    let pricey = test_product("Denim Jacket", 10, 4999);
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
            size: Some(Size::M),
            min_price: Some(Money::from_cents(2000)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    let page = store
        .list_products(&ProductQuery {
            page: 2,
            limit: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn order_status_persists_through_save() {
    let store = get_test_store().await;
    let user = test_user("status@example.com");
    store.insert_user(&user).await.unwrap();
    let product = test_product("Polo", 10, 1899);
    store.insert_product(&product).await.unwrap();

    let mut order = test_order(user.id, &product, 1);
    store.commit_checkout(&order, true).await.unwrap();

    order.status = OrderStatus::Confirmed;
    order.tracking_number = Some("TRK-123".to_string());
    store.save_order(&order).await.unwrap();

    let loaded = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::Confirmed);
    assert_eq!(loaded.tracking_number.as_deref(), Some("TRK-123"));

    let page = store
        .list_orders(&OrderFilter {
            status: Some(OrderStatus::Confirmed),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    let mine = store.orders_for_user(user.id).await.unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn duplicate_email_maps_to_duplicate_error() {
    let store = get_test_store().await;
    let first = test_user("taken@example.com");
    let second = test_user("taken@example.com");
    store.insert_user(&first).await.unwrap();

    let result = store.insert_user(&second).await;
    assert!(matches!(result, Err(StoreError::Duplicate("email"))));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn user_addresses_roundtrip() {
    let store = get_test_store().await;
    let mut user = test_user("addr@example.com");
    store.insert_user(&user).await.unwrap();

    user.add_address(domain::NewAddress {
        label: "Home".to_string(),
        street: "12 Lake Rd".to_string(),
        city: "Pune".to_string(),
        state: "MH".to_string(),
        postal_code: "411001".to_string(),
        country: "India".to_string(),
        is_default: true,
    });
    store.save_user(&user).await.unwrap();

    let loaded = store.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(loaded.addresses.len(), 1);
    assert!(loaded.addresses[0].is_default);

    let found = store
        .find_user_by_email("addr@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user.id);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn sessions_resolve_to_users() {
    let store = get_test_store().await;
    let user = test_user("session@example.com");
    store.insert_user(&user).await.unwrap();

    let token = Uuid::new_v4();
    store.create_session(token, user.id).await.unwrap();
    assert_eq!(store.get_session(token).await.unwrap(), Some(user.id));
    assert_eq!(store.get_session(Uuid::new_v4()).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn restore_stock_is_noop_for_deleted_product() {
    let store = get_test_store().await;
    let product = test_product("Beanie", 5, 899);
    store.insert_product(&product).await.unwrap();
    store.delete_product(product.id).await.unwrap();

    store.restore_stock(product.id, 3).await.unwrap();
    assert!(store.get_product(product.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn deducting_missing_product_reports_missing() {
    let store = get_test_store().await;
    let ghost = ProductId::new();
    assert_eq!(
        store.try_deduct_stock(ghost, 1).await.unwrap(),
        DeductOutcome::Missing { product_id: ghost }
    );
}
