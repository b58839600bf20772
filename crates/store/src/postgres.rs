//! PostgreSQL storage adapter.
//!
//! Stock never goes through read-modify-write here: decrements are
//! conditional `UPDATE ... WHERE stock_quantity >= n` statements, and
//! `commit_checkout` wraps the decrements, the order insert, and the cart
//! delete in one transaction.

use async_trait::async_trait;
use common::{Money, OrderId, ProductId, UserId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use domain::storage::{
    CartStore, CatalogStore, DeductOutcome, OrderFilter, OrderStore, Page, ProductQuery,
    ProductSort, Result, StoreError, UserStore,
};
use domain::{Cart, CartItem, Order, OrderLine, Product, ProductImage, ShippingAddress, Size, User};

/// PostgreSQL-backed commerce store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

trait SqlxResultExt<T> {
    fn backend(self) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn backend(self) -> Result<T> {
        self.map_err(StoreError::backend)
    }
}

/// Serializes a unit enum to its wire string for a TEXT column.
fn to_wire<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(StoreError::Backend(format!(
            "expected string encoding, got {other}"
        ))),
    }
}

/// Parses a TEXT column back into a unit enum via its wire string.
fn from_wire<T: DeserializeOwned>(s: String) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::String(s))?)
}

impl PgStore {
    /// Creates a new PostgreSQL commerce store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id").backend()?),
            name: row.try_get("name").backend()?,
            description: row.try_get("description").backend()?,
            price: Money::from_cents(row.try_get::<i64, _>("price_cents").backend()?),
            category: from_wire(row.try_get::<String, _>("category").backend()?)?,
            sub_category: row.try_get("sub_category").backend()?,
            sizes: serde_json::from_value::<Vec<Size>>(row.try_get("sizes").backend()?)?,
            stock_quantity: row.try_get::<i32, _>("stock_quantity").backend()? as u32,
            images: serde_json::from_value::<Vec<ProductImage>>(
                row.try_get("images").backend()?,
            )?,
            is_featured: row.try_get("is_featured").backend()?,
            discount: row.try_get::<i16, _>("discount").backend()? as u8,
            created_at: row.try_get("created_at").backend()?,
            updated_at: row.try_get("updated_at").backend()?,
        })
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id").backend()?),
            name: row.try_get("name").backend()?,
            email: row.try_get("email").backend()?,
            password_hash: row.try_get("password_hash").backend()?,
            role: from_wire(row.try_get::<String, _>("role").backend()?)?,
            addresses: serde_json::from_value(row.try_get("addresses").backend()?)?,
            created_at: row.try_get("created_at").backend()?,
        })
    }

    fn row_to_cart(row: PgRow) -> Result<Cart> {
        Ok(Cart {
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id").backend()?),
            items: serde_json::from_value::<Vec<CartItem>>(row.try_get("items").backend()?)?,
            updated_at: row.try_get("updated_at").backend()?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id").backend()?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id").backend()?),
            lines: serde_json::from_value::<Vec<OrderLine>>(row.try_get("lines").backend()?)?,
            shipping_address: serde_json::from_value::<ShippingAddress>(
                row.try_get("shipping_address").backend()?,
            )?,
            total_price: Money::from_cents(row.try_get::<i64, _>("total_price_cents").backend()?),
            is_bulk_order: row.try_get("is_bulk_order").backend()?,
            bulk_order_note: row.try_get("bulk_order_note").backend()?,
            status: from_wire(row.try_get::<String, _>("status").backend()?)?,
            payment_method: from_wire(row.try_get::<String, _>("payment_method").backend()?)?,
            is_paid: row.try_get("is_paid").backend()?,
            paid_at: row.try_get("paid_at").backend()?,
            tracking_number: row.try_get("tracking_number").backend()?,
            created_at: row.try_get("created_at").backend()?,
        })
    }

    /// Conditionally decrements one product inside an open transaction.
    /// Returns the outcome without committing or rolling back.
    async fn deduct_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<DeductOutcome> {
        let updated = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - $2, updated_at = now()
            WHERE id = $1 AND stock_quantity >= $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(quantity as i32)
        .execute(&mut **tx)
        .await
        .backend()?;

        if updated.rows_affected() == 1 {
            return Ok(DeductOutcome::Applied);
        }

        let available: Option<i32> =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
                .bind(product_id.as_uuid())
                .fetch_optional(&mut **tx)
                .await
                .backend()?;

        Ok(match available {
            None => DeductOutcome::Missing { product_id },
            Some(available) => DeductOutcome::Insufficient {
                product_id,
                available: available as u32,
                requested: quantity,
            },
        })
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, category, sub_category,
                                  sizes, stock_quantity, images, is_featured, discount,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(to_wire(&product.category)?)
        .bind(&product.sub_category)
        .bind(serde_json::to_value(&product.sizes)?)
        .bind(product.stock_quantity as i32)
        .bind(serde_json::to_value(&product.images)?)
        .bind(product.is_featured)
        .bind(product.discount as i16)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .backend()?;

        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price_cents = $4, category = $5,
                sub_category = $6, sizes = $7, stock_quantity = $8, images = $9,
                is_featured = $10, discount = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(to_wire(&product.category)?)
        .bind(&product.sub_category)
        .bind(serde_json::to_value(&product.sizes)?)
        .bind(product.stock_quantity as i32)
        .bind(serde_json::to_value(&product.images)?)
        .bind(product.is_featured)
        .bind(product.discount as i16)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .backend()?;

        Ok(updated.rows_affected() == 1)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .backend()?;

        Ok(deleted.rows_affected() == 1)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .backend()?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut param_count = 0;

        if query.category.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND category = ${param_count}"));
        }
        if query.size.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND sizes ? ${param_count}"));
        }
        if query.min_price.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND price_cents >= ${param_count}"));
        }
        if query.max_price.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND price_cents <= ${param_count}"));
        }
        if query.search.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(
                " AND (name ILIKE ${param_count} OR description ILIKE ${param_count} \
                 OR sub_category ILIKE ${param_count})"
            ));
        }

        let order_by = match query.sort {
            ProductSort::PriceAsc => " ORDER BY price_cents ASC",
            ProductSort::PriceDesc => " ORDER BY price_cents DESC",
            ProductSort::Newest => " ORDER BY created_at DESC",
        };

        let limit_param = param_count + 1;
        let offset_param = param_count + 2;
        let sql = format!(
            "SELECT * FROM products{where_clause}{order_by} LIMIT ${limit_param} OFFSET ${offset_param}"
        );
        let count_sql = format!("SELECT COUNT(*) FROM products{where_clause}");

        let category = query.category.as_ref().map(to_wire).transpose()?;
        let size = query.size.as_ref().map(to_wire).transpose()?;
        let pattern = query.search.as_ref().map(|s| format!("%{s}%"));

        let mut list_query = sqlx::query(&sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);

        if let Some(ref category) = category {
            list_query = list_query.bind(category);
            count_query = count_query.bind(category);
        }
        if let Some(ref size) = size {
            list_query = list_query.bind(size);
            count_query = count_query.bind(size);
        }
        if let Some(min) = query.min_price {
            list_query = list_query.bind(min.cents());
            count_query = count_query.bind(min.cents());
        }
        if let Some(max) = query.max_price {
            list_query = list_query.bind(max.cents());
            count_query = count_query.bind(max.cents());
        }
        if let Some(ref pattern) = pattern {
            list_query = list_query.bind(pattern);
            count_query = count_query.bind(pattern);
        }

        let offset = (query.page() - 1) as i64 * query.limit() as i64;
        list_query = list_query.bind(query.limit() as i64).bind(offset);

        let total = count_query.fetch_one(&self.pool).await.backend()?;
        let rows = list_query.fetch_all(&self.pool).await.backend()?;
        let items = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn try_deduct_stock(&self, id: ProductId, quantity: u32) -> Result<DeductOutcome> {
        let mut tx = self.pool.begin().await.backend()?;
        let outcome = Self::deduct_in_tx(&mut tx, id, quantity).await?;
        if outcome == DeductOutcome::Applied {
            tx.commit().await.backend()?;
        }
        Ok(outcome)
    }

    async fn try_deduct_all(&self, lines: &[(ProductId, u32)]) -> Result<DeductOutcome> {
        let mut tx = self.pool.begin().await.backend()?;
        for &(product_id, quantity) in lines {
            let outcome = Self::deduct_in_tx(&mut tx, product_id, quantity).await?;
            if outcome != DeductOutcome::Applied {
                // dropping tx rolls back the lines already decremented
                return Ok(outcome);
            }
        }
        tx.commit().await.backend()?;
        Ok(DeductOutcome::Applied)
    }

    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity as i32)
        .execute(&self.pool)
        .await
        .backend()?;

        Ok(())
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query("SELECT * FROM carts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .backend()?;

        row.map(Self::row_to_cart).transpose()
    }

    async fn put_cart(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (user_id, items, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                items = EXCLUDED.items,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(cart.user_id.as_uuid())
        .bind(serde_json::to_value(&cart.items)?)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await
        .backend()?;

        Ok(())
    }

    async fn delete_cart(&self, user_id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .backend()?;

        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn commit_checkout(&self, order: &Order, deduct_stock: bool) -> Result<DeductOutcome> {
        let mut tx = self.pool.begin().await.backend()?;

        if deduct_stock {
            for (product_id, quantity) in order.deduction_lines() {
                let outcome = Self::deduct_in_tx(&mut tx, product_id, quantity).await?;
                if outcome != DeductOutcome::Applied {
                    return Ok(outcome);
                }
            }
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, lines, shipping_address, total_price_cents,
                                is_bulk_order, bulk_order_note, status, payment_method,
                                is_paid, paid_at, tracking_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(serde_json::to_value(&order.lines)?)
        .bind(serde_json::to_value(&order.shipping_address)?)
        .bind(order.total_price.cents())
        .bind(order.is_bulk_order)
        .bind(&order.bulk_order_note)
        .bind(to_wire(&order.status)?)
        .bind(to_wire(&order.payment_method)?)
        .bind(order.is_paid)
        .bind(order.paid_at)
        .bind(&order.tracking_number)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .backend()?;

        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(order.user_id.as_uuid())
            .execute(&mut *tx)
            .await
            .backend()?;

        tx.commit().await.backend()?;
        Ok(DeductOutcome::Applied)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .backend()?;

        row.map(Self::row_to_order).transpose()
    }

    async fn save_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, payment_method = $3, is_paid = $4, paid_at = $5,
                tracking_number = $6
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(to_wire(&order.status)?)
        .bind(to_wire(&order.payment_method)?)
        .bind(order.is_paid)
        .bind(order.paid_at)
        .bind(&order.tracking_number)
        .execute(&self.pool)
        .await
        .backend()?;

        Ok(())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .backend()?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Page<Order>> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut param_count = 0;

        if filter.status.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND status = ${param_count}"));
        }
        if filter.is_bulk.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND is_bulk_order = ${param_count}"));
        }

        let limit_param = param_count + 1;
        let offset_param = param_count + 2;
        let sql = format!(
            "SELECT * FROM orders{where_clause} ORDER BY created_at DESC \
             LIMIT ${limit_param} OFFSET ${offset_param}"
        );
        let count_sql = format!("SELECT COUNT(*) FROM orders{where_clause}");

        let status = filter.status.as_ref().map(to_wire).transpose()?;

        let mut list_query = sqlx::query(&sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);

        if let Some(ref status) = status {
            list_query = list_query.bind(status);
            count_query = count_query.bind(status);
        }
        if let Some(is_bulk) = filter.is_bulk {
            list_query = list_query.bind(is_bulk);
            count_query = count_query.bind(is_bulk);
        }

        let offset = (filter.page() - 1) as i64 * filter.limit() as i64;
        list_query = list_query.bind(filter.limit() as i64).bind(offset);

        let total = count_query.fetch_one(&self.pool).await.backend()?;
        let rows = list_query.fetch_all(&self.pool).await.backend()?;
        let items = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total: total as u64,
        })
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, addresses, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(to_wire(&user.role)?)
        .bind(serde_json::to_value(&user.addresses)?)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Duplicate("email");
            }
            StoreError::backend(e)
        })?;

        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .backend()?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .backend()?;

        row.map(Self::row_to_user).transpose()
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, role = $5, addresses = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(to_wire(&user.role)?)
        .bind(serde_json::to_value(&user.addresses)?)
        .execute(&self.pool)
        .await
        .backend()?;

        Ok(())
    }

    async fn create_session(&self, token: Uuid, user_id: UserId) -> Result<()> {
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .backend()?;

        Ok(())
    }

    async fn get_session(&self, token: Uuid) -> Result<Option<UserId>> {
        let user_id: Option<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await
                .backend()?;

        Ok(user_id.map(UserId::from_uuid))
    }
}
