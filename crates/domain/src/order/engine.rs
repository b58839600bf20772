//! The order engine: cart→order conversion, status transitions, and
//! cancellation, with stock consistency enforced at every mutation point.

use common::{AddressId, Money, OrderId, UserId};
use serde::Deserialize;

use crate::error::DomainError;
use crate::stock::StockValidator;
use crate::storage::{CommerceStore, DeductOutcome, OrderFilter};
use crate::user::Principal;

use super::{
    Order, OrderLine, OrderStatus, PaymentMethod, ShippingAddress, classify,
};

/// Checkout request: address choice, payment method, optional quote note.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceOrder {
    #[serde(default)]
    pub address_id: Option<AddressId>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub bulk_order_note: Option<String>,
}

/// A created order plus the status-appropriate user-facing message.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub message: &'static str,
}

/// Admin status-update request.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatus {
    pub order_status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// One page of the admin order listing.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
}

/// Converts carts into orders and governs the order lifecycle.
#[derive(Clone)]
pub struct OrderEngine<S> {
    store: S,
}

impl<S: CommerceStore> OrderEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn validator(&self) -> StockValidator<S> {
        StockValidator::new(self.store.clone())
    }

    /// Converts the user's cart into an order.
    ///
    /// Validation (address, cart, per-line stock and product existence)
    /// happens before any mutation; the mutation itself — order insert,
    /// stock deduction for non-bulk orders, cart deletion — is a single
    /// store commit, so a concurrent stock change aborts the whole
    /// checkout instead of leaving it half-applied.
    #[tracing::instrument(skip(self, request))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: PlaceOrder,
    ) -> Result<PlacedOrder, DomainError> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let start = std::time::Instant::now();

        // 1. Resolve the shipping address: explicit ID or the default.
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let shipping_address: ShippingAddress = match request.address_id {
            Some(address_id) => user
                .address(address_id)
                .ok_or(DomainError::AddressNotFound(address_id))?
                .into(),
            None => user
                .default_address()
                .ok_or(DomainError::NoAddressAvailable)?
                .into(),
        };

        // 2. The cart must exist and have at least one line.
        let cart = self
            .store
            .get_cart(user_id)
            .await?
            .filter(|c| !c.items.is_empty())
            .ok_or(DomainError::EmptyCart)?;

        // 3–5. Re-validate stock per line (independent of any add-time
        // check) and build the immutable snapshot lines.
        let mut lines = Vec::with_capacity(cart.items.len());
        let mut total_price = Money::zero();
        let mut total_quantity: u32 = 0;

        for item in &cart.items {
            let product = self
                .store
                .get_product(item.product_id)
                .await?
                .ok_or(DomainError::ProductGone)?;

            if product.stock_quantity < item.quantity {
                return Err(DomainError::InsufficientStock {
                    name: product.name.clone(),
                    available: product.stock_quantity,
                    requested: item.quantity,
                });
            }

            lines.push(OrderLine {
                product_id: item.product_id,
                name: product.name,
                quantity: item.quantity,
                size: item.size,
                price_at_purchase: item.price_at_addition,
            });
            total_price += item.price_at_addition.multiply(item.quantity);
            total_quantity = total_quantity
                .checked_add(item.quantity)
                .ok_or_else(|| DomainError::Validation("Quantity out of range.".to_string()))?;
        }

        // 6. Bulk classification over the whole checkout's quantity.
        let classification = classify(total_quantity);
        let is_bulk = classification.is_bulk;

        let order = Order {
            id: OrderId::new(),
            user_id,
            lines,
            shipping_address,
            total_price,
            is_bulk_order: is_bulk,
            bulk_order_note: if is_bulk { request.bulk_order_note } else { None },
            status: classification.status,
            payment_method: if is_bulk {
                PaymentMethod::BankTransfer
            } else {
                request.payment_method
            },
            is_paid: false,
            paid_at: None,
            tracking_number: None,
            created_at: chrono::Utc::now(),
        };

        // 7–9. One commit: persist, deduct (non-bulk only), delete cart.
        // Bulk orders defer deduction until admin confirmation since the
        // quote may be rejected or altered.
        match self.store.commit_checkout(&order, !is_bulk).await? {
            DeductOutcome::Applied => {}
            DeductOutcome::Missing { .. } => return Err(DomainError::ProductGone),
            DeductOutcome::Insufficient {
                product_id,
                available,
                requested,
            } => {
                // The snapshot name is already in hand; no re-read needed.
                let name = order
                    .line_name(product_id)
                    .map_or_else(|| product_id.to_string(), str::to_string);
                return Err(DomainError::InsufficientStock {
                    name,
                    available,
                    requested,
                });
            }
        }

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id,
            is_bulk,
            total_quantity,
            total_cents = order.total_price.cents(),
            "order placed"
        );

        Ok(PlacedOrder {
            message: if is_bulk {
                "Bulk order received! Our team will contact you with a quote shortly."
            } else {
                "Order placed successfully!"
            },
            order,
        })
    }

    /// Loads one order; owners see their own, admins see any.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(
        &self,
        principal: Principal,
        order_id: OrderId,
    ) -> Result<Order, DomainError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        if order.user_id != principal.user_id && !principal.is_admin() {
            return Err(DomainError::NotAuthorized);
        }
        Ok(order)
    }

    /// All orders for the calling user, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn my_orders(&self, user_id: UserId) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// Admin listing, filterable by status and bulk flag.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(
        &self,
        principal: Principal,
        filter: OrderFilter,
    ) -> Result<OrderPage, DomainError> {
        if !principal.is_admin() {
            return Err(DomainError::NotAuthorized);
        }
        let page = self.store.list_orders(&filter).await?;
        let limit = filter.limit();
        Ok(OrderPage {
            orders: page.items,
            total: page.total,
            page: filter.page(),
            pages: page.total.div_ceil(u64::from(limit)) as u32,
        })
    }

    /// Admin-only status transition.
    ///
    /// Confirming a bulk order performs the deferred stock deduction: every
    /// line is atomically re-checked and decremented, and a shortfall
    /// aborts the whole update with the status unchanged. Delivery stamps
    /// payment without overwriting an earlier `paid_at`.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_status(
        &self,
        principal: Principal,
        order_id: OrderId,
        request: UpdateStatus,
    ) -> Result<Order, DomainError> {
        if !principal.is_admin() {
            return Err(DomainError::NotAuthorized);
        }

        let mut order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        let new_status = request.order_status;
        if !order.status.can_transition_to(new_status) {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        if let Some(tracking) = request.tracking_number {
            order.tracking_number = Some(tracking);
        }

        if order.is_bulk_order && new_status == OrderStatus::Confirmed {
            match self.store.try_deduct_all(&order.deduction_lines()).await? {
                DeductOutcome::Applied => {}
                DeductOutcome::Missing { product_id } => {
                    return Err(DomainError::ProductNotFound(product_id));
                }
                DeductOutcome::Insufficient {
                    product_id,
                    available,
                    requested,
                } => {
                    let name = order
                        .line_name(product_id)
                        .map_or_else(|| product_id.to_string(), str::to_string);
                    return Err(DomainError::InsufficientStock {
                        name,
                        available,
                        requested,
                    });
                }
            }
            order.is_paid = true;
            order.paid_at = Some(chrono::Utc::now());
        }

        if new_status == OrderStatus::Delivered {
            order.is_paid = true;
            if order.paid_at.is_none() {
                order.paid_at = Some(chrono::Utc::now());
            }
        }

        order.status = new_status;
        self.store.save_order(&order).await?;

        tracing::info!(order_id = %order.id, status = %order.status, "order status updated");
        Ok(order)
    }

    /// Owner-only cancellation, permitted while Pending or Quote Requested.
    ///
    /// Normal orders had stock deducted at creation, so every line is
    /// restored; bulk orders had no deduction to undo. The status guard
    /// makes a second cancellation illegal, so stock is never restored
    /// twice.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        principal: Principal,
        order_id: OrderId,
    ) -> Result<Order, DomainError> {
        let mut order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        // Admins cancel through update_status; this path is owner-only.
        if order.user_id != principal.user_id {
            return Err(DomainError::NotAuthorized);
        }

        if !order.status.user_can_cancel() {
            return Err(DomainError::InvalidStateForCancellation {
                current: order.status,
            });
        }

        if !order.is_bulk_order {
            let validator = self.validator();
            for (product_id, quantity) in order.deduction_lines() {
                validator.restore(product_id, quantity).await?;
            }
        }

        order.status = OrderStatus::Cancelled;
        self.store.save_order(&order).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order.id, was_bulk = order.is_bulk_order, "order cancelled");
        Ok(order)
    }
}
