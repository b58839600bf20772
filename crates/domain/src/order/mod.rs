//! Orders: the immutable record of a completed checkout and the engine
//! that creates and transitions them.

mod engine;
mod policy;
mod status;

pub use engine::{OrderEngine, OrderPage, PlaceOrder, PlacedOrder, UpdateStatus};
pub use policy::{BULK_ORDER_THRESHOLD, BulkClassification, classify};
pub use status::OrderStatus;

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::product::Size;
use crate::user::Address;

/// Accepted payment methods. Bulk orders are always Bank Transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "COD")]
    Cod,
    #[default]
    Online,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Cod => "COD",
            PaymentMethod::Online => "Online",
            PaymentMethod::BankTransfer => "Bank Transfer",
        };
        write!(f, "{s}")
    }
}

/// One order line, frozen at purchase time.
///
/// Name and price are snapshots, not references: later product edits or
/// deletion never change what this order shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub size: Size,
    pub price_at_purchase: Money,
}

impl OrderLine {
    /// Total for this line.
    pub fn line_total(&self) -> Money {
        self.price_at_purchase.multiply(self.quantity)
    }
}

/// The shipping address copied — not referenced — from the user's address
/// book at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl From<&Address> for ShippingAddress {
    fn from(a: &Address) -> Self {
        Self {
            label: a.label.clone(),
            street: a.street.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            postal_code: a.postal_code.clone(),
            country: a.country.clone(),
        }
    }
}

/// A placed order. Immutable once created except for the status, payment,
/// and tracking fields; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub total_price: Money,
    pub is_bulk_order: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_order_note: Option<String>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Total unit count across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// (product, quantity) pairs for stock mutation.
    pub fn deduction_lines(&self) -> Vec<(ProductId, u32)> {
        self.lines.iter().map(|l| (l.product_id, l.quantity)).collect()
    }

    /// The snapshot name for a product in this order, if present.
    pub fn line_name(&self, product_id: ProductId) -> Option<&str> {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map(|l| l.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total() {
        let line = OrderLine {
            product_id: ProductId::new(),
            name: "Linen Shirt".to_string(),
            quantity: 3,
            size: Size::M,
            price_at_purchase: Money::from_cents(1000),
        };
        assert_eq!(line.line_total().cents(), 3000);
    }

    #[test]
    fn payment_method_wire_strings() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"Bank Transfer\""
        );
        assert_eq!(serde_json::to_string(&PaymentMethod::Cod).unwrap(), "\"COD\"");
        let back: PaymentMethod = serde_json::from_str("\"Online\"").unwrap();
        assert_eq!(back, PaymentMethod::Online);
    }
}
