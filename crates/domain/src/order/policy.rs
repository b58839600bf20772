//! Bulk-order policy.

use super::status::OrderStatus;

/// Orders whose total unit count exceeds this are routed to the manual
/// quote workflow instead of immediate fulfillment.
pub const BULK_ORDER_THRESHOLD: u32 = 50;

/// The result of classifying a checkout's total quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkClassification {
    pub is_bulk: bool,
    pub status: OrderStatus,
}

/// Classifies the summed quantity of a whole checkout — not any single
/// line — against the fixed threshold.
pub fn classify(total_quantity: u32) -> BulkClassification {
    let is_bulk = total_quantity > BULK_ORDER_THRESHOLD;
    BulkClassification {
        is_bulk,
        status: if is_bulk {
            OrderStatus::QuoteRequested
        } else {
            OrderStatus::Pending
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_boundary() {
        let at = classify(50);
        assert!(!at.is_bulk);
        assert_eq!(at.status, OrderStatus::Pending);

        let above = classify(51);
        assert!(above.is_bulk);
        assert_eq!(above.status, OrderStatus::QuoteRequested);
    }

    #[test]
    fn small_orders_are_normal() {
        assert!(!classify(1).is_bulk);
        assert!(!classify(0).is_bulk);
    }
}
