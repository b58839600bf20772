//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Transitions:
/// ```text
/// Pending ─────────┬──► Confirmed ──► Processing ──► Shipped ──► Delivered
/// Quote Requested ─┘        │
///        │                  │
///        └──────────────────┴──► Cancelled
/// ```
/// `Delivered` and `Cancelled` are terminal. The transition table is
/// enforced; an admin update naming an illegal move is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Normal order placed, awaiting confirmation.
    #[default]
    Pending,

    /// Bulk order awaiting admin review and manual pricing.
    #[serde(rename = "Quote Requested")]
    QuoteRequested,

    /// Payment confirmed / quote accepted.
    Confirmed,

    /// Being packed.
    Processing,

    /// Dispatched.
    Shipped,

    /// Received by the customer (terminal).
    Delivered,

    /// Cancelled (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the state machine permits moving to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed | Cancelled)
                | (QuoteRequested, Confirmed | Cancelled)
                | (Confirmed, Processing | Cancelled)
                | (Processing, Shipped)
                | (Shipped, Delivered)
        )
    }

    /// Returns true if the owning user may still cancel.
    pub fn user_can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::QuoteRequested)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the wire string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::QuoteRequested => "Quote Requested",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn pending_and_quote_requested_confirm_or_cancel() {
        for from in [Pending, QuoteRequested] {
            assert!(from.can_transition_to(Confirmed));
            assert!(from.can_transition_to(Cancelled));
            assert!(!from.can_transition_to(Shipped));
            assert!(!from.can_transition_to(Delivered));
        }
    }

    #[test]
    fn fulfillment_chain() {
        assert!(Confirmed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(!Processing.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_go_nowhere() {
        for terminal in [Delivered, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                Pending,
                QuoteRequested,
                Confirmed,
                Processing,
                Shipped,
                Delivered,
                Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn no_self_transitions() {
        for s in [Pending, QuoteRequested, Confirmed, Processing, Shipped] {
            assert!(!s.can_transition_to(s));
        }
    }

    #[test]
    fn user_cancel_window() {
        assert!(Pending.user_can_cancel());
        assert!(QuoteRequested.user_can_cancel());
        assert!(!Confirmed.user_can_cancel());
        assert!(!Shipped.user_can_cancel());
    }

    #[test]
    fn quote_requested_wire_string() {
        let json = serde_json::to_string(&QuoteRequested).unwrap();
        assert_eq!(json, "\"Quote Requested\"");
        let back: OrderStatus = serde_json::from_str("\"Quote Requested\"").unwrap();
        assert_eq!(back, QuoteRequested);
    }
}
