use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

pub const MAX_ORDER_NUMBER_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Lifecycle status of an order.
///
/// The machine has exactly two states and every transition between them is
/// legal, including a transition to the current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    New,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::Delivered => "Delivered",
        }
    }

    /// Every pair of statuses is a valid transition; there is no terminal state.
    pub fn can_transition_to(&self, _next: OrderStatus) -> bool {
        true
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // "novo" and "entregue" are the keys older clients send.
            "new" | "novo" => Ok(OrderStatus::New),
            "delivered" | "entregue" => Ok(OrderStatus::Delivered),
            other => Err(OrderError::Validation(format!("unknown order status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub cep: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Checks the order number constraints that the lifecycle manager owns.
pub fn validate_order_number(order_number: &str) -> Result<(), OrderError> {
    if order_number.trim().is_empty() {
        return Err(OrderError::Validation("order number is required".to_string()));
    }
    if order_number.chars().count() > MAX_ORDER_NUMBER_LEN {
        return Err(OrderError::Validation(format!(
            "order number must be at most {MAX_ORDER_NUMBER_LEN} characters"
        )));
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parses_case_insensitively() {
        assert_eq!("new".parse::<OrderStatus>().unwrap(), OrderStatus::New);
        assert_eq!(" Delivered ".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_accepts_legacy_keys() {
        assert_eq!("novo".parse::<OrderStatus>().unwrap(), OrderStatus::New);
        assert_eq!("Entregue".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
    }

    #[test]
    fn test_every_transition_is_legal() {
        for from in [OrderStatus::New, OrderStatus::Delivered] {
            for to in [OrderStatus::New, OrderStatus::Delivered] {
                assert!(from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn test_order_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Delivered).unwrap();
        assert_eq!(json, "\"Delivered\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::Delivered);
    }

    #[test]
    fn test_order_number_validation() {
        assert!(validate_order_number("ORD-1").is_ok());
        assert!(validate_order_number("   ").is_err());
        assert!(validate_order_number(&"9".repeat(MAX_ORDER_NUMBER_LEN + 1)).is_err());
    }
}
