use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::aggregate::Order;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Events - Domain Events for Order Aggregate
// ============================================================================
//
// Events are immutable once built and never persisted by this crate; they
// only travel through the hub to connected subscribers.
//
// ============================================================================

/// Order Event - Union type for all order events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Created(OrderCreated),
    StatusChanged(OrderStatusChanged),
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => "OrderCreated",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
        }
    }

    /// Full order snapshot carried by the event.
    pub fn order(&self) -> &Order {
        match self {
            OrderEvent::Created(e) => &e.order,
            OrderEvent::StatusChanged(e) => &e.order,
        }
    }

    pub fn order_number(&self) -> &str {
        &self.order().order_number
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Created(e) => e.timestamp,
            OrderEvent::StatusChanged(e) => e.timestamp,
        }
    }
}

/// Order Created - Initial event in order lifecycle
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderCreated {
    pub order: Order,
    pub timestamp: DateTime<Utc>,
}

/// Order Status Changed - emitted on every status set, even a repeated one
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderStatusChanged {
    pub order: Order,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}
