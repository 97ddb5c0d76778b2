use serde::{Deserialize, Serialize};

use crate::domain::order::{Order, OrderEvent, OrderStatus};

// ============================================================================
// Wire Contract
// ============================================================================
//
// One domain event fans out as one full-snapshot event (for list views)
// followed by at most one notify event carrying only the order number (for
// the dashboard aggregator).
//
//   OrderCreated                    -> new-order, new-order-notify
//   OrderStatusChanged(New)         -> order-status-changed, new-order-notify
//   OrderStatusChanged(Delivered)   -> order-status-changed, delivered-order-notify
//
// ============================================================================

pub const NEW_ORDER: &str = "new-order";
pub const ORDER_STATUS_CHANGED: &str = "order-status-changed";
pub const NEW_ORDER_NOTIFY: &str = "new-order-notify";
pub const DELIVERED_ORDER_NOTIFY: &str = "delivered-order-notify";

/// Event kinds counted by the dashboard aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotifyKind {
    NewOrder,
    Delivered,
}

impl NotifyKind {
    pub const ALL: [NotifyKind; 2] = [NotifyKind::NewOrder, NotifyKind::Delivered];

    pub fn for_status(status: OrderStatus) -> Self {
        match status {
            OrderStatus::New => NotifyKind::NewOrder,
            OrderStatus::Delivered => NotifyKind::Delivered,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotifyKind::NewOrder => "New orders",
            NotifyKind::Delivered => "Delivered orders",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WireEvent {
    NewOrder(Order),
    OrderStatusChanged(Order),
    NewOrderNotify(String),
    DeliveredOrderNotify(String),
}

/// JSON frame handed to a transport: `{"event": ..., "payload": ...}`.
#[derive(Debug, Serialize)]
struct WireFrame<'a> {
    event: &'a str,
    payload: serde_json::Value,
}

impl WireEvent {
    /// Expand a domain event into the wire events it produces, in delivery order.
    pub fn from_domain(event: &OrderEvent) -> Vec<WireEvent> {
        match event {
            OrderEvent::Created(e) => vec![
                WireEvent::NewOrder(e.order.clone()),
                WireEvent::NewOrderNotify(e.order.order_number.clone()),
            ],
            OrderEvent::StatusChanged(e) => {
                let notify = match NotifyKind::for_status(e.status) {
                    NotifyKind::NewOrder => WireEvent::NewOrderNotify(e.order.order_number.clone()),
                    NotifyKind::Delivered => {
                        WireEvent::DeliveredOrderNotify(e.order.order_number.clone())
                    }
                };
                vec![WireEvent::OrderStatusChanged(e.order.clone()), notify]
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WireEvent::NewOrder(_) => NEW_ORDER,
            WireEvent::OrderStatusChanged(_) => ORDER_STATUS_CHANGED,
            WireEvent::NewOrderNotify(_) => NEW_ORDER_NOTIFY,
            WireEvent::DeliveredOrderNotify(_) => DELIVERED_ORDER_NOTIFY,
        }
    }

    /// Which aggregator series this event feeds, if any.
    pub fn notify_kind(&self) -> Option<NotifyKind> {
        match self {
            WireEvent::NewOrderNotify(_) => Some(NotifyKind::NewOrder),
            WireEvent::DeliveredOrderNotify(_) => Some(NotifyKind::Delivered),
            WireEvent::NewOrder(_) | WireEvent::OrderStatusChanged(_) => None,
        }
    }

    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            WireEvent::NewOrder(order) | WireEvent::OrderStatusChanged(order) => {
                serde_json::to_value(order)
            }
            WireEvent::NewOrderNotify(number) | WireEvent::DeliveredOrderNotify(number) => {
                Ok(serde_json::Value::String(number.clone()))
            }
        }
    }

    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&WireFrame {
            event: self.name(),
            payload: self.payload()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::aggregate::tests::new_order;
    use chrono::Utc;

    #[test]
    fn test_created_expands_to_snapshot_then_notify() {
        let (_, event) = Order::create(new_order("ORD-1"), Utc::now()).unwrap();
        let wire = WireEvent::from_domain(&event);

        let names: Vec<_> = wire.iter().map(WireEvent::name).collect();
        assert_eq!(names, vec![NEW_ORDER, NEW_ORDER_NOTIFY]);
        assert_eq!(wire[1].notify_kind(), Some(NotifyKind::NewOrder));
    }

    #[test]
    fn test_status_change_notify_follows_status() {
        let (mut order, _) = Order::create(new_order("ORD-2"), Utc::now()).unwrap();

        order.apply_status(OrderStatus::Delivered, Utc::now()).unwrap();
        let delivered = WireEvent::from_domain(&order.status_changed(Utc::now()));
        assert_eq!(delivered[0].name(), ORDER_STATUS_CHANGED);
        assert_eq!(delivered[1], WireEvent::DeliveredOrderNotify("ORD-2".to_string()));

        order.apply_status(OrderStatus::New, Utc::now()).unwrap();
        let back_to_new = WireEvent::from_domain(&order.status_changed(Utc::now()));
        assert_eq!(back_to_new[1], WireEvent::NewOrderNotify("ORD-2".to_string()));
    }

    #[test]
    fn test_frame_shape() {
        let frame = WireEvent::DeliveredOrderNotify("ORD-9".to_string()).to_frame().unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(json["event"], DELIVERED_ORDER_NOTIFY);
        assert_eq!(json["payload"], "ORD-9");
    }
}
