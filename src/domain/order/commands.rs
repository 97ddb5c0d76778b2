use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{DeliveryAddress, OrderStatus};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    CreateOrder(NewOrder),
    SetStatus {
        order_id: Uuid,
        status: OrderStatus,
    },
}

/// Everything needed to create an order. The owner is resolved by the
/// (external) authentication layer before the command reaches us.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_number: String,
    pub description: String,
    pub value: Decimal,
    pub delivery_address: DeliveryAddress,
    pub owner_id: String,
    pub owner_name: Option<String>,
}
