use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::NewOrder;
use super::errors::OrderError;
use super::events::{OrderCreated, OrderEvent, OrderStatusChanged};
use super::value_objects::{validate_order_number, DeliveryAddress, OrderStatus, MAX_DESCRIPTION_LEN};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// The order is owned by the lifecycle manager only for the duration of a
// mutation; between mutations it lives in the external store. Every
// successful mutation yields exactly one domain event.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub order_number: String,

    // Current State
    pub description: String,
    pub value: Decimal,
    pub delivery_address: DeliveryAddress,
    pub status: OrderStatus,

    // Ownership
    pub user_id: String,
    pub user_name: Option<String>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Build a fresh order in the `New` state from a validated command.
    pub fn create(command: NewOrder, now: DateTime<Utc>) -> Result<(Self, OrderEvent), OrderError> {
        Self::validate(&command)?;

        let order = Self {
            id: Uuid::new_v4(),
            order_number: command.order_number,
            description: command.description,
            value: command.value,
            delivery_address: command.delivery_address,
            status: OrderStatus::New,
            user_id: command.owner_id,
            user_name: command.owner_name,
            created_at: now,
            updated_at: None,
        };

        let event = OrderEvent::Created(OrderCreated {
            order: order.clone(),
            timestamp: now,
        });

        Ok((order, event))
    }

    /// Move the order to `status`. Setting the current status again is still a
    /// transition and still touches `updated_at`.
    pub fn apply_status(&mut self, status: OrderStatus, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_transition_to(status) {
            return Err(OrderError::Validation(format!(
                "cannot move order {} from {} to {}",
                self.order_number, self.status, status
            )));
        }
        self.status = status;
        self.updated_at = Some(now);
        Ok(())
    }

    /// Snapshot the current state as a status-changed event.
    pub fn status_changed(&self, now: DateTime<Utc>) -> OrderEvent {
        OrderEvent::StatusChanged(OrderStatusChanged {
            order: self.clone(),
            status: self.status,
            timestamp: now,
        })
    }

    fn validate(command: &NewOrder) -> Result<(), OrderError> {
        validate_order_number(&command.order_number)?;

        if command.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(OrderError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }

        if command.value <= Decimal::ZERO {
            return Err(OrderError::Validation("value must be greater than zero".to_string()));
        }

        Ok(())
    }
}
