use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::aggregate::Order;
use super::commands::{NewOrder, OrderCommand};
use super::errors::OrderError;
use super::events::OrderEvent;
use super::value_objects::OrderStatus;
use crate::hub::Broadcaster;
use crate::metrics::Metrics;
use crate::store::OrderStore;

// ============================================================================
// Order Lifecycle Manager
// ============================================================================
//
// Orchestrates: Command → Aggregate → Store → Hub
//
// The store is the source of truth. An event is published only after the
// store accepted the mutation, and a failed publish never fails the command.
//
// ============================================================================

pub struct OrderLifecycleManager {
    store: Arc<dyn OrderStore>,
    broadcaster: Broadcaster,
    metrics: Arc<Metrics>,
}

impl OrderLifecycleManager {
    pub fn new(store: Arc<dyn OrderStore>, broadcaster: Broadcaster, metrics: Arc<Metrics>) -> Self {
        Self {
            store,
            broadcaster,
            metrics,
        }
    }

    /// Dispatch a command and return the resulting order snapshot.
    pub async fn handle(&self, command: OrderCommand) -> Result<Order, OrderError> {
        match command {
            OrderCommand::CreateOrder(new_order) => self.create(new_order).await,
            OrderCommand::SetStatus { order_id, status } => self.set_status(order_id, status).await,
        }
    }

    pub async fn create(&self, new_order: NewOrder) -> Result<Order, OrderError> {
        let (order, event) = Order::create(new_order, Utc::now())?;

        if self.store.find_by_order_number(&order.order_number).await?.is_some() {
            self.metrics.order_conflicts.inc();
            tracing::info!(order_number = %order.order_number, "Rejected duplicate order number");
            return Err(OrderError::Conflict(order.order_number));
        }

        // A concurrent create of the same number can pass the lookup above;
        // the store's unique index settles it.
        let stored = match self.store.insert(order).await {
            Ok(stored) => stored,
            Err(e) => {
                let err = OrderError::from(e);
                if matches!(err, OrderError::Conflict(_)) {
                    self.metrics.order_conflicts.inc();
                    tracing::info!(error = %err, "Store rejected duplicate order number");
                }
                return Err(err);
            }
        };

        self.metrics.orders_created.inc();
        tracing::info!(
            order_id = %stored.id,
            order_number = %stored.order_number,
            "✅ Order created"
        );

        self.publish(&event).await;
        Ok(stored)
    }

    /// Overwrite the status. Setting the current status again is accepted and
    /// emits the same events as a real change.
    pub async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        if self.store.find_by_id(order_id).await?.is_none() {
            return Err(OrderError::NotFound(order_id));
        }

        if !self.store.update_status(order_id, status).await? {
            return Err(OrderError::NotFound(order_id));
        }

        let updated = self
            .store
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        self.metrics.record_status_change(status.as_str());
        tracing::info!(
            order_id = %order_id,
            order_number = %updated.order_number,
            status = %status,
            "Order status updated"
        );

        self.publish(&updated.status_changed(Utc::now())).await;
        Ok(updated)
    }

    pub async fn get(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.store
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))
    }

    pub async fn list(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list().await?)
    }

    async fn publish(&self, event: &OrderEvent) {
        match self.broadcaster.publish(event).await {
            Ok(report) => tracing::debug!(
                event = event.event_type(),
                order_number = event.order_number(),
                delivered = report.delivered,
                dropped = report.dropped,
                "Event broadcast"
            ),
            Err(e) => tracing::warn!(
                event = event.event_type(),
                order_number = event.order_number(),
                error = %e,
                "⚠️ Broadcast failed, order state already persisted"
            ),
        }
    }
}
