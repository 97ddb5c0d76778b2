use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderStore, StoreError};
use crate::domain::order::{Order, OrderStatus};

/// Process-local order store with a unique index on the order number.
///
/// Used by the demo binary and tests; a real deployment plugs a database in
/// behind [`OrderStore`].
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<Uuid, Order>,
    by_number: HashMap<String, Uuid>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .by_number
            .get(order_number)
            .and_then(|id| tables.orders.get(id))
            .cloned())
    }

    async fn insert(&self, order: Order) -> Result<Order, StoreError> {
        let mut tables = self.inner.write().await;

        if tables.by_number.contains_key(&order.order_number) {
            tracing::debug!(
                order_number = %order.order_number,
                "Unique index rejected duplicate order number"
            );
            return Err(StoreError::DuplicateOrderNumber(order.order_number));
        }

        tables.by_number.insert(order.order_number.clone(), order.id);
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<bool, StoreError> {
        let mut tables = self.inner.write().await;
        match tables.orders.get_mut(&id) {
            Some(order) => {
                order
                    .apply_status(status, Utc::now())
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let tables = self.inner.read().await;
        let mut orders: Vec<Order> = tables.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }
}
