// ============================================================================
// Order Storage Seam
// ============================================================================
//
// Persistence is an external collaborator. The lifecycle manager only needs
// the four calls below plus a listing for read views; anything that can
// honour a unique index on the order number can sit behind this trait.
//
// ============================================================================

mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};

pub use memory::InMemoryOrderStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store's unique index rejected a second order with the same number.
    #[error("duplicate order number: {0}")]
    DuplicateOrderNumber(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>, StoreError>;

    /// Insert a new order. Must fail with `DuplicateOrderNumber` when the
    /// number is already taken, even if an earlier lookup said otherwise.
    async fn insert(&self, order: Order) -> Result<Order, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Set the status and stamp `updated_at`. Returns `false` when no order
    /// with that id exists.
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<bool, StoreError>;

    async fn list(&self) -> Result<Vec<Order>, StoreError>;
}
