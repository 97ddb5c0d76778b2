use uuid::Uuid;

use crate::store::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("An order with number {0} already exists")]
    Conflict(String),

    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid order: {0}")]
    Validation(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            // The unique index is the only backstop for concurrent creation
            // of the same number, so it must read as a plain conflict.
            StoreError::DuplicateOrderNumber(number) => OrderError::Conflict(number),
            StoreError::Backend(msg) => OrderError::Storage(msg),
        }
    }
}
