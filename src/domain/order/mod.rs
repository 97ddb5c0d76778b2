// ============================================================================
// Order Domain - Business Logic for the Order lifecycle
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderStatus, DeliveryAddress)
// - Events (OrderCreated, OrderStatusChanged)
// - Commands (CreateOrder, SetStatus)
// - Errors (OrderError enum)
// - Aggregate (Order with its invariants)
// - Lifecycle manager (OrderLifecycleManager)
//
// Storage and broadcasting are collaborators reached through `store` and `hub`.
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
