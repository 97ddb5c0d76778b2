// ============================================================================
// Event Hub - fanout of order events to live subscribers
// ============================================================================
//
// Delivery is best-effort and at-most-once per connected subscriber:
// - no retries, no acknowledgements, no persistence
// - a full subscriber queue drops the event for that subscriber only
// - a vanished subscriber is pruned, never reported to the publisher
// - events from one publisher reach each subscriber in publish order
//
// ============================================================================

mod registry;
pub mod wire;

use kameo::actor::ActorRef;
use kameo::Actor;
use std::sync::Arc;

use crate::config::HubConfig;
use crate::domain::order::OrderEvent;
use crate::metrics::Metrics;

pub use registry::{PublishReport, SubscriberId, SubscriberRegistry, Subscription};
pub use wire::{NotifyKind, WireEvent};

use registry::{CountSubscribers, Publish, Register, Unregister};

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("subscriber registry is not running")]
    RegistryUnavailable,
}

/// Cloneable handle to the subscriber registry.
///
/// The registry lives as long as any handle does, or until [`Broadcaster::shutdown`].
#[derive(Clone)]
pub struct Broadcaster {
    registry: ActorRef<SubscriberRegistry>,
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("registry", &self.registry.id())
            .finish()
    }
}

impl Broadcaster {
    pub fn spawn(config: &HubConfig, metrics: Arc<Metrics>) -> Self {
        let registry =
            SubscriberRegistry::spawn(SubscriberRegistry::new(config.subscriber_buffer, metrics));
        Self { registry }
    }

    pub async fn subscribe(&self) -> Result<Subscription, HubError> {
        self.registry
            .ask(Register)
            .await
            .map_err(|_| HubError::RegistryUnavailable)
    }

    /// Remove a subscriber. Unknown ids and a stopped registry are both fine:
    /// either way the subscriber is no longer registered.
    pub async fn unsubscribe(&self, id: SubscriberId) {
        if self.registry.ask(Unregister { id }).await.is_err() {
            tracing::debug!(subscriber_id = %id, "Unsubscribe after registry shutdown");
        }
    }

    /// Fan a domain event out to every currently registered subscriber.
    pub async fn publish(&self, event: &OrderEvent) -> Result<PublishReport, HubError> {
        self.publish_wire(WireEvent::from_domain(event)).await
    }

    pub async fn publish_wire(&self, events: Vec<WireEvent>) -> Result<PublishReport, HubError> {
        self.registry
            .ask(Publish { events })
            .await
            .map_err(|_| HubError::RegistryUnavailable)
    }

    pub async fn subscriber_count(&self) -> Result<usize, HubError> {
        self.registry
            .ask(CountSubscribers)
            .await
            .map_err(|_| HubError::RegistryUnavailable)
    }

    /// Stop the registry. Every subscriber queue closes once the pending
    /// mailbox drains.
    pub async fn shutdown(&self) {
        tracing::info!("🛑 Shutting down subscriber registry");
        if self.registry.stop_gracefully().await.is_err() {
            tracing::debug!("Subscriber registry already stopped");
        }
    }
}
