use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use kameo::{Actor, Reply};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use super::wire::WireEvent;
use crate::metrics::Metrics;

// ============================================================================
// Subscriber Registry Actor - single writer over the connection table
// ============================================================================
//
// Responsibilities:
// - Own the table of live subscribers, keyed by connection id
// - Hand out a bounded queue per subscriber on registration
// - Fan published events out with non-blocking sends
// - Prune subscribers whose receiving side has gone away
//
// Registration, removal and fanout are all mailbox messages, so iteration
// for delivery never observes a half-applied mutation.
//
// ============================================================================

pub type SubscriberId = Uuid;

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug)]
pub struct Register;

#[derive(Debug)]
pub struct Unregister {
    pub id: SubscriberId,
}

#[derive(Debug)]
pub struct Publish {
    pub events: Vec<WireEvent>,
}

#[derive(Debug)]
pub struct CountSubscribers;

/// The receiving half of one subscriber's queue.
#[derive(Debug, Reply)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<WireEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next delivered event; `None` once the registry dropped this subscriber
    /// or shut down.
    pub async fn recv(&mut self) -> Option<WireEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<WireEvent, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Outcome of one fanout, counted per (subscriber, wire event) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reply)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
    pub pruned: usize,
    pub subscribers: usize,
}

// ============================================================================
// Registry Actor
// ============================================================================

pub struct SubscriberRegistry {
    subscribers: HashMap<SubscriberId, mpsc::Sender<WireEvent>>,
    buffer: usize,
    metrics: Arc<Metrics>,
}

impl SubscriberRegistry {
    pub fn new(buffer: usize, metrics: Arc<Metrics>) -> Self {
        Self {
            subscribers: HashMap::new(),
            buffer: buffer.max(1),
            metrics,
        }
    }

    fn sync_gauge(&self) {
        self.metrics
            .connected_subscribers
            .set(self.subscribers.len() as i64);
    }

    fn fanout(&mut self, events: &[WireEvent]) -> PublishReport {
        let mut report = PublishReport::default();
        let mut gone = Vec::new();

        for (id, sender) in &self.subscribers {
            for event in events {
                match sender.try_send(event.clone()) {
                    Ok(()) => {
                        report.delivered += 1;
                        self.metrics.record_delivery(event.name());
                    }
                    Err(TrySendError::Full(_)) => {
                        report.dropped += 1;
                        self.metrics.record_dropped("buffer_full");
                        tracing::debug!(
                            subscriber_id = %id,
                            event = event.name(),
                            "Subscriber queue full, dropping event"
                        );
                    }
                    Err(TrySendError::Closed(_)) => {
                        report.dropped += 1;
                        self.metrics.record_dropped("disconnected");
                        tracing::warn!(
                            subscriber_id = %id,
                            event = event.name(),
                            "Subscriber disconnected before delivery"
                        );
                        gone.push(*id);
                        break;
                    }
                }
            }
        }

        for id in gone {
            self.subscribers.remove(&id);
            report.pruned += 1;
            self.metrics.pruned_subscribers.inc();
        }

        report.subscribers = self.subscribers.len();
        self.sync_gauge();
        report
    }
}

impl Actor for SubscriberRegistry {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, _actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!(buffer = state.buffer, "SubscriberRegistry started");
        Ok(state)
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<Register> for SubscriberRegistry {
    type Reply = Subscription;

    async fn handle(&mut self, _msg: Register, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(self.buffer);
        self.subscribers.insert(id, sender);
        self.sync_gauge();

        tracing::info!(
            subscriber_id = %id,
            subscribers = self.subscribers.len(),
            "Subscriber registered"
        );

        Subscription { id, receiver }
    }
}

impl Message<Unregister> for SubscriberRegistry {
    type Reply = bool;

    async fn handle(&mut self, msg: Unregister, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let removed = self.subscribers.remove(&msg.id).is_some();
        if removed {
            self.sync_gauge();
            tracing::info!(
                subscriber_id = %msg.id,
                subscribers = self.subscribers.len(),
                "Subscriber unregistered"
            );
        }
        removed
    }
}

impl Message<Publish> for SubscriberRegistry {
    type Reply = PublishReport;

    async fn handle(&mut self, msg: Publish, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        for event in &msg.events {
            self.metrics.record_published(event.name());
        }

        let report = self.fanout(&msg.events);

        tracing::debug!(
            events = msg.events.len(),
            delivered = report.delivered,
            dropped = report.dropped,
            pruned = report.pruned,
            "Fanout complete"
        );

        report
    }
}

impl Message<CountSubscribers> for SubscriberRegistry {
    type Reply = usize;

    async fn handle(
        &mut self,
        _msg: CountSubscribers,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.subscribers.len()
    }
}
