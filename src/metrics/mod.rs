// Private module declaration
mod server;

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers:
// - Order lifecycle outcomes (created, conflicts, status changes)
// - Hub fanout (published events, deliveries, drops, pruned subscribers)
// - Dashboard aggregation (ticks, malformed samples)
//
// Each `Metrics` owns its own registry so tests never collide on names.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Lifecycle
    pub orders_created: IntCounter,
    pub order_conflicts: IntCounter,
    pub status_changes: IntCounterVec,

    // Hub
    pub events_published: IntCounterVec,
    pub deliveries: IntCounterVec,
    pub dropped_deliveries: IntCounterVec,
    pub pruned_subscribers: IntCounter,
    pub connected_subscribers: IntGauge,

    // Dashboard
    pub aggregator_ticks: IntCounter,
    pub malformed_samples: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Orders successfully created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_conflicts = IntCounter::new(
            "order_conflicts_total",
            "Order creations rejected for a duplicate order number",
        )?;
        registry.register(Box::new(order_conflicts.clone()))?;

        let status_changes = IntCounterVec::new(
            Opts::new("order_status_changes_total", "Order status updates by resulting status"),
            &["status"],
        )?;
        registry.register(Box::new(status_changes.clone()))?;

        let events_published = IntCounterVec::new(
            Opts::new("hub_events_published_total", "Wire events handed to the hub"),
            &["event"],
        )?;
        registry.register(Box::new(events_published.clone()))?;

        let deliveries = IntCounterVec::new(
            Opts::new("hub_deliveries_total", "Wire events queued to a subscriber"),
            &["event"],
        )?;
        registry.register(Box::new(deliveries.clone()))?;

        let dropped_deliveries = IntCounterVec::new(
            Opts::new("hub_dropped_deliveries_total", "Wire events not delivered to a subscriber"),
            &["reason"],
        )?;
        registry.register(Box::new(dropped_deliveries.clone()))?;

        let pruned_subscribers = IntCounter::new(
            "hub_pruned_subscribers_total",
            "Subscribers removed after their connection went away",
        )?;
        registry.register(Box::new(pruned_subscribers.clone()))?;

        let connected_subscribers =
            IntGauge::new("hub_connected_subscribers", "Currently registered subscribers")?;
        registry.register(Box::new(connected_subscribers.clone()))?;

        let aggregator_ticks = IntCounter::new(
            "dashboard_aggregator_ticks_total",
            "Window aggregator recomputations across all sessions",
        )?;
        registry.register(Box::new(aggregator_ticks.clone()))?;

        let malformed_samples = IntCounter::new(
            "dashboard_malformed_samples_total",
            "Raw timestamps skipped by the window aggregator",
        )?;
        registry.register(Box::new(malformed_samples.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_conflicts,
            status_changes,
            events_published,
            deliveries,
            dropped_deliveries,
            pruned_subscribers,
            connected_subscribers,
            aggregator_ticks,
            malformed_samples,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_status_change(&self, status: &str) {
        self.status_changes.with_label_values(&[status]).inc();
    }

    pub fn record_published(&self, event: &str) {
        self.events_published.with_label_values(&[event]).inc();
    }

    pub fn record_delivery(&self, event: &str) {
        self.deliveries.with_label_values(&[event]).inc();
    }

    /// `reason` is `"buffer_full"` or `"disconnected"`.
    pub fn record_dropped(&self, reason: &str) {
        self.dropped_deliveries.with_label_values(&[reason]).inc();
    }

    pub fn record_tick(&self, malformed: usize) {
        self.aggregator_ticks.inc();
        if malformed > 0 {
            self.malformed_samples.inc_by(malformed as u64);
        }
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("families", &self.registry.gather().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_value(metrics: &Metrics, name: &str) -> Option<f64> {
        metrics
            .registry()
            .gather()
            .iter()
            .find(|m| m.name() == name)
            .and_then(|m| m.metric.first().and_then(|s| s.counter.value))
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        // Vec metrics only show up once a label set is used.
        assert!(metrics.registry().gather().len() >= 6);
    }

    #[test]
    fn test_record_tick_counts_malformed_samples() {
        let metrics = Metrics::new().unwrap();
        metrics.record_tick(0);
        metrics.record_tick(3);

        assert_eq!(counter_value(&metrics, "dashboard_aggregator_ticks_total"), Some(2.0));
        assert_eq!(counter_value(&metrics, "dashboard_malformed_samples_total"), Some(3.0));
    }

    #[test]
    fn test_record_dropped_by_reason() {
        let metrics = Metrics::new().unwrap();
        metrics.record_dropped("buffer_full");
        metrics.record_dropped("disconnected");
        metrics.record_dropped("disconnected");

        let gathered = metrics.registry().gather();
        let dropped = gathered
            .iter()
            .find(|m| m.name() == "hub_dropped_deliveries_total")
            .unwrap();
        assert_eq!(dropped.metric.len(), 2);
    }
}
