use chrono::DateTime;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::clock::Clock;
use super::scale::ScaleStabilizer;
use super::window::{WindowAggregator, WindowSnapshot};
use crate::config::WindowConfig;
use crate::hub::{Broadcaster, HubError, NotifyKind, SubscriberId, Subscription, WireEvent};
use crate::metrics::Metrics;

// ============================================================================
// Dashboard Session - one live chart per subscriber
// ============================================================================
//
// A single task owns the aggregator and the stabilizer and selects over:
// - the subscriber queue (notify events are stamped on arrival)
// - a fixed-cadence ticker
// - a shutdown signal
//
// Appends and ticks therefore never interleave. Each recomputation is
// published as a `ChartFrame` on a watch channel for the renderer.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub kind: NotifyKind,
    pub name: &'static str,
    pub points: Vec<(i64, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFrame {
    pub sequence: u64,
    pub window_start: i64,
    pub window_end: i64,
    /// `HH:MM:SS - HH:MM:SS` in UTC.
    pub time_range: String,
    pub series: Vec<ChartSeries>,
    pub y_max: u64,
}

impl ChartFrame {
    fn from_snapshot(sequence: u64, snapshot: &WindowSnapshot, y_max: u64) -> Self {
        let series = NotifyKind::ALL
            .iter()
            .map(|kind| ChartSeries {
                kind: *kind,
                name: kind.label(),
                points: snapshot.series(*kind),
            })
            .collect();

        Self {
            sequence,
            window_start: snapshot.window_start,
            window_end: snapshot.window_end,
            time_range: format!(
                "{} - {}",
                clock_label(snapshot.window_start),
                clock_label(snapshot.window_end)
            ),
            series,
            y_max,
        }
    }

    pub fn series(&self, kind: NotifyKind) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.kind == kind)
    }

    pub fn total(&self, kind: NotifyKind) -> u64 {
        self.series(kind)
            .map(|s| s.points.iter().map(|(_, c)| c).sum())
            .unwrap_or(0)
    }
}

fn clock_label(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

pub struct DashboardSession {
    aggregator: WindowAggregator,
    scale: ScaleStabilizer,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    frames: watch::Sender<ChartFrame>,
    sequence: u64,
}

impl DashboardSession {
    /// Subscribe to `broadcaster` and start the session task.
    pub async fn spawn(
        broadcaster: &Broadcaster,
        config: &WindowConfig,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> Result<DashboardHandle, HubError> {
        let subscription = broadcaster.subscribe().await?;
        let subscriber_id = subscription.id();

        let mut aggregator = WindowAggregator::new(config);
        let mut scale = ScaleStabilizer::default();
        let initial = aggregator.tick(clock.now_millis());
        let y_max = scale.observe(initial.observed_max());
        let (frames, receiver) = watch::channel(ChartFrame::from_snapshot(0, &initial, y_max));

        let session = Self {
            aggregator,
            scale,
            clock,
            metrics,
            frames,
            sequence: 0,
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(session.run(subscription, config.tick_interval(), shutdown_rx));

        tracing::info!(subscriber_id = %subscriber_id, "Dashboard session started");

        Ok(DashboardHandle {
            subscriber_id,
            frames: receiver,
            shutdown: Some(shutdown_tx),
            task,
            broadcaster: broadcaster.clone(),
        })
    }

    async fn run(
        mut self,
        mut subscription: Subscription,
        period: Duration,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let subscriber_id = subscription.id();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!(subscriber_id = %subscriber_id, "Dashboard session shutdown requested");
                    break;
                }
                event = subscription.recv() => match event {
                    Some(event) => self.on_wire(event),
                    None => {
                        tracing::info!(subscriber_id = %subscriber_id, "Subscription closed, stopping dashboard session");
                        break;
                    }
                },
                _ = ticker.tick() => self.refresh(),
            }
        }
    }

    fn on_wire(&mut self, event: WireEvent) {
        // Full snapshots feed list views, not the chart.
        let Some(kind) = event.notify_kind() else {
            return;
        };

        self.aggregator.on_event(kind, self.clock.now_millis());
        self.refresh();
    }

    fn refresh(&mut self) {
        let snapshot = self.aggregator.tick(self.clock.now_millis());
        self.metrics.record_tick(snapshot.malformed);

        let y_max = self.scale.observe(snapshot.observed_max());
        self.sequence += 1;
        self.frames
            .send_replace(ChartFrame::from_snapshot(self.sequence, &snapshot, y_max));
    }
}

/// Owner-side handle of a running session.
pub struct DashboardHandle {
    subscriber_id: SubscriberId,
    frames: watch::Receiver<ChartFrame>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    broadcaster: Broadcaster,
}

impl DashboardHandle {
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    pub fn frames(&self) -> watch::Receiver<ChartFrame> {
        self.frames.clone()
    }

    pub fn latest(&self) -> ChartFrame {
        self.frames.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the ticker, leave the hub and drop the timestamp logs.
    pub async fn shutdown(mut self) {
        if let Some(signal) = self.shutdown.take() {
            let _ = signal.send(());
        }
        self.broadcaster.unsubscribe(self.subscriber_id).await;

        if let Err(e) = self.task.await {
            tracing::warn!(subscriber_id = %self.subscriber_id, error = %e, "Dashboard session task failed");
        }
        tracing::info!(subscriber_id = %self.subscriber_id, "Dashboard session stopped");
    }
}
