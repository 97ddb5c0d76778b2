use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{WindowConfig, MAX_BUCKETS};
use crate::hub::NotifyKind;

// ============================================================================
// Window Aggregator - trailing-window histogram of notify events
// ============================================================================
//
// Raw arrival timestamps are kept per kind and the bucket series is rebuilt
// from them on every tick. Bucket i covers
//
//   [window_start + i * bucket_width, window_start + (i + 1) * bucket_width)
//
// with window_start = now - window_width, and there are
// ceil(window_width / bucket_width) + 1 buckets (never fewer than two).
//
// ============================================================================

/// Timestamps for one kind, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RawTimestampLog {
    samples: Vec<i64>,
}

impl RawTimestampLog {
    pub fn push(&mut self, timestamp_ms: i64) {
        self.samples.push(timestamp_ms);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[i64] {
        &self.samples
    }

    /// Drop everything older than `window_start` and any malformed sample.
    /// Arrival order is only roughly time order, so this is a full pass
    /// rather than a prefix trim. Returns the number of malformed samples.
    fn prune(&mut self, window_start: i64) -> usize {
        let mut malformed = 0;
        self.samples.retain(|&ts| {
            if ts < 0 {
                malformed += 1;
                return false;
            }
            ts >= window_start
        });
        malformed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    pub start: i64,
    pub width: i64,
    pub counts: BTreeMap<NotifyKind, u64>,
}

impl TimeBucket {
    fn empty(start: i64, width: i64) -> Self {
        Self {
            start,
            width,
            counts: NotifyKind::ALL.iter().map(|k| (*k, 0)).collect(),
        }
    }

    pub fn end(&self) -> i64 {
        self.start.saturating_add(self.width)
    }

    pub fn count(&self, kind: NotifyKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Highest count across all kinds in this bucket.
    pub fn peak(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub window_start: i64,
    pub window_end: i64,
    pub buckets: Vec<TimeBucket>,
    /// Samples discarded as malformed during this tick.
    pub malformed: usize,
}

impl WindowSnapshot {
    /// `(bucket_start, count)` points for one kind, ready for a line chart.
    pub fn series(&self, kind: NotifyKind) -> Vec<(i64, u64)> {
        self.buckets.iter().map(|b| (b.start, b.count(kind))).collect()
    }

    pub fn total(&self, kind: NotifyKind) -> u64 {
        self.buckets.iter().map(|b| b.count(kind)).sum()
    }

    /// Highest bucket value across every kind; the scale stabilizer's input.
    pub fn observed_max(&self) -> u64 {
        self.buckets.iter().map(TimeBucket::peak).max().unwrap_or(0)
    }

    /// Bucket containing `timestamp_ms`, if it falls inside the series.
    pub fn bucket_at(&self, timestamp_ms: i64) -> Option<&TimeBucket> {
        self.buckets
            .iter()
            .find(|b| b.start <= timestamp_ms && timestamp_ms < b.end())
    }
}

#[derive(Debug, Clone)]
pub struct WindowAggregator {
    window_width: i64,
    bucket_width: i64,
    logs: BTreeMap<NotifyKind, RawTimestampLog>,
}

impl WindowAggregator {
    /// Widths are clamped so the series never exceeds [`MAX_BUCKETS`] points.
    pub fn new(config: &WindowConfig) -> Self {
        let bucket_width = config.bucket_width_ms.max(1);
        let max_window = bucket_width.saturating_mul(MAX_BUCKETS as i64 - 1);
        Self {
            window_width: config.window_width_ms.clamp(1, max_window),
            bucket_width,
            logs: NotifyKind::ALL
                .iter()
                .map(|k| (*k, RawTimestampLog::default()))
                .collect(),
        }
    }

    pub fn on_event(&mut self, kind: NotifyKind, timestamp_ms: i64) {
        self.logs.entry(kind).or_default().push(timestamp_ms);
    }

    pub fn log(&self, kind: NotifyKind) -> Option<&RawTimestampLog> {
        self.logs.get(&kind)
    }

    pub fn bucket_count(&self) -> usize {
        let spans = (self.window_width as u64).div_ceil(self.bucket_width as u64);
        (spans as usize + 1).max(2)
    }

    /// Prune the logs to the trailing window ending at `now_ms` and rebuild
    /// every bucket from what is left. Two calls with the same logs and
    /// `now_ms` return the same snapshot.
    pub fn tick(&mut self, now_ms: i64) -> WindowSnapshot {
        let window_start = now_ms.saturating_sub(self.window_width);
        let width = self.bucket_width;
        let count = self.bucket_count();

        let mut buckets: Vec<TimeBucket> = (0..count)
            .map(|i| {
                let start = window_start.saturating_add((i as i64).saturating_mul(width));
                TimeBucket::empty(start, width)
            })
            .collect();

        let mut malformed = 0;
        for (kind, log) in self.logs.iter_mut() {
            malformed += log.prune(window_start);

            for &ts in log.samples() {
                // Samples ahead of the last bucket stay in the log and are
                // counted once the window catches up with them.
                let Some(offset) = ts.checked_sub(window_start) else {
                    continue;
                };
                if let Some(bucket) = buckets.get_mut((offset / width) as usize) {
                    *bucket.counts.entry(*kind).or_insert(0) += 1;
                }
            }
        }

        if malformed > 0 {
            tracing::warn!(malformed, "Skipped malformed samples during aggregation");
        }

        WindowSnapshot {
            window_start,
            window_end: now_ms,
            buckets,
            malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn aggregator() -> WindowAggregator {
        WindowAggregator::new(&WindowConfig::default())
    }

    #[test]
    fn test_default_window_has_nineteen_buckets() {
        let snapshot = aggregator().tick(NOW);

        assert_eq!(snapshot.buckets.len(), 19);
        assert_eq!(snapshot.window_start, NOW - 180_000);
        assert_eq!(snapshot.buckets[0].start, NOW - 180_000);
        assert_eq!(snapshot.buckets[18].start, NOW);
    }

    #[test]
    fn test_empty_window_still_has_two_points_per_kind() {
        let mut agg = WindowAggregator::new(&WindowConfig {
            window_width_ms: 10_000,
            bucket_width_ms: 60_000,
            tick_interval_ms: 1_000,
        });
        let snapshot = agg.tick(NOW);

        for kind in NotifyKind::ALL {
            let series = snapshot.series(kind);
            assert!(series.len() >= 2);
            assert!(series.iter().all(|(_, c)| *c == 0));
        }
    }

    #[test]
    fn test_counts_sum_to_samples_inside_window() {
        let mut agg = aggregator();
        let samples = [NOW - 180_000, NOW - 95_001, NOW - 95_000, NOW - 1, NOW];
        for ts in samples {
            agg.on_event(NotifyKind::NewOrder, ts);
        }
        agg.on_event(NotifyKind::Delivered, NOW - 30_000);

        let snapshot = agg.tick(NOW);

        assert_eq!(snapshot.total(NotifyKind::NewOrder), samples.len() as u64);
        assert_eq!(snapshot.total(NotifyKind::Delivered), 1);
        assert_eq!(snapshot.bucket_at(NOW).unwrap().count(NotifyKind::NewOrder), 1);
    }

    #[test]
    fn test_expired_samples_leave_log_and_sums() {
        let mut agg = aggregator();
        agg.on_event(NotifyKind::Delivered, NOW - 180_001);
        agg.on_event(NotifyKind::Delivered, NOW - 200_000);
        agg.on_event(NotifyKind::Delivered, NOW - 10);

        let snapshot = agg.tick(NOW);

        assert_eq!(snapshot.total(NotifyKind::Delivered), 1);
        assert_eq!(agg.log(NotifyKind::Delivered).unwrap().samples(), &[NOW - 10]);
    }

    #[test]
    fn test_out_of_order_arrival_is_pruned_fully() {
        let mut agg = aggregator();
        agg.on_event(NotifyKind::NewOrder, NOW - 5_000);
        agg.on_event(NotifyKind::NewOrder, NOW - 190_000);
        agg.on_event(NotifyKind::NewOrder, NOW - 4_000);

        agg.tick(NOW);

        let retained = agg.log(NotifyKind::NewOrder).unwrap().samples();
        assert!(retained.iter().all(|&ts| ts >= NOW - 180_000));
        assert_eq!(retained.len(), 2);
    }

    #[test]
    fn test_bucket_boundaries_are_half_open() {
        let mut agg = aggregator();
        let start = NOW - 180_000;
        agg.on_event(NotifyKind::NewOrder, start + 9_999);
        agg.on_event(NotifyKind::NewOrder, start + 10_000);

        let snapshot = agg.tick(NOW);

        assert_eq!(snapshot.buckets[0].count(NotifyKind::NewOrder), 1);
        assert_eq!(snapshot.buckets[1].count(NotifyKind::NewOrder), 1);
    }

    #[test]
    fn test_tick_is_idempotent() {
        let mut agg = aggregator();
        for i in 0..50 {
            agg.on_event(NotifyKind::NewOrder, NOW - i * 3_700);
            agg.on_event(NotifyKind::Delivered, NOW - i * 5_300);
        }

        let first = agg.tick(NOW);
        let second = agg.tick(NOW);
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_samples_are_skipped_not_fatal() {
        let mut agg = aggregator();
        agg.on_event(NotifyKind::NewOrder, -42);
        agg.on_event(NotifyKind::NewOrder, NOW - 1_000);

        let snapshot = agg.tick(NOW);

        assert_eq!(snapshot.malformed, 1);
        assert_eq!(snapshot.total(NotifyKind::NewOrder), 1);
        assert_eq!(agg.log(NotifyKind::NewOrder).unwrap().len(), 1);
    }

    #[test]
    fn test_extreme_timestamps_do_not_break_the_tick() {
        let mut agg = aggregator();
        agg.on_event(NotifyKind::NewOrder, i64::MAX);
        agg.on_event(NotifyKind::Delivered, 50_000);

        // now < window width puts window_start below zero
        let snapshot = agg.tick(100_000);
        assert_eq!(snapshot.window_start, -80_000);
        assert_eq!(snapshot.total(NotifyKind::NewOrder), 0);
        assert_eq!(snapshot.total(NotifyKind::Delivered), 1);
        assert_eq!(agg.log(NotifyKind::NewOrder).unwrap().len(), 1);

        let far = agg.tick(i64::MAX);
        assert_eq!(far.buckets.len(), 19);
        assert_eq!(far.buckets[18].end(), i64::MAX);
        assert_eq!(far.total(NotifyKind::NewOrder), 1);

        let early = agg.tick(i64::MIN);
        assert_eq!(early.window_start, i64::MIN);
        assert_eq!(early.total(NotifyKind::NewOrder), 0);
    }

    #[test]
    fn test_oversized_window_is_capped() {
        let agg = WindowAggregator::new(&WindowConfig {
            window_width_ms: i64::MAX,
            bucket_width_ms: 1,
            tick_interval_ms: 1_000,
        });
        assert_eq!(agg.bucket_count(), MAX_BUCKETS);

        let wide_buckets = WindowAggregator::new(&WindowConfig {
            window_width_ms: i64::MAX,
            bucket_width_ms: i64::MAX,
            tick_interval_ms: 1_000,
        });
        assert_eq!(wide_buckets.bucket_count(), 2);
    }

    #[test]
    fn test_future_samples_wait_for_the_window() {
        let mut agg = aggregator();
        agg.on_event(NotifyKind::Delivered, NOW + 60_000);

        assert_eq!(agg.tick(NOW).total(NotifyKind::Delivered), 0);
        assert_eq!(agg.log(NotifyKind::Delivered).unwrap().len(), 1);
        assert_eq!(agg.tick(NOW + 60_000).total(NotifyKind::Delivered), 1);
    }

    #[test]
    fn test_observed_max_spans_kinds() {
        let mut agg = aggregator();
        for _ in 0..3 {
            agg.on_event(NotifyKind::NewOrder, NOW - 500);
        }
        for _ in 0..7 {
            agg.on_event(NotifyKind::Delivered, NOW - 50_000);
        }

        assert_eq!(agg.tick(NOW).observed_max(), 7);
    }
}
