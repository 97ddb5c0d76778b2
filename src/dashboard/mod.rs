// ============================================================================
// Dashboard - live rolling charts of order activity
// ============================================================================
//
// - window:  trailing-window histogram rebuilt from raw timestamps
// - scale:   y-axis hysteresis so the chart does not jitter
// - clock:   wall clock seam
// - session: one task per subscriber driving the two above
//
// ============================================================================

pub mod clock;
pub mod scale;
pub mod session;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scale::ScaleStabilizer;
pub use session::{ChartFrame, ChartSeries, DashboardHandle, DashboardSession};
pub use window::{RawTimestampLog, TimeBucket, WindowAggregator, WindowSnapshot};
