// ============================================================================
// Scale Stabilizer - hysteresis on the chart's y-axis upper bound
// ============================================================================
//
//   step      = 10 if observed > 20, else 5
//   candidate = max(ceil(observed * 1.3 / step) * step, 10)
//   grow      when observed > current * 0.85
//   shrink    when observed < current * 0.4 and candidate <= current - 2 * step
//   otherwise hold
//
// All ratios are evaluated in widened integer arithmetic (1.3 = 13/10,
// 0.85 = 85/100, 0.4 = 4/10) so threshold comparisons are exact and a
// candidate past u64::MAX pins there.
//
// ============================================================================

pub const MIN_AXIS_MAX: u64 = 10;

fn step_for(observed_max: u64) -> u64 {
    if observed_max > 20 {
        10
    } else {
        5
    }
}

/// Rounded-up target for `observed_max` with 30% headroom, floored at
/// [`MIN_AXIS_MAX`].
pub fn candidate_max(observed_max: u64) -> u64 {
    let step = step_for(observed_max);
    let denominator = 10 * step;
    let steps = (u128::from(observed_max) * 13).div_ceil(u128::from(denominator));
    u64::try_from(steps * u128::from(step))
        .unwrap_or(u64::MAX)
        .max(MIN_AXIS_MAX)
}

/// Decide the next axis maximum given the current one and the highest bucket
/// value observed this tick.
pub fn next_max(current_max: u64, observed_max: u64) -> u64 {
    let step = step_for(observed_max);
    let candidate = candidate_max(observed_max);

    let (observed, current) = (u128::from(observed_max), u128::from(current_max));

    if observed * 100 > current * 85 {
        return candidate.max(current_max);
    }

    let well_below = observed * 10 < current * 4;
    if well_below && candidate.saturating_add(2 * step) <= current_max {
        return candidate;
    }

    current_max
}

/// Stateful wrapper holding the currently displayed maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleStabilizer {
    current_max: u64,
}

impl Default for ScaleStabilizer {
    fn default() -> Self {
        Self {
            current_max: MIN_AXIS_MAX,
        }
    }
}

impl ScaleStabilizer {
    pub fn new(initial_max: u64) -> Self {
        Self {
            current_max: initial_max.max(MIN_AXIS_MAX),
        }
    }

    pub fn current_max(&self) -> u64 {
        self.current_max
    }

    pub fn observe(&mut self, observed_max: u64) -> u64 {
        let next = next_max(self.current_max, observed_max);
        if next != self.current_max {
            tracing::debug!(from = self.current_max, to = next, observed_max, "Rescaling axis");
        }
        self.current_max = next;
        next
    }
}
