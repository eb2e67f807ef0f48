use rand::Rng;

/// Sentinel bypassing the latency selection array: every message in the
/// burst is latency-stamped (spec.md §4.F "ALWAYS_SEND_LATENCY").
pub const ALWAYS_SEND_LATENCY: u32 = u32::MAX;

/// Precomputed per-tick scheduling for one message class (updates or
/// generic messages), derived once from the per-second rates (spec.md
/// §4.F).
#[derive(Debug, Clone)]
pub struct BurstSchedule {
    per_tick: u32,
    per_tick_remainder: u32,
    ticks_per_sec: u32,
    latency_per_sec: u32,
    latency_array: Vec<bool>,
    cursor: usize,
}

/// Validation constraints from spec.md §4.F, checked once at construction;
/// a violation aborts the process before any worker starts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BurstScheduleError {
    #[error("latencyPerSec ({latency}) must be <= perSec ({per_sec})")]
    LatencyExceedsRate { latency: u32, per_sec: u32 },
    #[error("latencyPerSec ({latency}) must be <= ticksPerSec ({ticks_per_sec})")]
    LatencyExceedsTickRate { latency: u32, ticks_per_sec: u32 },
    #[error("perSec ({per_sec}) must be >= ticksPerSec ({ticks_per_sec}) or 0")]
    RateBelowTickRate { per_sec: u32, ticks_per_sec: u32 },
}

impl BurstSchedule {
    pub fn new(per_sec: u32, latency_per_sec: u32, ticks_per_sec: u32, set_count: usize) -> Result<Self, BurstScheduleError> {
        if per_sec != 0 && per_sec < ticks_per_sec {
            return Err(BurstScheduleError::RateBelowTickRate { per_sec, ticks_per_sec });
        }
        if latency_per_sec != ALWAYS_SEND_LATENCY {
            if latency_per_sec > per_sec {
                return Err(BurstScheduleError::LatencyExceedsRate { latency: latency_per_sec, per_sec });
            }
            if latency_per_sec > ticks_per_sec {
                return Err(BurstScheduleError::LatencyExceedsTickRate { latency: latency_per_sec, ticks_per_sec });
            }
        }

        let latency_array = build_latency_array(latency_per_sec, ticks_per_sec, set_count.max(1));

        Ok(BurstSchedule {
            per_tick: per_sec / ticks_per_sec.max(1),
            per_tick_remainder: per_sec % ticks_per_sec.max(1),
            ticks_per_sec,
            latency_per_sec,
            latency_array,
            cursor: 0,
        })
    }

    /// Count for tick index `tick_in_second` (0-based), spreading the
    /// remainder across the leading ticks of the second so the sum over
    /// one second equals `per_sec` exactly (spec.md §4.F step 1, §8
    /// invariant 3).
    pub fn count_for_tick(&self, tick_in_second: u32) -> u32 {
        self.per_tick + u32::from(tick_in_second < self.per_tick_remainder)
    }

    /// Draws this tick's latency-stamp decision exactly once (spec.md §8
    /// testable property #4: the draw happens per *tick*, not per
    /// message). Returns the index within the tick's `count`-sized burst
    /// that should carry the stamp, or `None` if this tick stamps nothing.
    /// Callers must check `is_latency_always` first: that case stamps
    /// every message in the burst and has no single index to return.
    pub fn latency_index_for_tick(&mut self, count: u32) -> Option<u32> {
        if self.latency_array.is_empty() || count == 0 {
            return None;
        }
        let v = self.latency_array[self.cursor];
        self.cursor = (self.cursor + 1) % self.latency_array.len();
        if !v {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..count))
    }

    /// True when every message in every tick's burst is latency-stamped
    /// (spec.md §4.F "ALWAYS_SEND_LATENCY").
    pub fn is_latency_always(&self) -> bool {
        self.latency_per_sec == ALWAYS_SEND_LATENCY
    }

    pub fn ticks_per_sec(&self) -> u32 {
        self.ticks_per_sec
    }
}

/// Builds a `ticksPerSec * setCount`-length array with exactly
/// `latencyPerSec` `true` positions per `ticksPerSec`-sized window
/// (spec.md §4.F, §8 invariant 4). Positions within each window are
/// shuffled so latency sampling isn't biased toward tick boundaries.
fn build_latency_array(latency_per_sec: u32, ticks_per_sec: u32, set_count: usize) -> Vec<bool> {
    if latency_per_sec == ALWAYS_SEND_LATENCY || ticks_per_sec == 0 {
        return Vec::new();
    }
    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(ticks_per_sec as usize * set_count);
    for _ in 0..set_count {
        let mut window = vec![false; ticks_per_sec as usize];
        let mut marked = 0;
        while marked < latency_per_sec as usize {
            let pos = rng.gen_range(0..ticks_per_sec as usize);
            if !window[pos] {
                window[pos] = true;
                marked += 1;
            }
        }
        out.extend(window);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_tick_counts_sum_to_per_sec_over_one_second() {
        let sched = BurstSchedule::new(100_000, 0, 1000, 1).unwrap();
        let sum: u32 = (0..1000).map(|t| sched.count_for_tick(t)).sum();
        assert_eq!(sum, 100_000);
    }

    #[test]
    fn latency_array_marks_exactly_latency_per_sec_positions_per_window() {
        let sched = BurstSchedule::new(100_000, 100, 1000, 4).unwrap();
        for window in sched.latency_array.chunks(1000) {
            assert_eq!(window.iter().filter(|&&b| b).count(), 100);
        }
    }

    #[test]
    fn always_send_latency_bypasses_the_array() {
        let sched = BurstSchedule::new(100, ALWAYS_SEND_LATENCY, 10, 1).unwrap();
        assert!(sched.is_latency_always());
        assert!(sched.latency_array.is_empty());
    }

    #[test]
    fn latency_index_for_tick_draws_once_and_picks_within_count() {
        let mut sched = BurstSchedule::new(100_000, 1000, 1000, 4).unwrap();
        let mut stamped_ticks = 0;
        for t in 0..1000 {
            let count = sched.count_for_tick(t);
            if let Some(idx) = sched.latency_index_for_tick(count) {
                stamped_ticks += 1;
                assert!(idx < count);
            }
        }
        assert_eq!(stamped_ticks, 1000);
    }

    #[test]
    fn rejects_latency_rate_exceeding_tick_rate() {
        let err = BurstSchedule::new(1000, 2000, 1000, 1).unwrap_err();
        assert_eq!(err, BurstScheduleError::LatencyExceedsRate { latency: 2000, per_sec: 1000 });
    }
}
