use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter. Writers use relaxed atomics
/// (spec.md §5 "`counters` — monotonically increasing `u64`; relaxed
/// atomic writes and reads suffice"); the reducer reads the running total
/// and derives interval deltas via `get_change`.
#[derive(Debug, Default)]
pub struct CountStat {
    total: AtomicU64,
    last_sampled: AtomicU64,
}

impl CountStat {
    pub fn new() -> Self {
        CountStat {
            total: AtomicU64::new(0),
            last_sampled: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn increment(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(&self, n: u64) {
        self.total.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Stores the current total as the new baseline and returns the delta
    /// since the previous call (spec.md §4.J, "the reducer reads via
    /// `getChange` which stores the last-sampled value and subtracts on
    /// next call").
    pub fn get_change(&self) -> u64 {
        let now = self.total.load(Ordering::Relaxed);
        let prev = self.last_sampled.swap(now, Ordering::Relaxed);
        now.saturating_sub(prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_change_returns_delta_since_last_sample() {
        let c = CountStat::new();
        c.add(5);
        assert_eq!(c.get_change(), 5);
        c.add(3);
        c.add(2);
        assert_eq!(c.get_change(), 5);
        assert_eq!(c.get_change(), 0);
        assert_eq!(c.total(), 10);
    }
}
