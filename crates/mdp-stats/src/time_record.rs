use std::sync::Mutex;

/// One `(start, end, ticksPerUnit)` latency sample (spec.md §4.C).
#[derive(Debug, Clone, Copy)]
pub struct TimeRecord {
    pub start: u64,
    pub end: u64,
    pub ticks_per_unit: u64,
}

impl TimeRecord {
    /// Latency in the unit implied by `ticks_per_unit` (spec.md §4.C:
    /// "Latency in microseconds is computed as `(end - start) /
    /// ticksPerUnit`" when `ticks_per_unit` is the nanoseconds-per-usec
    /// divisor; callers pass whatever divisor matches their configured
    /// timestamp resolution).
    pub fn latency(&self) -> u64 {
        if self.ticks_per_unit == 0 {
            0
        } else {
            self.end.saturating_sub(self.start) / self.ticks_per_unit
        }
    }
}

/// SPSC-discipline latency sample queue: one producing worker thread
/// (`submit`), one draining stats-reducer thread (`drain`/`repool`)
/// (spec.md §4.C, §5). Implemented with a mutex whose critical sections
/// are bounded to a push or a pointer swap, as the spec explicitly
/// permits ("a mutex-protected queue is acceptable if lock hold times are
/// bounded").
pub struct TimeRecordQueue {
    records: Mutex<Vec<TimeRecord>>,
    pool: Mutex<Vec<Vec<TimeRecord>>>,
}

impl Default for TimeRecordQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeRecordQueue {
    pub fn new() -> Self {
        TimeRecordQueue {
            records: Mutex::new(Vec::new()),
            pool: Mutex::new(Vec::new()),
        }
    }

    /// Producer side: append one sample. O(1) amortized.
    pub fn submit(&self, start: u64, end: u64, ticks_per_unit: u64) {
        self.records.lock().unwrap().push(TimeRecord {
            start,
            end,
            ticks_per_unit,
        });
    }

    /// Consumer side: atomically swaps the internal buffer into `out`,
    /// replacing it with a pooled (or fresh) empty buffer so the
    /// producer never blocks on an allocation.
    pub fn drain(&self, out: &mut Vec<TimeRecord>) {
        let mut replacement = self.pool.lock().unwrap().pop().unwrap_or_default();
        replacement.clear();
        let mut guard = self.records.lock().unwrap();
        std::mem::swap(&mut *guard, &mut replacement);
        drop(guard);
        *out = replacement;
    }

    /// Returns a drained buffer to the free list for reuse by the next
    /// `drain` (spec.md §4.C "repool").
    pub fn repool(&self, mut list: Vec<TimeRecord>) {
        list.clear();
        self.pool.lock().unwrap().push(list);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_takes_all_submitted_records_and_repool_avoids_losing_capacity() {
        let q = TimeRecordQueue::new();
        q.submit(1_000, 1_500, 1);
        q.submit(2_000, 2_100, 1);

        let mut out = Vec::new();
        q.drain(&mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].latency(), 500);

        let cap = out.capacity();
        q.repool(out);

        q.submit(5, 5, 1);
        let mut out2 = Vec::new();
        q.drain(&mut out2);
        assert_eq!(out2.len(), 1);
        assert!(out2.capacity() >= cap || cap == 0);
    }

    #[test]
    fn drain_on_empty_queue_yields_empty_vec() {
        let q = TimeRecordQueue::new();
        let mut out = vec![TimeRecord {
            start: 0,
            end: 0,
            ticks_per_unit: 1,
        }];
        q.drain(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_ticks_per_unit_reports_zero_latency_rather_than_panicking() {
        let r = TimeRecord {
            start: 10,
            end: 20,
            ticks_per_unit: 0,
        };
        assert_eq!(r.latency(), 0);
    }
}
