use crate::count_stat::CountStat;

/// The per-thread counter bundle named in spec.md §3 ("refresh/update/
/// request/close/post/genMsgSent/genMsgRecv/…"). Fields are relaxed
/// atomics; the reducer thread samples deltas via `get_change` on each
/// field (spec.md §5).
#[derive(Debug, Default)]
pub struct ThreadCounters {
    pub refresh_msg: CountStat,
    pub update_msg: CountStat,
    pub item_request: CountStat,
    pub close_msg: CountStat,
    pub post_msg: CountStat,
    pub out_of_buffers: CountStat,
    pub msg_sent: CountStat,
    pub buffer_sent: CountStat,
    pub gen_msg_sent: CountStat,
    pub gen_msg_recv: CountStat,
    pub latency_gen_msg_sent: CountStat,
}

/// Running totals aggregated across all threads (spec.md §3 "Provider:
/// totals — per-counter running totals aggregated from thread counters").
/// Plain `u64`s: only the reducer thread ever touches this (spec.md §5
/// "written by reducer only").
#[derive(Debug, Default, Clone, Copy)]
pub struct ProviderTotals {
    pub refresh_msg: u64,
    pub update_msg: u64,
    pub item_request: u64,
    pub close_msg: u64,
    pub post_msg: u64,
    pub out_of_buffers: u64,
    pub msg_sent: u64,
    pub buffer_sent: u64,
    pub gen_msg_sent: u64,
    pub gen_msg_recv: u64,
    pub latency_gen_msg_sent: u64,
}

impl ProviderTotals {
    /// Folds one thread's interval deltas into the running totals.
    pub fn accumulate(&mut self, counters: &ThreadCounters) -> ThreadDeltas {
        let deltas = ThreadDeltas {
            refresh_msg: counters.refresh_msg.get_change(),
            update_msg: counters.update_msg.get_change(),
            item_request: counters.item_request.get_change(),
            close_msg: counters.close_msg.get_change(),
            post_msg: counters.post_msg.get_change(),
            out_of_buffers: counters.out_of_buffers.get_change(),
            msg_sent: counters.msg_sent.get_change(),
            buffer_sent: counters.buffer_sent.get_change(),
            gen_msg_sent: counters.gen_msg_sent.get_change(),
            gen_msg_recv: counters.gen_msg_recv.get_change(),
            latency_gen_msg_sent: counters.latency_gen_msg_sent.get_change(),
        };
        self.refresh_msg += deltas.refresh_msg;
        self.update_msg += deltas.update_msg;
        self.item_request += deltas.item_request;
        self.close_msg += deltas.close_msg;
        self.post_msg += deltas.post_msg;
        self.out_of_buffers += deltas.out_of_buffers;
        self.msg_sent += deltas.msg_sent;
        self.buffer_sent += deltas.buffer_sent;
        self.gen_msg_sent += deltas.gen_msg_sent;
        self.gen_msg_recv += deltas.gen_msg_recv;
        self.latency_gen_msg_sent += deltas.latency_gen_msg_sent;
        deltas
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDeltas {
    pub refresh_msg: u64,
    pub update_msg: u64,
    pub item_request: u64,
    pub close_msg: u64,
    pub post_msg: u64,
    pub out_of_buffers: u64,
    pub msg_sent: u64,
    pub buffer_sent: u64,
    pub gen_msg_sent: u64,
    pub gen_msg_recv: u64,
    pub latency_gen_msg_sent: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_folds_deltas_into_running_totals() {
        let counters = ThreadCounters::default();
        counters.refresh_msg.add(100_000);
        counters.update_msg.add(50);

        let mut totals = ProviderTotals::default();
        let deltas = totals.accumulate(&counters);
        assert_eq!(deltas.refresh_msg, 100_000);
        assert_eq!(totals.refresh_msg, 100_000);

        counters.refresh_msg.add(10);
        let deltas2 = totals.accumulate(&counters);
        assert_eq!(deltas2.refresh_msg, 10);
        assert_eq!(totals.refresh_msg, 100_010);
    }
}
