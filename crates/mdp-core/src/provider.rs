use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use mdp_stats::{ProviderKind, ProviderTotals, ResourceSampler, StatsCsvWriter, StatsRow, ValueStatistics};
use tracing::info;

use crate::dispatcher::{AdmissionDispatcher, DispatchTarget};
use crate::thread::{ProviderThread, SessionInbox, ThreadConfig};

/// Top-level coordinator: owns the worker thread handles, the shared
/// shutdown flag, and the stats-reducer state (spec.md §4.J, §5
/// "Scheduling model": one OS thread per worker plus the stats reducer
/// running on the main thread's periodic loop).
pub struct Provider {
    handles: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    thread_counters: Vec<Arc<mdp_stats::ThreadCounters>>,
    thread_time_records: Vec<Arc<mdp_stats::TimeRecordQueue>>,
    thread_encode_time_records: Vec<Arc<mdp_stats::TimeRecordQueue>>,
    writers: Vec<StatsCsvWriter>,
    dispatcher: AdmissionDispatcher,
    totals: ProviderTotals,
    value_stats: ValueStatistics,
    encode_value_stats: ValueStatistics,
    resource_sampler: ResourceSampler,
    pub write_stats_interval: Duration,
    kind: ProviderKind,
    measure_encode: bool,
}

impl Provider {
    pub fn spawn(
        addr: std::net::SocketAddr,
        thread_count: usize,
        cpu_ids: Option<Vec<usize>>,
        config: ThreadConfig,
        kind: ProviderKind,
        write_stats_interval: Duration,
        stats_dir: &std::path::Path,
    ) -> Result<Self, crate::error::CoreError> {
        crate::sizing::log_estimated_sizes();

        let shutdown = Arc::new(AtomicBool::new(false));
        let inboxes: Vec<Arc<SessionInbox>> = (0..thread_count).map(|_| Arc::new(SessionInbox::default())).collect();
        let connection_counts: Vec<Arc<Mutex<usize>>> = (0..thread_count).map(|_| Arc::new(Mutex::new(0))).collect();

        let mut handles = Vec::with_capacity(thread_count);
        let mut thread_counters = Vec::with_capacity(thread_count);
        let mut thread_time_records = Vec::with_capacity(thread_count);
        let mut thread_encode_time_records = Vec::with_capacity(thread_count);
        let mut writers = Vec::with_capacity(thread_count);

        for index in 0..thread_count {
            let mut thread = ProviderThread::new(
                index,
                addr,
                config.clone(),
                inboxes[index].clone(),
                connection_counts[index].clone(),
            )
            .map_err(crate::error::CoreError::Transport)?;
            thread_counters.push(thread.counters.clone());
            thread_time_records.push(thread.time_records.clone());
            thread_encode_time_records.push(thread.encode_time_records.clone());

            let path = stats_dir.join(format!("thread-{index}-stats.csv"));
            let path_str = path.to_str().ok_or_else(|| crate::error::CoreError::Config("non-utf8 stats path".into()))?;
            let writer = StatsCsvWriter::create(path_str, kind).map_err(|e| crate::error::CoreError::Resource(e.to_string()))?;
            writers.push(writer);

            let shutdown = shutdown.clone();
            let pin_to = cpu_ids.as_ref().and_then(|ids| ids.get(index)).copied();
            let handle = std::thread::Builder::new()
                .name(format!("mdp-worker-{index}"))
                .spawn(move || {
                    if let Some(cpu_id) = pin_to {
                        if !core_affinity::set_for_current(core_affinity::CoreId { id: cpu_id }) {
                            tracing::warn!(cpu_id, "failed to pin worker thread to requested core");
                        }
                    }
                    thread.run(shutdown);
                })
                .expect("failed to spawn provider worker thread");
            handles.push(handle);
        }

        let dispatcher_targets = inboxes
            .into_iter()
            .zip(connection_counts)
            .map(|(inbox, connection_count)| DispatchTarget { inbox, connection_count })
            .collect();
        let dispatcher = AdmissionDispatcher::new(dispatcher_targets);

        Ok(Provider {
            handles,
            shutdown,
            thread_counters,
            thread_time_records,
            thread_encode_time_records,
            writers,
            dispatcher,
            totals: ProviderTotals::default(),
            value_stats: ValueStatistics::new(),
            encode_value_stats: ValueStatistics::new(),
            resource_sampler: ResourceSampler::new(),
            write_stats_interval,
            kind,
            measure_encode: config.measure_encode,
        })
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn dispatcher(&self) -> &AdmissionDispatcher {
        &self.dispatcher
    }

    /// One reducer pass (spec.md §4.J): sample resources, drain each
    /// thread's latency records, fold counter deltas into totals, append
    /// a CSV row per thread.
    pub fn collect_once(&mut self) -> std::io::Result<()> {
        let sample = self.resource_sampler.sample();
        let mut records = Vec::new();
        let utc = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        for i in 0..self.thread_counters.len() {
            self.thread_time_records[i].drain(&mut records);
            for record in &records {
                self.value_stats.update(record.latency() as f64);
            }
            self.thread_time_records[i].repool(std::mem::take(&mut records));

            self.thread_encode_time_records[i].drain(&mut records);
            for record in &records {
                self.encode_value_stats.update(record.latency() as f64);
            }
            self.thread_encode_time_records[i].repool(std::mem::take(&mut records));

            let deltas = self.totals.accumulate(&self.thread_counters[i]);
            let row = StatsRow {
                requests: deltas.item_request,
                refreshes: deltas.refresh_msg,
                updates: deltas.update_msg,
                posts: deltas.post_msg,
                gen_msg_sent: deltas.gen_msg_sent,
                gen_msg_recv: deltas.gen_msg_recv,
                latency_gen_msg_sent: deltas.latency_gen_msg_sent,
                latency_gen_msg_recv: 0,
                gen_msg_latency_avg_usec: self.value_stats.average(),
                gen_msg_latency_stddev_usec: self.value_stats.std_dev(),
                gen_msg_latency_max_usec: self.value_stats.max(),
                gen_msg_latency_min_usec: self.value_stats.min(),
                cpu_usage_pct: sample.cpu_usage_fraction * 100.0,
                mem_usage_mb: sample.mem_usage_bytes as f64 / (1024.0 * 1024.0),
            };
            self.writers[i].write_row(&utc, &row)?;
        }
        Ok(())
    }

    /// Prints the shutdown summary to stdout, mirroring the layout the
    /// CSV columns already carry (spec.md §4.J "emit a human-readable
    /// summary to stdout and to the summary file").
    pub fn print_summary(&self) {
        println!("=== provider summary ===");
        println!("requests received : {}", self.totals.item_request);
        println!("images sent       : {}", self.totals.refresh_msg);
        println!("updates sent      : {}", self.totals.update_msg);
        if self.kind == mdp_stats::ProviderKind::Interactive {
            println!("genMsgs sent      : {}", self.totals.gen_msg_sent);
            println!("genMsgs received  : {}", self.totals.gen_msg_recv);
            println!(
                "genMsg latency    : avg={:.1}us stddev={:.1}us min={:.1}us max={:.1}us",
                self.value_stats.average(),
                self.value_stats.std_dev(),
                self.value_stats.min(),
                self.value_stats.max()
            );
        }
        if self.measure_encode {
            println!(
                "encode latency    : avg={:.1}us stddev={:.1}us min={:.1}us max={:.1}us",
                self.encode_value_stats.average(),
                self.encode_value_stats.std_dev(),
                self.encode_value_stats.min(),
                self.encode_value_stats.max()
            );
        }
    }

    /// Blocks until every worker thread has joined (spec.md §4.J
    /// shutdown: "join all threads, perform one final collect").
    pub fn join(&mut self) {
        for handle in std::mem::take(&mut self.handles) {
            let _ = handle.join();
        }
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        info!("shutdown requested");
    }
}
