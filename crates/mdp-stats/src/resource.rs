//! CPU and memory sampling for the periodic stats summary (spec.md §4.J
//! "Samples CPU and memory", §5 "`resourceSample` — written by reducer
//! only").

/// A single CPU/memory snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceSample {
    pub cpu_usage_fraction: f64,
    pub mem_usage_bytes: u64,
}

/// Samples process CPU time and RSS. On Linux this reads `/proc/self/stat`
/// and `/proc/self/status`; on other platforms it returns a zeroed sample
/// rather than failing the run (resource sampling is diagnostic, not
/// load-bearing per spec.md §7).
pub struct ResourceSampler {
    #[cfg(target_os = "linux")]
    last_cpu_ticks: u64,
    #[cfg(target_os = "linux")]
    last_wall: std::time::Instant,
    #[cfg(target_os = "linux")]
    clock_ticks_per_sec: u64,
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler {
    pub fn new() -> Self {
        #[cfg(target_os = "linux")]
        {
            ResourceSampler {
                last_cpu_ticks: 0,
                last_wall: std::time::Instant::now(),
                clock_ticks_per_sec: 100,
            }
        }
        #[cfg(not(target_os = "linux"))]
        {
            ResourceSampler {}
        }
    }

    #[cfg(target_os = "linux")]
    pub fn sample(&mut self) -> ResourceSample {
        let (cpu_ticks, mem_bytes) = read_proc_self().unwrap_or((0, 0));
        let now = std::time::Instant::now();
        let elapsed = now.duration_since(self.last_wall).as_secs_f64().max(1e-6);
        let delta_ticks = cpu_ticks.saturating_sub(self.last_cpu_ticks);
        let cpu_seconds = delta_ticks as f64 / self.clock_ticks_per_sec as f64;
        let fraction = (cpu_seconds / elapsed).clamp(0.0, 1.0);

        self.last_cpu_ticks = cpu_ticks;
        self.last_wall = now;

        ResourceSample {
            cpu_usage_fraction: fraction,
            mem_usage_bytes: mem_bytes,
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub fn sample(&mut self) -> ResourceSample {
        ResourceSample::default()
    }
}

#[cfg(target_os = "linux")]
fn read_proc_self() -> Option<(u64, u64)> {
    let stat = std::fs::read_to_string("/proc/self/stat").ok()?;
    // Fields after the (comm) parenthesized group are space-separated;
    // utime is field 14, stime is field 15 (1-indexed).
    let after_comm = stat.rsplit_once(')')?.1;
    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;

    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let rss_kb = status
        .lines()
        .find(|l| l.starts_with("VmRSS:"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    Some((utime + stime, rss_kb * 1024))
}
