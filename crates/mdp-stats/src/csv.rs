//! Per-thread CSV stats file writer (spec.md §6 "Persisted state", §4.J).
//!
//! Column layout is reproduced from the reference tool's `fprintf` header
//! lines (`examples/original_source/.../providerThreads.c`): interactive
//! providers carry the generic-message latency columns, non-interactive
//! providers carry only the refresh/update counters.

use std::fs::File;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Interactive,
    NonInteractive,
}

/// One interval row of stats for a single provider thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsRow {
    pub requests: u64,
    pub refreshes: u64,
    pub updates: u64,
    pub posts: u64,
    pub gen_msg_sent: u64,
    pub gen_msg_recv: u64,
    pub latency_gen_msg_sent: u64,
    pub latency_gen_msg_recv: u64,
    pub gen_msg_latency_avg_usec: f64,
    pub gen_msg_latency_stddev_usec: f64,
    pub gen_msg_latency_max_usec: f64,
    pub gen_msg_latency_min_usec: f64,
    pub cpu_usage_pct: f64,
    pub mem_usage_mb: f64,
}

pub struct StatsCsvWriter {
    file: File,
    kind: ProviderKind,
}

impl StatsCsvWriter {
    pub fn create(path: &str, kind: ProviderKind) -> io::Result<Self> {
        let mut file = File::create(path)?;
        let header = match kind {
            ProviderKind::Interactive => {
                "UTC, Requests received, Images sent, Updates sent, Posts reflected, GenMsgs sent, \
GenMsgs received, GenMsg Latencies sent, GenMsg Latencies received, GenMsg Latency avg (usec), \
GenMsg Latency std dev (usec), GenMsg Latency max (usec), GenMsg Latency min (usec), \
CPU usage (%), Memory (MB)\n"
            }
            ProviderKind::NonInteractive => "UTC, Images sent, Updates sent, CPU usage (%), Memory (MB)\n",
        };
        file.write_all(header.as_bytes())?;
        Ok(StatsCsvWriter { file, kind })
    }

    pub fn write_row(&mut self, utc: &str, row: &StatsRow) -> io::Result<()> {
        match self.kind {
            ProviderKind::Interactive => {
                writeln!(
                    self.file,
                    "{}, {}, {}, {}, {}, {}, {}, {}, {}, {:.1}, {:.1}, {:.1}, {:.1}, {:.2}, {:.2}",
                    utc,
                    row.requests,
                    row.refreshes,
                    row.updates,
                    row.posts,
                    row.gen_msg_sent,
                    row.gen_msg_recv,
                    row.latency_gen_msg_sent,
                    row.latency_gen_msg_recv,
                    row.gen_msg_latency_avg_usec,
                    row.gen_msg_latency_stddev_usec,
                    row.gen_msg_latency_max_usec,
                    row.gen_msg_latency_min_usec,
                    row.cpu_usage_pct,
                    row.mem_usage_mb,
                )?;
            }
            ProviderKind::NonInteractive => {
                writeln!(
                    self.file,
                    "{}, {}, {}, {:.2}, {:.2}",
                    utc, row.refreshes, row.updates, row.cpu_usage_pct, row.mem_usage_mb,
                )?;
            }
        }
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactive_header_matches_reference_column_order() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("mdp-stats-test-{}.csv", std::process::id()));
        let path_str = path.to_str().unwrap().to_owned();
        {
            let mut w = StatsCsvWriter::create(&path_str, ProviderKind::Interactive).unwrap();
            w.write_row("2026-01-01T00:00:00Z", &StatsRow::default()).unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("UTC, Requests received, Images sent, Updates sent"));
        assert!(contents.contains("GenMsg Latency min (usec)"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn non_interactive_header_omits_genmsg_columns() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("mdp-stats-test-ni-{}.csv", std::process::id()));
        let path_str = path.to_str().unwrap().to_owned();
        {
            let _w = StatsCsvWriter::create(&path_str, ProviderKind::NonInteractive).unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), "UTC, Images sent, Updates sent, CPU usage (%), Memory (MB)");
        std::fs::remove_file(path).ok();
    }
}
