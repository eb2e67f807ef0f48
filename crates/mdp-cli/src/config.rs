use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use mdp_stats::ProviderKind;

/// Caps `-threads <csv>` at the reference tool's `threadBindList` size
/// (SPEC_FULL.md §11 "CPU id list parsing").
pub const MAX_CPU_IDS: usize = 128;

/// Interval `latencyUpdateRate`/`genericMsgLatencyRate` accept either a
/// bare rate or the literal `all` (spec.md §6).
#[derive(Debug, Clone, Copy)]
pub enum RateOrAll {
    All,
    Rate(u32),
}

impl std::str::FromStr for RateOrAll {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(RateOrAll::All)
        } else {
            Ok(RateOrAll::Rate(s.parse()?))
        }
    }
}

/// Full CLI surface from spec.md §6, interactive and non-interactive
/// flags in one struct (clap derive, matching the teacher's
/// `emulator`/`streamer`/`receiver` binaries).
#[derive(Debug, Parser)]
#[command(name = "mdperf", about = "Market-data publisher performance engine", disable_help_flag = true)]
pub struct Cli {
    /// Print help (no short flag: `-h` is reserved for `nonInteractive`).
    #[arg(long = "help", action = clap::ArgAction::Help)]
    pub help: Option<bool>,
    /// CPU ids to pin worker threads to, comma-separated; -1 = unbound.
    #[arg(long = "threads", value_delimiter = ',')]
    pub threads: Vec<i64>,

    #[arg(long = "tickRate", default_value_t = 1000)]
    pub tick_rate: u32,

    #[arg(long = "updateRate", default_value_t = 100_000)]
    pub update_rate: u32,

    #[arg(long = "latencyUpdateRate", default_value = "10")]
    pub latency_update_rate: RateOrAll,

    #[arg(long = "genericMsgRate", default_value_t = 0)]
    pub generic_msg_rate: u32,

    #[arg(long = "genericMsgLatencyRate", default_value = "0")]
    pub generic_msg_latency_rate: RateOrAll,

    #[arg(long = "maxPackCount", default_value_t = 1)]
    pub max_pack_count: u32,

    #[arg(long = "packBufSize", default_value_t = 6000)]
    pub pack_buf_size: usize,

    #[arg(long = "refreshBurstSize", default_value_t = 10)]
    pub refresh_burst_size: usize,

    #[arg(long = "directWrite", default_value_t = false)]
    pub direct_write: bool,

    #[arg(long = "outputBufs", default_value_t = 5000)]
    pub output_bufs: usize,

    #[arg(long = "maxOutputBufs", default_value_t = 5000)]
    pub max_output_bufs: usize,

    #[arg(long = "maxFragmentSize", default_value_t = 6144)]
    pub max_fragment_size: usize,

    #[arg(long = "sendBufSize", default_value_t = 0)]
    pub send_buf_size: usize,

    #[arg(long = "recvBufSize", default_value_t = 0)]
    pub recv_buf_size: usize,

    #[arg(long = "highWaterMark", default_value_t = 0)]
    pub high_water_mark: usize,

    #[arg(long = "tcpDelay", default_value_t = false)]
    pub tcp_delay: bool,

    #[arg(long = "if", default_value = "0.0.0.0")]
    pub interface: String,

    #[arg(short = 'p', long = "port", default_value = "14002")]
    pub port: String,

    #[arg(long = "serviceId", default_value_t = 1)]
    pub service_id: u16,

    #[arg(long = "serviceName", default_value = "DIRECT_FEED")]
    pub service_name: String,

    #[arg(long = "openLimit", default_value_t = 100_000)]
    pub open_limit: usize,

    #[arg(long = "nanoTime", default_value_t = false)]
    pub nano_time: bool,

    #[arg(long = "preEnc", default_value_t = false)]
    pub pre_enc: bool,

    #[arg(long = "measureEncode", default_value_t = false)]
    pub measure_encode: bool,

    /// Whether a session waits for both field/enum dictionaries to
    /// complete before reaching Ready (spec.md §4.L). Disable for
    /// services that don't advertise a dictionary.
    #[arg(long = "downloadDictionaries", default_value_t = true)]
    pub download_dictionaries: bool,

    #[arg(long = "summaryFile", default_value = "ProvSummary.out")]
    pub summary_file: PathBuf,

    #[arg(long = "statsFile", default_value = "ProvStats")]
    pub stats_file_prefix: String,

    #[arg(long = "latencyFile")]
    pub latency_file_prefix: Option<String>,

    #[arg(long = "writeStatsInterval", default_value_t = 5)]
    pub write_stats_interval: u64,

    #[arg(long = "noDisplayStats", default_value_t = false)]
    pub no_display_stats: bool,

    #[arg(long = "runTime", default_value_t = 360)]
    pub run_time: u64,

    /// Non-interactive mode (NIProvider); interactive by default.
    #[arg(short = 'h', long = "nonInteractive", default_value_t = false)]
    pub non_interactive: bool,

    #[arg(long = "itemCount", default_value_t = 100)]
    pub item_count: usize,

    #[arg(long = "commonItemCount", default_value_t = 0)]
    pub common_item_count: usize,

    #[arg(long = "uname")]
    pub username: Option<String>,

    #[arg(long = "statsDir", default_value = ".")]
    pub stats_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("packingBufferLength == 0 with maxPerPack > 1")]
    PackingBufferTooSmall,
    #[error("-threads accepts at most {max} entries, got {actual}")]
    TooManyCpuIds { max: usize, actual: usize },
    #[error("latencyUpdateRate ({latency}) exceeds updateRate ({rate})")]
    LatencyExceedsRate { latency: u32, rate: u32 },
    #[error("invalid port: {0}")]
    InvalidPort(String),
    #[error("invalid interface address: {0}")]
    InvalidInterface(String),
    #[error("preEnc may not be combined with latencyUpdateRate=all")]
    PreEncodeWithAlwaysLatency,
    #[error("measureEncode requires latencyUpdateRate > 0")]
    MeasureEncodeRequiresLatency,
}

/// Validated, application-ready configuration (SPEC_FULL.md §11
/// "applicationName/applicationId").
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub bind_addr: SocketAddr,
    pub thread_count: usize,
    pub cpu_ids: Option<Vec<usize>>,
    pub tick_rate: u32,
    pub update_rate: u32,
    pub latency_update_rate: u32,
    pub generic_msg_rate: u32,
    pub generic_msg_latency_rate: u32,
    pub max_pack_count: u32,
    pub pack_buf_size: usize,
    pub refresh_burst_size: usize,
    pub output_bufs: usize,
    pub open_limit: usize,
    pub service_id: u16,
    pub nano_time: bool,
    pub pre_enc: bool,
    pub measure_encode: bool,
    pub download_dictionaries: bool,
    pub write_stats_interval: Duration,
    pub run_time: Duration,
    pub kind: ProviderKind,
    pub stats_dir: PathBuf,
    pub summary_file: PathBuf,
    pub application_name: String,
    pub application_id: String,
    pub item_count: usize,
    pub common_item_count: usize,
}

impl ProviderConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        use mdp_core::ALWAYS_SEND_LATENCY;

        if cli.pack_buf_size == 0 && cli.max_pack_count > 1 {
            return Err(ConfigError::PackingBufferTooSmall);
        }
        if cli.threads.len() > MAX_CPU_IDS {
            return Err(ConfigError::TooManyCpuIds {
                max: MAX_CPU_IDS,
                actual: cli.threads.len(),
            });
        }

        let latency_update_rate = match cli.latency_update_rate {
            RateOrAll::All => ALWAYS_SEND_LATENCY,
            RateOrAll::Rate(r) => r,
        };
        if latency_update_rate != ALWAYS_SEND_LATENCY && latency_update_rate > cli.update_rate {
            return Err(ConfigError::LatencyExceedsRate {
                latency: latency_update_rate,
                rate: cli.update_rate,
            });
        }
        if cli.pre_enc && latency_update_rate == ALWAYS_SEND_LATENCY {
            return Err(ConfigError::PreEncodeWithAlwaysLatency);
        }
        if cli.measure_encode && latency_update_rate == 0 {
            return Err(ConfigError::MeasureEncodeRequiresLatency);
        }
        let generic_msg_latency_rate = match cli.generic_msg_latency_rate {
            RateOrAll::All => ALWAYS_SEND_LATENCY,
            RateOrAll::Rate(r) => r,
        };

        let interface: IpAddr = if cli.interface == "0.0.0.0" || cli.interface.is_empty() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            cli.interface
                .parse()
                .map_err(|_| ConfigError::InvalidInterface(cli.interface.clone()))?
        };
        let port: u16 = cli
            .port
            .parse()
            .map_err(|_| ConfigError::InvalidPort(cli.port.clone()))?;

        let cpu_ids = if cli.threads.is_empty() {
            None
        } else {
            Some(
                cli.threads
                    .iter()
                    .filter(|&&id| id >= 0)
                    .map(|&id| id as usize)
                    .collect::<Vec<_>>(),
            )
        };
        let thread_count = cli.threads.len().max(1);

        Ok(ProviderConfig {
            bind_addr: SocketAddr::new(interface, port),
            thread_count,
            cpu_ids,
            tick_rate: cli.tick_rate,
            update_rate: cli.update_rate,
            latency_update_rate,
            generic_msg_rate: cli.generic_msg_rate,
            generic_msg_latency_rate,
            max_pack_count: cli.max_pack_count,
            pack_buf_size: cli.pack_buf_size,
            refresh_burst_size: cli.refresh_burst_size,
            output_bufs: cli.output_bufs,
            open_limit: cli.open_limit,
            service_id: cli.service_id,
            nano_time: cli.nano_time,
            pre_enc: cli.pre_enc,
            measure_encode: cli.measure_encode,
            download_dictionaries: cli.download_dictionaries,
            write_stats_interval: Duration::from_secs(cli.write_stats_interval),
            run_time: Duration::from_secs(cli.run_time),
            kind: if cli.non_interactive { ProviderKind::NonInteractive } else { ProviderKind::Interactive },
            stats_dir: cli.stats_dir.clone(),
            summary_file: cli.summary_file.clone(),
            application_name: "mdperf".to_string(),
            application_id: "256".to_string(),
            item_count: cli.item_count,
            common_item_count: cli.common_item_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli::parse_from(["mdperf"])
    }

    #[test]
    fn packing_buffer_zero_with_max_pack_above_one_is_config_error() {
        let mut cli = base_cli();
        cli.pack_buf_size = 0;
        cli.max_pack_count = 5;
        assert!(matches!(
            ProviderConfig::from_cli(&cli),
            Err(ConfigError::PackingBufferTooSmall)
        ));
    }

    #[test]
    fn more_than_128_cpu_ids_is_rejected() {
        let mut cli = base_cli();
        cli.threads = (0..129).collect();
        assert!(matches!(
            ProviderConfig::from_cli(&cli),
            Err(ConfigError::TooManyCpuIds { .. })
        ));
    }

    #[test]
    fn all_latency_rate_bypasses_the_exceeds_rate_check() {
        let mut cli = base_cli();
        cli.update_rate = 100;
        cli.latency_update_rate = RateOrAll::All;
        assert!(ProviderConfig::from_cli(&cli).is_ok());
    }

    #[test]
    fn pre_enc_with_always_send_latency_is_config_error() {
        let mut cli = base_cli();
        cli.pre_enc = true;
        cli.latency_update_rate = RateOrAll::All;
        assert!(matches!(
            ProviderConfig::from_cli(&cli),
            Err(ConfigError::PreEncodeWithAlwaysLatency)
        ));
    }

    #[test]
    fn measure_encode_with_zero_latency_rate_is_config_error() {
        let mut cli = base_cli();
        cli.measure_encode = true;
        cli.latency_update_rate = RateOrAll::Rate(0);
        assert!(matches!(
            ProviderConfig::from_cli(&cli),
            Err(ConfigError::MeasureEncodeRequiresLatency)
        ));
    }
}
