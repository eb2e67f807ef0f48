//! Lock-light counters, latency sample queues, and the interval/summary
//! stats writer (spec.md §4.C, §4.J, §6 "Persisted state", §5).

pub mod count_stat;
pub mod counters;
pub mod csv;
pub mod resource;
pub mod time_record;
pub mod value_stats;

pub use count_stat::CountStat;
pub use counters::{ProviderTotals, ThreadCounters, ThreadDeltas};
pub use csv::{ProviderKind, StatsCsvWriter, StatsRow};
pub use resource::{ResourceSample, ResourceSampler};
pub use time_record::{TimeRecord, TimeRecordQueue};
pub use value_stats::ValueStatistics;
