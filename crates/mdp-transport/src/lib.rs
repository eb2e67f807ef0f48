//! Channel lifecycle, ping supervision, outbound buffer management, and
//! the post-connect readiness handshake (spec.md §4.D, §4.G, §4.L).

pub mod buffer;
pub mod channel;
pub mod error;
pub mod handler;
pub mod lifecycle;

pub use buffer::{Buffer, SessionBuffering};
pub use channel::{ChannelInfo, ChannelState, PingSchedule};
pub use error::{TransportError, WriteOutcome};
pub use handler::{ChannelHandler, TickResult};
pub use lifecycle::{DictionaryState, ReadinessTracker, ReadyEvent, ReadyState};
