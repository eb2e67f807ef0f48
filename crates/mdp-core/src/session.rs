use std::time::Instant;

use mdp_transport::{ChannelState, ReadinessTracker, SessionBuffering};
use mdp_wire::{Codec, WireMessage};

use crate::burst_scheduler::BurstSchedule;
use crate::registry::ItemRegistry;

/// Per-session configuration carried over from the thread (spec.md §4.F,
/// §4.G): rates are set once at startup and shared read-only by every
/// session a thread owns.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub refresh_burst_size: usize,
    pub pre_encode: bool,
    pub measure_encode: bool,
    pub nano_time: bool,
    /// Auto-dictionary-download policy (spec.md §4.L, SPEC_FULL.md §6
    /// `-downloadDictionaries`), forwarded into the session's
    /// `ReadinessTracker` at construction.
    pub download_dictionaries: bool,
}

/// A pre-encoded update template for one domain, built once at session
/// construction when pre-encoding is enabled (spec.md §4.H). The
/// stream-id field is patched in place per message via the codec's
/// stream-id-replace operation rather than re-encoding.
#[derive(Debug, Clone)]
pub struct PreEncodedTemplate {
    pub bytes: Vec<u8>,
}

/// The per-peer state owned exclusively by one `ProviderThread` (spec.md
/// §3 "Session", §5 "Ownership": "no cross-thread access... permitted").
pub struct ProviderSession {
    pub channel_id: usize,
    pub items: ItemRegistry,
    pub buffering: SessionBuffering,
    pub readiness: ReadinessTracker,
    pub time_activated: Instant,
    pub update_schedule: BurstSchedule,
    pub gen_msg_schedule: BurstSchedule,
    pub templates: Vec<PreEncodedTemplate>,
    pub config: SessionConfig,
}

impl ProviderSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel_id: usize,
        items: ItemRegistry,
        buffering: SessionBuffering,
        update_schedule: BurstSchedule,
        gen_msg_schedule: BurstSchedule,
        config: SessionConfig,
    ) -> Self {
        ProviderSession {
            channel_id,
            items,
            buffering,
            readiness: ReadinessTracker::with_policy(config.download_dictionaries),
            time_activated: Instant::now(),
            update_schedule,
            gen_msg_schedule,
            templates: Vec::new(),
            config,
        }
    }

    /// Pre-encodes one update template per supported domain using a
    /// dummy item, asserting the domain payload's iterator returns to
    /// zero after one pass (spec.md §4.H construction).
    pub fn pre_encode_templates<C: Codec>(&mut self, codec: &C, dummy_messages: &[WireMessage]) {
        self.templates.clear();
        for msg in dummy_messages {
            let mut bytes = Vec::new();
            if codec.encode_into(msg, &mut bytes).is_ok() {
                self.templates.push(PreEncodedTemplate { bytes });
            }
        }
    }

    /// Releases everything owned by the session: drains both item
    /// queues, drops pre-encoded templates (spec.md §4.H destruction).
    pub fn destroy(&mut self) -> Vec<i32> {
        let freed = self.items.drain_all();
        self.templates.clear();
        freed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTickAction {
    Continue,
    RequestFlush,
    Close,
}

pub fn channel_state_to_action(state: ChannelState) -> SessionTickAction {
    match state {
        ChannelState::Active | ChannelState::Initializing => SessionTickAction::Continue,
        ChannelState::Inactive => SessionTickAction::Close,
    }
}
