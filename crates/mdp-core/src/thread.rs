use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mdp_stats::{ProviderKind, ThreadCounters, TimeRecordQueue};
use mdp_transport::{ChannelHandler, ChannelState, ReadyEvent, WriteOutcome};
use mdp_wire::{BincodeCodec, Codec, DictionaryKind, DomainType, MsgClass, WireMessage};
use tracing::{info, warn};

use crate::burst_scheduler::BurstSchedule;
use crate::registry::{AdmissionOutcome, ItemRegistry};
use crate::session::{ProviderSession, SessionConfig};

/// Per-thread knobs carried over unchanged from CLI configuration
/// (spec.md §6 CLI surface, §4.F rates).
#[derive(Debug, Clone)]
pub struct ThreadConfig {
    pub ticks_per_sec: u32,
    pub updates_per_sec: u32,
    pub latency_updates_per_sec: u32,
    pub gen_msgs_per_sec: u32,
    pub latency_gen_msgs_per_sec: u32,
    pub refresh_burst_size: usize,
    pub open_limit: usize,
    pub service_id: u16,
    pub max_output_buffers: usize,
    pub ping_timeout: Duration,
    pub packing_buffer_length: usize,
    pub max_per_pack: u32,
    pub pre_encode: bool,
    pub measure_encode: bool,
    pub nano_time: bool,
    pub download_dictionaries: bool,
    pub kind: ProviderKind,
    /// Total item count and common (shared-across-threads) item count for
    /// non-interactive providers (spec.md §6 `-itemCount`/
    /// `-commonItemCount`, §8 scenario 4). Unused in interactive mode.
    pub ni_item_count: usize,
    pub ni_common_item_count: usize,
    pub ni_thread_count: usize,
}

/// Splits `itemCount` into this thread's exclusive partition plus the
/// shared `commonItemCount` prefix every thread publishes (spec.md §8
/// scenario 4: "thread 0 publishes items [0..499], thread 1 publishes
/// [500..999]" when commonItemCount is 0; common items are prepended to
/// every thread's partition when it is non-zero).
pub fn partition_ni_items(thread_index: usize, thread_count: usize, item_count: usize, common_item_count: usize) -> Vec<String> {
    let unique_count = item_count.saturating_sub(common_item_count);
    let per_thread = unique_count / thread_count.max(1);
    let remainder = unique_count % thread_count.max(1);
    let start = thread_index * per_thread + thread_index.min(remainder);
    let this_thread_count = per_thread + if thread_index < remainder { 1 } else { 0 };

    let mut names = Vec::with_capacity(common_item_count + this_thread_count);
    for i in 0..common_item_count {
        names.push(format!("NI_COMMON_{i}"));
    }
    for i in start..start + this_thread_count {
        names.push(format!("NI_ITEM_{i}"));
    }
    names
}

/// Inbox of raw accepted channel ids awaiting upgrade to a
/// `ProviderSession` (spec.md §4.K "newSessionsInbox"). Guarded by a
/// mutex with O(1) enqueue/dequeue; producer is the admission dispatcher,
/// consumer is the owning thread (spec.md §5 "Shared state").
#[derive(Default)]
pub struct SessionInbox {
    pending: Mutex<Vec<usize>>,
}

impl SessionInbox {
    pub fn push(&self, channel_id: usize) {
        self.pending.lock().expect("inbox mutex poisoned").push(channel_id);
    }

    fn drain(&self) -> Vec<usize> {
        std::mem::take(&mut *self.pending.lock().expect("inbox mutex poisoned"))
    }

    pub fn len(&self) -> usize {
        self.pending.lock().expect("inbox mutex poisoned").len()
    }
}

/// One worker: owns its channel handler, its sessions, and its counters
/// exclusively (spec.md §5 "Ownership"). No other thread reaches into
/// these fields.
pub struct ProviderThread {
    pub index: usize,
    pub config: ThreadConfig,
    pub channels: ChannelHandler,
    pub sessions: HashMap<usize, ProviderSession>,
    pub counters: Arc<ThreadCounters>,
    pub time_records: Arc<TimeRecordQueue>,
    pub encode_time_records: Arc<TimeRecordQueue>,
    pub inbox: Arc<SessionInbox>,
    pub codec: BincodeCodec,
    pub connection_count: Arc<Mutex<usize>>,
    tick_index: u32,
}

impl ProviderThread {
    pub fn new(
        index: usize,
        addr: SocketAddr,
        config: ThreadConfig,
        inbox: Arc<SessionInbox>,
        connection_count: Arc<Mutex<usize>>,
    ) -> Result<Self, mdp_transport::TransportError> {
        let is_non_interactive = config.kind == ProviderKind::NonInteractive;
        let (channels, outbound_channel_id) = if is_non_interactive {
            let (channels, id) = ChannelHandler::connect(addr, config.max_output_buffers, config.ping_timeout)?;
            (channels, Some(id))
        } else {
            (ChannelHandler::bind(addr, config.max_output_buffers, config.ping_timeout)?, None)
        };

        let mut thread = ProviderThread {
            index,
            config,
            channels,
            sessions: HashMap::new(),
            counters: Arc::new(ThreadCounters::default()),
            time_records: Arc::new(TimeRecordQueue::default()),
            encode_time_records: Arc::new(TimeRecordQueue::default()),
            inbox,
            codec: BincodeCodec,
            connection_count,
            tick_index: 0,
        };
        if let Some(channel_id) = outbound_channel_id {
            thread.establish_outbound_session(channel_id);
        }
        Ok(thread)
    }

    /// A non-interactive provider is its own consumer: it dials out
    /// (spec.md §2) instead of waiting to be dialed, so there is no peer
    /// on the other end to send the login/directory/dictionary requests
    /// an interactive consumer normally would. Drive the same readiness
    /// events directly so the session reaches `Ready` and starts
    /// publishing (spec.md §8 scenario 4).
    fn establish_outbound_session(&mut self, channel_id: usize) {
        self.create_session(channel_id);
        self.apply_ready_event(channel_id, ReadyEvent::LoginRefreshReceived);
        self.apply_ready_event(channel_id, ReadyEvent::DirectoryRefreshReceived { provides_both_dictionaries: true });
        self.apply_ready_event(channel_id, ReadyEvent::FieldDictionaryComplete);
        self.apply_ready_event(channel_id, ReadyEvent::EnumDictionaryComplete);
        info!(thread = self.index, channel_id, "non-interactive session self-initiated");
    }

    /// One iteration of the pseudo-schedule in spec.md §4.I: read whatever
    /// arrived since the last tick, send this tick's bursts, self-dispatch
    /// any newly accepted channels into sessions, then check pings. Public
    /// so tests can single-step a thread against a real loopback pair
    /// instead of only observing it through the blocking `run` loop.
    pub fn tick_once(&mut self) -> Result<(), mdp_transport::TransportError> {
        let tick_period = Duration::from_secs_f64(1.0 / self.config.ticks_per_sec.max(1) as f64);
        let mut stop_time = Instant::now() + tick_period;

        self.read_channels_until(stop_time)?;
        stop_time += tick_period;
        self.send_burst(stop_time);
        self.accept_new_channels();

        self.tick_index += 1;
        if self.tick_index == self.config.ticks_per_sec {
            self.tick_index = 0;
        }

        self.check_pings();
        Ok(())
    }

    pub fn run(&mut self, shutdown: Arc<AtomicBool>) {
        info!(thread = self.index, "provider thread starting");
        while !shutdown.load(Ordering::Relaxed) {
            if let Err(e) = self.tick_once() {
                warn!(thread = self.index, error = %e, "tick failed");
            }
        }
        for (channel_id, session) in self.sessions.iter_mut() {
            let freed = session.destroy();
            info!(thread = self.index, channel_id, freed = freed.len(), "session destroyed on shutdown");
        }
    }

    fn read_channels_until(&mut self, stop_time: Instant) -> Result<(), mdp_transport::TransportError> {
        let remaining = stop_time.saturating_duration_since(Instant::now());
        let tick = self.channels.tick(remaining)?;
        // Self-dispatch: this thread owns the listener that just accepted
        // these connections, so it hands them straight to its own inbox
        // rather than going through the cross-thread admission dispatcher
        // (spec.md §4.K), which only makes sense for a shared acceptor.
        for channel_id in tick.accepted {
            self.inbox.push(channel_id);
        }
        for channel_id in tick.readable {
            let Some(chan) = self.channels.channel_mut(channel_id) else { continue };
            match chan.read_all() {
                Ok(frames) => {
                    for frame in frames {
                        match self.codec.decode(&frame) {
                            Ok(msg) => self.handle_inbound(channel_id, msg),
                            Err(e) => warn!(thread = self.index, channel_id, error = %e, "failed to decode frame"),
                        }
                    }
                }
                Err(e) => {
                    warn!(thread = self.index, channel_id, error = %e, "read failed, closing channel");
                    self.close_session(channel_id);
                }
            }
        }
        Ok(())
    }

    /// Dispatches one decoded inbound message to the channel lifecycle FSM
    /// (spec.md §4.L) or the item admission policy (spec.md §4.E),
    /// depending on domain and class.
    fn handle_inbound(&mut self, channel_id: usize, msg: WireMessage) {
        match (msg.domain_type, msg.msg_class) {
            (DomainType::Login, MsgClass::Request) => {
                self.apply_ready_event(channel_id, ReadyEvent::LoginRefreshReceived);
            }
            (DomainType::Source, MsgClass::Request) => {
                let provides_both_dictionaries = msg.services.is_empty() || msg.services.iter().any(|s| s.provides_both_dictionaries());
                self.apply_ready_event(channel_id, ReadyEvent::DirectoryRefreshReceived { provides_both_dictionaries });
            }
            (DomainType::Dictionary, MsgClass::Request) => match msg.dictionary_kind {
                Some(DictionaryKind::Field) => self.apply_ready_event(channel_id, ReadyEvent::FieldDictionaryComplete),
                Some(DictionaryKind::Enum) => self.apply_ready_event(channel_id, ReadyEvent::EnumDictionaryComplete),
                None => {}
            },
            (DomainType::MarketPrice, MsgClass::Request) => self.handle_item_request(channel_id, msg),
            (DomainType::MarketPrice, MsgClass::Close) => {
                let Some(session) = self.sessions.get_mut(&channel_id) else { return };
                if session.items.free_item(msg.stream_id) {
                    self.counters.close_msg.increment();
                }
            }
            _ => {}
        }
    }

    fn apply_ready_event(&mut self, channel_id: usize, event: ReadyEvent) {
        let Some(session) = self.sessions.get_mut(&channel_id) else { return };
        if session.readiness.apply(event) {
            info!(thread = self.index, channel_id, "channel ready");
        }
    }

    /// Runs a `Request` message through admission (spec.md §4.E) and
    /// routes the outcome into the item registry's queues.
    fn handle_item_request(&mut self, channel_id: usize, msg: WireMessage) {
        self.counters.item_request.increment();
        let Some(attributes) = msg.item_attributes else { return };
        let Some(session) = self.sessions.get_mut(&channel_id) else { return };

        let is_streaming = !msg.no_refresh;
        match session.items.admit(msg.stream_id, &attributes, msg.qos_request, msg.no_refresh) {
            Ok(AdmissionOutcome::Create) => {
                session.items.create_item(msg.stream_id, attributes, is_streaming);
            }
            Ok(AdmissionOutcome::Reissue { no_refresh }) => {
                session.items.requeue_for_reissue(msg.stream_id, no_refresh);
            }
            Err(reason) => {
                warn!(thread = self.index, channel_id, stream_id = msg.stream_id, reason = %reason, "item request rejected");
            }
        }
    }

    /// Walks the active sessions and emits refresh/update/genMsg bursts
    /// (spec.md §4.I "send_burst").
    fn send_burst(&mut self, stop_time: Instant) {
        let channel_ids: Vec<usize> = self.sessions.keys().copied().collect();
        for channel_id in channel_ids {
            let skip = self
                .sessions
                .get(&channel_id)
                .map(|s| Instant::now() < s.time_activated)
                .unwrap_or(true);
            if skip {
                continue;
            }

            self.send_update_burst(channel_id);
            self.send_gen_msg_burst(channel_id);
            self.send_refresh_burst(channel_id, stop_time);
        }
    }

    fn send_update_burst(&mut self, channel_id: usize) {
        if self.config.updates_per_sec == 0 {
            return;
        }
        let tick_index = self.tick_index;
        let Some(session) = self.sessions.get_mut(&channel_id) else { return };
        if session.items.update_queue_len() == 0 {
            return;
        }
        let count = session.update_schedule.count_for_tick(tick_index);
        let always_latency = session.update_schedule.is_latency_always();
        let latency_index = if always_latency { None } else { session.update_schedule.latency_index_for_tick(count) };
        let mut items = Vec::with_capacity(count as usize);
        for i in 0..count {
            let Some(stream_id) = session.items.next_update_item() else { break };
            let latency_stamped = always_latency || latency_index == Some(i);
            items.push((stream_id, latency_stamped));
        }
        for (stream_id, latency_stamped) in items {
            self.emit_one(channel_id, stream_id, latency_stamped, false);
        }
    }

    fn send_gen_msg_burst(&mut self, channel_id: usize) {
        if self.config.gen_msgs_per_sec == 0 {
            return;
        }
        let tick_index = self.tick_index;
        let Some(session) = self.sessions.get_mut(&channel_id) else { return };
        if session.items.update_queue_len() == 0 {
            return;
        }
        let count = session.gen_msg_schedule.count_for_tick(tick_index);
        let always_latency = session.gen_msg_schedule.is_latency_always();
        let latency_index = if always_latency { None } else { session.gen_msg_schedule.latency_index_for_tick(count) };
        let mut items = Vec::with_capacity(count as usize);
        for i in 0..count {
            let Some(stream_id) = session.items.next_update_item() else { break };
            let latency_stamped = always_latency || latency_index == Some(i);
            items.push((stream_id, latency_stamped));
        }
        for (stream_id, latency_stamped) in items {
            self.emit_one(channel_id, stream_id, latency_stamped, true);
            self.counters.gen_msg_sent.increment();
            if latency_stamped {
                self.counters.latency_gen_msg_sent.increment();
            }
        }
    }

    fn send_refresh_burst(&mut self, channel_id: usize, stop_time: Instant) {
        let burst_size = self.config.refresh_burst_size;
        loop {
            if Instant::now() >= stop_time {
                break;
            }
            let Some(session) = self.sessions.get_mut(&channel_id) else { return };
            if session.items.refresh_queue_len() == 0 {
                break;
            }
            let batch = session.items.take_refresh_burst(burst_size);
            if batch.is_empty() {
                break;
            }
            for stream_id in batch {
                self.emit_one(channel_id, stream_id, false, false);
                self.counters.refresh_msg.increment();
                let Some(session) = self.sessions.get_mut(&channel_id) else { continue };
                let is_streaming = session.items.item(stream_id).map(|i| i.is_streaming).unwrap_or(false);
                if is_streaming {
                    session.items.promote_to_update_queue(stream_id);
                } else {
                    session.items.free_item(stream_id);
                }
            }
        }
    }

    /// Acquires a buffer, encodes (or patches a pre-encoded template) and
    /// submits one message (spec.md §4.G, §4.I). Follows the
    /// latency-preserving encoding rule: a latency-stamped message is
    /// always freshly encoded so the stamp reaches the wire bytes, while
    /// an unstamped message reuses the session's pre-encoded template
    /// (when `pre_encode` is on) and only patches the stream id.
    fn emit_one(&mut self, channel_id: usize, stream_id: i32, latency_stamped: bool, is_gen_msg: bool) {
        let send_timestamp = now_timestamp(self.config.nano_time);
        let msg = mdp_wire::WireMessage::new(
            stream_id,
            mdp_wire::DomainType::MarketPrice,
            if is_gen_msg { mdp_wire::MsgClass::Generic } else { mdp_wire::MsgClass::Update },
        );
        let msg = if latency_stamped { msg.with_latency(send_timestamp) } else { msg };

        let estimated = crate::sizing::estimate_message_size(msg.domain_type, latency_stamped);
        let Some(chan) = self.channels.channel_mut(channel_id) else { return };
        let Some(session) = self.sessions.get_mut(&channel_id) else { return };

        if session.buffering.acquire(chan, estimated).is_err() {
            self.counters.out_of_buffers.increment();
            chan.need_flush = true;
            return;
        }

        let template_index = usize::from(is_gen_msg);
        let use_template = !latency_stamped && session.config.pre_encode && session.templates.len() > template_index;

        let mut encoded = Vec::new();
        if use_template {
            encoded.extend_from_slice(&session.templates[template_index].bytes);
            if self.codec.replace_stream_id(&mut encoded, stream_id).is_err() {
                warn!(thread = self.index, channel_id, "pre-encoded template too small for stream id patch");
                return;
            }
        } else {
            let encode_start = session.config.measure_encode.then(Instant::now);
            if self.codec.encode_into(&msg, &mut encoded).is_err() {
                return;
            }
            if let Some(start) = encode_start {
                self.encode_time_records.submit(0, start.elapsed().as_nanos() as u64, 1_000);
            }
        }

        let Some(buf) = session.buffering.writing_buffer_mut() else { return };
        let Some(slot) = buf.write_slot(encoded.len()) else { return };
        slot.copy_from_slice(&encoded);

        match session.buffering.submit(chan, encoded.len(), true) {
            Ok(WriteOutcome::FlushPending) => chan.need_flush = true,
            Ok(_) => {}
            Err(e) => warn!(thread = self.index, channel_id, error = %e, "submit failed"),
        }
        self.counters.msg_sent.increment();

        if latency_stamped {
            let ticks_per_unit = if self.config.nano_time { 1_000 } else { 1 };
            self.time_records.submit(send_timestamp, now_timestamp(self.config.nano_time), ticks_per_unit);
        }
    }

    fn accept_new_channels(&mut self) {
        for channel_id in self.inbox.drain() {
            self.create_session(channel_id);
            info!(thread = self.index, channel_id, "session upgraded from inbox");
        }
    }

    /// Builds a fresh `ProviderSession` for an already-connected channel,
    /// whether it arrived via the inbound-accept inbox or this thread's
    /// own outbound connect (spec.md §4.D "initialize").
    fn create_session(&mut self, channel_id: usize) {
        let items = ItemRegistry::new(self.config.open_limit, self.config.service_id, mdp_wire::Qos::REALTIME);
        let buffering = mdp_transport::SessionBuffering::new(self.config.packing_buffer_length, self.config.max_per_pack);
        let update_schedule = BurstSchedule::new(
            self.config.updates_per_sec,
            self.config.latency_updates_per_sec,
            self.config.ticks_per_sec,
            1,
        )
        .expect("validated at startup");
        let gen_msg_schedule = BurstSchedule::new(
            self.config.gen_msgs_per_sec,
            self.config.latency_gen_msgs_per_sec,
            self.config.ticks_per_sec,
            1,
        )
        .expect("validated at startup");
        let session_config = SessionConfig {
            refresh_burst_size: self.config.refresh_burst_size,
            pre_encode: self.config.pre_encode,
            measure_encode: self.config.measure_encode,
            nano_time: self.config.nano_time,
            download_dictionaries: self.config.download_dictionaries,
        };
        let mut session = ProviderSession::new(channel_id, items, buffering, update_schedule, gen_msg_schedule, session_config);
        session.readiness.apply(ReadyEvent::ChannelActive);
        if self.config.pre_encode {
            let dummy_messages = [
                WireMessage::new(0, DomainType::MarketPrice, MsgClass::Update),
                WireMessage::new(0, DomainType::MarketPrice, MsgClass::Generic),
            ];
            session.pre_encode_templates(&self.codec, &dummy_messages);
        }
        if self.config.kind == ProviderKind::NonInteractive {
            let names = partition_ni_items(self.index, self.config.ni_thread_count, self.config.ni_item_count, self.config.ni_common_item_count);
            let seeded = session.items.seed_non_interactive(names);
            info!(thread = self.index, channel_id, count = seeded.len(), "non-interactive items seeded");
        }
        self.sessions.insert(channel_id, session);
        *self.connection_count.lock().expect("connection count mutex poisoned") += 1;
    }

    fn check_pings(&mut self) {
        let timed_out = self.channels.check_all_pings(Instant::now());
        for channel_id in timed_out {
            warn!(thread = self.index, channel_id, "ping timed out, closing channel");
            self.close_session(channel_id);
        }
    }

    fn close_session(&mut self, channel_id: usize) {
        if let Some(mut session) = self.sessions.remove(&channel_id) {
            session.destroy();
            *self.connection_count.lock().expect("connection count mutex poisoned") -= 1;
        }
        if let Some(chan) = self.channels.channel_mut(channel_id) {
            chan.state = ChannelState::Inactive;
        }
        self.channels.remove_channel(channel_id);
    }
}

fn now_timestamp(nano_time: bool) -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    if nano_time {
        now.as_nanos() as u64
    } else {
        now.as_micros() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdp_wire::{ItemAttributes, MsgKey};

    fn test_thread_config() -> ThreadConfig {
        ThreadConfig {
            ticks_per_sec: 1000,
            updates_per_sec: 0,
            latency_updates_per_sec: 0,
            gen_msgs_per_sec: 0,
            latency_gen_msgs_per_sec: 0,
            refresh_burst_size: 10,
            open_limit: 10,
            service_id: 1,
            max_output_buffers: 16,
            ping_timeout: Duration::from_secs(6),
            packing_buffer_length: 0,
            max_per_pack: 1,
            pre_encode: false,
            measure_encode: false,
            nano_time: false,
            download_dictionaries: true,
            kind: ProviderKind::Interactive,
            ni_item_count: 0,
            ni_common_item_count: 0,
            ni_thread_count: 1,
        }
    }

    fn test_thread() -> ProviderThread {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        ProviderThread::new(0, addr, test_thread_config(), Arc::new(SessionInbox::default()), Arc::new(Mutex::new(0))).expect("bind ephemeral port")
    }

    fn test_session(channel_id: usize) -> ProviderSession {
        let items = ItemRegistry::new(10, 1, mdp_wire::Qos::REALTIME);
        let buffering = mdp_transport::SessionBuffering::new(0, 1);
        let update_schedule = BurstSchedule::new(0, 0, 1000, 1).unwrap();
        let gen_msg_schedule = BurstSchedule::new(0, 0, 1000, 1).unwrap();
        let config = SessionConfig {
            refresh_burst_size: 10,
            pre_encode: false,
            measure_encode: false,
            nano_time: false,
            download_dictionaries: true,
        };
        ProviderSession::new(channel_id, items, buffering, update_schedule, gen_msg_schedule, config)
    }

    #[test]
    fn login_source_dictionary_sequence_drives_readiness_to_ready() {
        let mut thread = test_thread();
        let mut session = test_session(7);
        session.readiness.apply(mdp_transport::ReadyEvent::ChannelActive);
        thread.sessions.insert(7, session);

        thread.handle_inbound(7, WireMessage::new(1, DomainType::Login, MsgClass::Request));
        thread.handle_inbound(7, WireMessage::new(1, DomainType::Source, MsgClass::Request));
        thread.handle_inbound(
            7,
            WireMessage::new(1, DomainType::Dictionary, MsgClass::Request).with_dictionary_kind(mdp_wire::DictionaryKind::Field),
        );
        assert!(!thread.sessions[&7].readiness.is_ready());
        thread.handle_inbound(
            7,
            WireMessage::new(1, DomainType::Dictionary, MsgClass::Request).with_dictionary_kind(mdp_wire::DictionaryKind::Enum),
        );
        assert!(thread.sessions[&7].readiness.is_ready());
    }

    #[test]
    fn item_request_then_close_on_same_stream_restores_open_item_count() {
        let mut thread = test_thread();
        thread.sessions.insert(3, test_session(3));

        let attributes = ItemAttributes::new(DomainType::MarketPrice, MsgKey::new("TRI.N".as_bytes(), 1));
        let request = WireMessage::new(5, DomainType::MarketPrice, MsgClass::Request).with_item_attributes(attributes);
        thread.handle_inbound(3, request);
        assert_eq!(thread.sessions[&3].items.open_items_count(), 1);

        let close = WireMessage::new(5, DomainType::MarketPrice, MsgClass::Close);
        thread.handle_inbound(3, close);
        assert_eq!(thread.sessions[&3].items.open_items_count(), 0);
    }

    #[test]
    fn thousand_items_split_evenly_across_two_threads_with_no_common_items() {
        let thread0 = partition_ni_items(0, 2, 1000, 0);
        let thread1 = partition_ni_items(1, 2, 1000, 0);
        assert_eq!(thread0.len(), 500);
        assert_eq!(thread1.len(), 500);
        assert_eq!(thread0[0], "NI_ITEM_0");
        assert_eq!(thread1[0], "NI_ITEM_500");
    }

    #[test]
    fn common_items_are_prepended_to_every_thread_partition() {
        let thread0 = partition_ni_items(0, 2, 1000, 100);
        let thread1 = partition_ni_items(1, 2, 1000, 100);
        assert_eq!(thread0.len(), 550);
        assert_eq!(thread1.len(), 550);
        assert_eq!(thread0[0], "NI_COMMON_0");
        assert_eq!(thread1[0], "NI_COMMON_0");
    }

    #[test]
    fn non_interactive_thread_dials_out_and_self_seeds_without_a_peer() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
        let addr = listener.local_addr().expect("local addr");

        let mut config = test_thread_config();
        config.kind = ProviderKind::NonInteractive;
        config.ni_item_count = 4;
        config.ni_common_item_count = 0;
        config.ni_thread_count = 1;

        let thread = ProviderThread::new(0, addr, config, Arc::new(SessionInbox::default()), Arc::new(Mutex::new(0))).expect("connect outbound");

        assert_eq!(thread.sessions.len(), 1);
        let session = thread.sessions.values().next().expect("one self-initiated session");
        assert!(session.readiness.is_ready());
        assert_eq!(session.items.refresh_queue_len(), 4);
        assert_eq!(*thread.connection_count.lock().unwrap(), 1);

        drop(listener);
    }
}
