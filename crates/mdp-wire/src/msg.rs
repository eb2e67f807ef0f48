use crate::attributes::{DomainType, ItemAttributes, QosRequest};
use crate::rdm::{DictionaryKind, ServiceInfo};
use serde::{Deserialize, Serialize};

/// Message class — the protocol-level verb. Semantics per the opaque
/// codec (spec.md §6 "Protocol shape").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgClass {
    Request,
    Refresh,
    Update,
    Status,
    Generic,
    Post,
    Close,
}

/// Stream/data state pair, carried on refresh and status messages. Only
/// the states the channel lifecycle FSM (spec.md §4.L) and item admission
/// (spec.md §4.E) branch on are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamState {
    Open,
    Closed,
    ClosedRecover,
    Redirected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataState {
    Ok,
    Suspect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub stream_state: StreamState,
    pub data_state: DataState,
}

impl State {
    pub const OPEN_OK: State = State {
        stream_state: StreamState::Open,
        data_state: DataState::Ok,
    };
}

/// One wire message. `payload` stands in for the encoded field-list body;
/// the real field-level encoding is out of scope (spec.md §1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub stream_id: i32,
    pub domain_type: DomainType,
    pub msg_class: MsgClass,
    pub state: Option<State>,
    /// Latency-stamp in the unit configured at startup (nanoseconds or
    /// microseconds, spec.md §4.F). `0` means "not latency-stamped".
    pub latency_timestamp: u64,
    pub refresh_complete: bool,
    /// Which dictionary a `Dictionary`-domain message carries (spec.md
    /// §4.L "advertises both RWFFld and RWFEnum"). `None` for every other
    /// domain.
    pub dictionary_kind: Option<DictionaryKind>,
    /// Item attributes carried on a `Request` message (spec.md §4.E
    /// admission policy needs the msg key to dispatch on).
    pub item_attributes: Option<ItemAttributes>,
    pub qos_request: Option<QosRequest>,
    pub no_refresh: bool,
    /// Services advertised on a `Source`-domain refresh (spec.md §4.L
    /// "advertises both RWFFld and RWFEnum"). Empty when the message
    /// carries no directory payload at all.
    pub services: Vec<ServiceInfo>,
    pub payload: Vec<u8>,
}

impl WireMessage {
    pub fn new(stream_id: i32, domain_type: DomainType, msg_class: MsgClass) -> Self {
        WireMessage {
            stream_id,
            domain_type,
            msg_class,
            state: None,
            latency_timestamp: 0,
            refresh_complete: true,
            dictionary_kind: None,
            item_attributes: None,
            qos_request: None,
            no_refresh: false,
            services: Vec::new(),
            payload: Vec::new(),
        }
    }

    pub fn with_services(mut self, services: Vec<ServiceInfo>) -> Self {
        self.services = services;
        self
    }

    pub fn with_dictionary_kind(mut self, kind: DictionaryKind) -> Self {
        self.dictionary_kind = Some(kind);
        self
    }

    pub fn with_item_attributes(mut self, attributes: ItemAttributes) -> Self {
        self.item_attributes = Some(attributes);
        self
    }

    pub fn with_qos_request(mut self, qos_request: QosRequest) -> Self {
        self.qos_request = Some(qos_request);
        self
    }

    pub fn with_no_refresh(mut self, no_refresh: bool) -> Self {
        self.no_refresh = no_refresh;
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_latency(mut self, ts: u64) -> Self {
        self.latency_timestamp = ts;
        self
    }

    pub fn with_state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }
}
