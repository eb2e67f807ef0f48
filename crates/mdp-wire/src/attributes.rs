use std::hash::{Hash, Hasher};

/// Domain of a streaming item. The full RWF/OMM domain model is out of
/// scope; only the domains the publisher engine needs to dispatch on are
/// modeled (spec.md §3, §4.E "factory dispatch on domain").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum DomainType {
    Login = 1,
    Source = 4,
    Dictionary = 5,
    MarketPrice = 6,
    MarketByOrder = 7,
}

impl DomainType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Login),
            4 => Some(Self::Source),
            5 => Some(Self::Dictionary),
            6 => Some(Self::MarketPrice),
            7 => Some(Self::MarketByOrder),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// Flags present on a `MsgKey`. Mirrors the subset of RSSL_MKF_* flags
    /// the engine actually branches on: whether a name, service id, and
    /// attrib blob are present.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct MsgKeyFlags: u8 {
        const HAS_SERVICE_ID = 0b0000_0001;
        const HAS_NAME       = 0b0000_0010;
        const HAS_NAME_TYPE  = 0b0000_0100;
        const HAS_ATTRIB     = 0b0000_1000;
    }
}

/// Composite message key. Two keys are equal iff every *present* field
/// matches bit-exactly (spec.md §3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MsgKey {
    pub flags: MsgKeyFlags,
    pub name_type: u8,
    pub name: Vec<u8>,
    pub service_id: u16,
    pub attrib: Vec<u8>,
}

impl MsgKey {
    pub fn new(name: impl Into<Vec<u8>>, service_id: u16) -> Self {
        MsgKey {
            flags: MsgKeyFlags::HAS_NAME | MsgKeyFlags::HAS_SERVICE_ID,
            name_type: 1,
            name: name.into(),
            service_id,
            attrib: Vec::new(),
        }
    }

    fn fields_equal(&self, other: &Self) -> bool {
        if self.flags != other.flags {
            return false;
        }
        if self.flags.contains(MsgKeyFlags::HAS_NAME) && self.name != other.name {
            return false;
        }
        if self.flags.contains(MsgKeyFlags::HAS_NAME_TYPE) && self.name_type != other.name_type {
            return false;
        }
        if self.flags.contains(MsgKeyFlags::HAS_SERVICE_ID) && self.service_id != other.service_id
        {
            return false;
        }
        if self.flags.contains(MsgKeyFlags::HAS_ATTRIB) && self.attrib != other.attrib {
            return false;
        }
        true
    }
}

impl PartialEq for MsgKey {
    fn eq(&self, other: &Self) -> bool {
        self.fields_equal(other)
    }
}
impl Eq for MsgKey {}

impl Hash for MsgKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Only hash fields that participate in equality, and only when
        // present, so two keys that compare equal always hash equal.
        self.flags.hash(state);
        if self.flags.contains(MsgKeyFlags::HAS_NAME) {
            self.name.hash(state);
        }
        if self.flags.contains(MsgKeyFlags::HAS_NAME_TYPE) {
            self.name_type.hash(state);
        }
        if self.flags.contains(MsgKeyFlags::HAS_SERVICE_ID) {
            self.service_id.hash(state);
        }
        if self.flags.contains(MsgKeyFlags::HAS_ATTRIB) {
            self.attrib.hash(state);
        }
    }
}

/// Item attributes: the composite key identifying an open stream
/// independent of its stream id (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ItemAttributes {
    pub domain_type: DomainType,
    pub msg_key: MsgKey,
}

impl ItemAttributes {
    pub fn new(domain_type: DomainType, msg_key: MsgKey) -> Self {
        ItemAttributes {
            domain_type,
            msg_key,
        }
    }
}

/// Quality of service, modeled just enough to support the range/exact
/// checks in the admission policy (spec.md §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Qos {
    pub rate: u32,
    pub timeliness: u32,
}

impl Qos {
    pub const REALTIME: Qos = Qos {
        rate: 0,
        timeliness: 0,
    };

    pub fn in_range(&self, lo: Qos, hi: Qos) -> bool {
        self.timeliness >= lo.timeliness
            && self.timeliness <= hi.timeliness
            && self.rate >= lo.rate
            && self.rate <= hi.rate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum QosRequest {
    Exact(Qos),
    Range(Qos, Qos),
}
