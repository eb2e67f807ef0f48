use serde::{Deserialize, Serialize};

/// Reject reasons returned by the item admission policy (spec.md §4.E,
/// §7 "Protocol" error policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    ItemCountReached,
    InvalidServiceId,
    QosNotSupported,
    StreamAlreadyInUse,
    ItemAlreadyOpened,
    DomainNotSupported,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::ItemCountReached => "ITEM_COUNT_REACHED",
            RejectReason::InvalidServiceId => "INVALID_SERVICE_ID",
            RejectReason::QosNotSupported => "QOS_NOT_SUPPORTED",
            RejectReason::StreamAlreadyInUse => "STREAM_ALREADY_IN_USE",
            RejectReason::ItemAlreadyOpened => "ITEM_ALREADY_OPENED",
            RejectReason::DomainNotSupported => "DOMAIN_NOT_SUPPORTED",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
