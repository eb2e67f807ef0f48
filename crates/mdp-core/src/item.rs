use mdp_wire::ItemAttributes;

use crate::registry::NodeQueueKind;
use mdp_collections::rotating_queue::NodeId;

/// Per-domain payload carried by an open item. The full RWF field-list /
/// map encoding is out of scope (spec.md §1 Non-goals); what survives the
/// port is the one piece every domain needs for pre-encoded templates —
/// an iterator index that must return to zero after one pass over an
/// item's fields (spec.md §4.H construction assertion).
#[derive(Debug, Default, Clone, Copy)]
pub struct DomainPayloadState {
    pub iterator_index: u32,
}

impl DomainPayloadState {
    pub fn advance(&mut self, field_count: u32) {
        self.iterator_index = (self.iterator_index + 1) % field_count.max(1);
    }
}

/// One open item (spec.md §3, §4.E). `stream_id` and `attributes` are the
/// two keys under which the registry indexes it; `queue_node`/`queue_kind`
/// record which rotating queue currently owns it so it can be moved or
/// removed without a second lookup.
#[derive(Debug)]
pub struct ItemInfo {
    pub stream_id: i32,
    pub attributes: ItemAttributes,
    pub is_streaming: bool,
    pub queue_kind: NodeQueueKind,
    pub queue_node: NodeId,
    pub payload: DomainPayloadState,
}
