use mdp_collections::hash_table::HashTable;
use mdp_collections::rotating_queue::{NodeId, RotatingQueue};
use mdp_wire::{ItemAttributes, QosRequest, RejectReason};

use crate::item::{DomainPayloadState, ItemInfo};

const STREAM_ID_BUCKETS: usize = 10_007;
const ATTRIBUTE_BUCKETS: usize = 10_007;

/// Which rotating queue currently holds an item (spec.md §4.E: items
/// start in the refresh queue and move to the update queue once their
/// refresh completes, per §5 "Ordering guarantees").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeQueueKind {
    Refresh,
    Update,
}

/// Per-session item indexing and admission (spec.md §4.E). Owns the two
/// hash tables (by stream id, by attributes) and the two rotating queues;
/// every `ItemInfo` lives in a `Vec<Option<_>>` arena addressed by index
/// so the hash tables and queues can all reference it without duplicating
/// storage (spec.md §9 "index-based arenas").
pub struct ItemRegistry {
    arena: Vec<Option<ItemInfo>>,
    free: Vec<usize>,
    by_stream_id: HashTable<i32, usize>,
    by_attributes: HashTable<ItemAttributes, usize>,
    refresh_queue: RotatingQueue<usize>,
    update_queue: RotatingQueue<usize>,
    open_items_count: usize,
    pub open_limit: usize,
    pub provisioned_service_id: u16,
    pub provisioned_qos: mdp_wire::Qos,
}

impl ItemRegistry {
    pub fn new(open_limit: usize, provisioned_service_id: u16, provisioned_qos: mdp_wire::Qos) -> Self {
        ItemRegistry {
            arena: Vec::new(),
            free: Vec::new(),
            by_stream_id: HashTable::new(STREAM_ID_BUCKETS),
            by_attributes: HashTable::new(ATTRIBUTE_BUCKETS),
            refresh_queue: RotatingQueue::new(),
            update_queue: RotatingQueue::new(),
            open_items_count: 0,
            open_limit,
            provisioned_service_id,
            provisioned_qos,
        }
    }

    pub fn open_items_count(&self) -> usize {
        self.open_items_count
    }

    pub fn find_open_item(&self, attributes: &ItemAttributes) -> Option<i32> {
        self.by_attributes
            .find(attributes)
            .and_then(|&idx| self.arena[idx].as_ref())
            .map(|item| item.stream_id)
    }

    /// True iff `stream_id` is occupied by an item whose key differs from
    /// `key` — distinguishes a reissue (same key) from a genuine conflict
    /// (spec.md §4.E).
    pub fn is_stream_in_use(&self, stream_id: i32, attributes: &ItemAttributes) -> bool {
        match self.by_stream_id.find(&stream_id) {
            Some(&idx) => self.arena[idx]
                .as_ref()
                .map(|item| &item.attributes != attributes)
                .unwrap_or(false),
            None => false,
        }
    }

    /// Request admission policy (spec.md §4.E, checked in order).
    pub fn admit(
        &self,
        stream_id: i32,
        attributes: &ItemAttributes,
        qos_request: Option<QosRequest>,
        no_refresh: bool,
    ) -> Result<AdmissionOutcome, RejectReason> {
        if self.open_items_count >= self.open_limit {
            return Err(RejectReason::ItemCountReached);
        }
        if attributes.msg_key.service_id != self.provisioned_service_id {
            return Err(RejectReason::InvalidServiceId);
        }
        if let Some(req) = qos_request {
            let ok = match req {
                QosRequest::Exact(q) => q == self.provisioned_qos,
                QosRequest::Range(lo, hi) => self.provisioned_qos.in_range(lo, hi),
            };
            if !ok {
                return Err(RejectReason::QosNotSupported);
            }
        }
        if let Some(existing_stream) = self.find_open_item(attributes) {
            if existing_stream != stream_id {
                return Err(RejectReason::ItemAlreadyOpened);
            }
        }
        if self.is_stream_in_use(stream_id, attributes) {
            return Err(RejectReason::StreamAlreadyInUse);
        }

        if self.by_stream_id.find(&stream_id).is_some() {
            Ok(AdmissionOutcome::Reissue { no_refresh })
        } else {
            Ok(AdmissionOutcome::Create)
        }
    }

    /// Deep-copies `attributes`, creates the item, indexes it under both
    /// tables and the refresh queue (spec.md §4.E "createItem").
    pub fn create_item(&mut self, stream_id: i32, attributes: ItemAttributes, is_streaming: bool) -> i32 {
        let idx = if let Some(idx) = self.free.pop() {
            idx
        } else {
            self.arena.push(None);
            self.arena.len() - 1
        };

        let queue_node = self.refresh_queue.insert(idx);
        self.arena[idx] = Some(ItemInfo {
            stream_id,
            attributes: attributes.clone(),
            is_streaming,
            queue_kind: NodeQueueKind::Refresh,
            queue_node,
            payload: DomainPayloadState::default(),
        });

        self.by_stream_id.insert(stream_id, idx);
        self.by_attributes.insert(attributes, idx);
        self.open_items_count += 1;
        stream_id
    }

    /// Moves a reissued item back to the refresh queue (spec.md §4.E step
    /// 6, "reissue ... moved back to the refresh queue if NO_REFRESH is
    /// not set").
    pub fn requeue_for_reissue(&mut self, stream_id: i32, no_refresh: bool) {
        if no_refresh {
            return;
        }
        let Some(&idx) = self.by_stream_id.find(&stream_id) else { return };
        let item = self.arena[idx].as_mut().expect("indexed item present");
        if item.queue_kind == NodeQueueKind::Refresh {
            return;
        }
        let old_node = item.queue_node;
        self.update_queue.remove(old_node);
        let new_node = self.refresh_queue.insert(idx);
        let item = self.arena[idx].as_mut().expect("indexed item present");
        item.queue_kind = NodeQueueKind::Refresh;
        item.queue_node = new_node;
    }

    /// Moves an item from the refresh queue to the update queue once its
    /// refresh has been sent (spec.md §4.I "move it from refresh queue to
    /// update queue").
    pub fn promote_to_update_queue(&mut self, stream_id: i32) {
        let Some(&idx) = self.by_stream_id.find(&stream_id) else { return };
        let item = self.arena[idx].as_mut().expect("indexed item present");
        debug_assert_eq!(item.queue_kind, NodeQueueKind::Refresh);
        let old_node = item.queue_node;
        self.refresh_queue.remove(old_node);
        let new_node = self.update_queue.insert(idx);
        let item = self.arena[idx].as_mut().expect("indexed item present");
        item.queue_kind = NodeQueueKind::Update;
        item.queue_node = new_node;
    }

    /// Removes an item from both hash tables and its current queue, and
    /// frees its arena slot (spec.md §4.E "freeItem").
    pub fn free_item(&mut self, stream_id: i32) -> bool {
        let Some(idx) = self.by_stream_id.remove(&stream_id) else {
            return false;
        };
        let item = self.arena[idx].take().expect("indexed item present");
        self.by_attributes.remove(&item.attributes);
        match item.queue_kind {
            NodeQueueKind::Refresh => {
                self.refresh_queue.remove(item.queue_node);
            }
            NodeQueueKind::Update => {
                self.update_queue.remove(item.queue_node);
            }
        }
        self.free.push(idx);
        self.open_items_count -= 1;
        true
    }

    pub fn item(&self, stream_id: i32) -> Option<&ItemInfo> {
        self.by_stream_id
            .find(&stream_id)
            .and_then(|&idx| self.arena[idx].as_ref())
    }

    pub fn item_mut(&mut self, stream_id: i32) -> Option<&mut ItemInfo> {
        match self.by_stream_id.find(&stream_id) {
            Some(&idx) => self.arena[idx].as_mut(),
            None => None,
        }
    }

    pub fn refresh_queue_len(&self) -> usize {
        self.refresh_queue.len()
    }

    pub fn update_queue_len(&self) -> usize {
        self.update_queue.len()
    }

    /// Pops up to `max` items from the refresh queue's head in FIFO order
    /// (used by the refresh burst, spec.md §4.I).
    pub fn take_refresh_burst(&mut self, max: usize) -> Vec<i32> {
        let mut out = Vec::with_capacity(max.min(self.refresh_queue.len()));
        let mut next = self.refresh_queue.peek_front_as_list();
        while out.len() < max {
            let Some(node) = next else { break };
            next = self.refresh_queue.peek_next_as_list(node);
            let idx = *self.refresh_queue.get(node);
            let stream_id = self.arena[idx].as_ref().expect("indexed item present").stream_id;
            out.push(stream_id);
        }
        out
    }

    /// Advances and returns the next item from the update queue for a
    /// burst (spec.md §4.F step 3, "choose the next item from updateQueue
    /// via RotatingQueue::next").
    pub fn next_update_item(&mut self) -> Option<i32> {
        let node = self.update_queue.next()?;
        let idx = *self.update_queue.get(node);
        Some(self.arena[idx].as_ref().expect("indexed item present").stream_id)
    }

    /// Server-initiated item creation for non-interactive providers
    /// (spec.md §6 "-itemCount/-commonItemCount", §8 scenario 4): items
    /// are published unconditionally, skipping the request-driven
    /// `admit` checks entirely since there is no requesting peer.
    /// `names` supplies the item name for each created stream id, in
    /// order; stream ids are assigned sequentially starting at 1.
    pub fn seed_non_interactive(&mut self, names: impl IntoIterator<Item = String>) -> Vec<i32> {
        let mut created = Vec::new();
        for (offset, name) in names.into_iter().enumerate() {
            let stream_id = (offset + 1) as i32;
            let key = mdp_wire::MsgKey::new(name.into_bytes(), self.provisioned_service_id);
            let attributes = ItemAttributes::new(mdp_wire::DomainType::MarketPrice, key);
            created.push(self.create_item(stream_id, attributes, true));
        }
        created
    }

    /// Drains both queues (spec.md §4.H destruction: "frees all remaining
    /// items (drain both rotating queues)"). Returns the freed stream ids.
    pub fn drain_all(&mut self) -> Vec<i32> {
        let refresh_ids: Vec<usize> = self.refresh_queue.drain_all();
        let update_ids: Vec<usize> = self.update_queue.drain_all();
        let mut stream_ids = Vec::with_capacity(refresh_ids.len() + update_ids.len());
        for idx in refresh_ids.into_iter().chain(update_ids) {
            if let Some(item) = self.arena[idx].take() {
                self.by_stream_id.remove(&item.stream_id);
                self.by_attributes.remove(&item.attributes);
                stream_ids.push(item.stream_id);
                self.open_items_count -= 1;
            }
        }
        self.arena.clear();
        self.free.clear();
        stream_ids
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    Create,
    Reissue { no_refresh: bool },
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdp_wire::{DomainType, MsgKey};

    fn attrs(name: &str, service_id: u16) -> ItemAttributes {
        ItemAttributes::new(DomainType::MarketPrice, MsgKey::new(name.as_bytes(), service_id))
    }

    #[test]
    fn invariant_counts_stay_consistent_through_create_and_free() {
        let mut reg = ItemRegistry::new(10, 1, mdp_wire::Qos::REALTIME);
        reg.create_item(1, attrs("TRI.N", 1), true);
        reg.create_item(2, attrs("IBM.N", 1), true);
        assert_eq!(reg.open_items_count(), 2);
        assert_eq!(reg.refresh_queue_len() + reg.update_queue_len(), reg.open_items_count());

        reg.promote_to_update_queue(1);
        assert_eq!(reg.refresh_queue_len() + reg.update_queue_len(), reg.open_items_count());

        assert!(reg.free_item(1));
        assert_eq!(reg.open_items_count(), 1);
        assert_eq!(reg.refresh_queue_len() + reg.update_queue_len(), reg.open_items_count());
    }

    #[test]
    fn item_count_reached_rejects_without_disturbing_existing_items() {
        let mut reg = ItemRegistry::new(1, 1, mdp_wire::Qos::REALTIME);
        reg.create_item(1, attrs("TRI.N", 1), true);
        let outcome = reg.admit(2, &attrs("IBM.N", 1), None, false);
        assert_eq!(outcome, Err(RejectReason::ItemCountReached));
        assert_eq!(reg.open_items_count(), 1);
    }

    #[test]
    fn same_stream_id_different_key_is_stream_already_in_use() {
        let mut reg = ItemRegistry::new(10, 1, mdp_wire::Qos::REALTIME);
        reg.create_item(1, attrs("TRI.N", 1), true);
        let outcome = reg.admit(1, &attrs("IBM.N", 1), None, false);
        assert_eq!(outcome, Err(RejectReason::StreamAlreadyInUse));
    }

    #[test]
    fn request_then_close_restores_open_item_count() {
        let mut reg = ItemRegistry::new(10, 1, mdp_wire::Qos::REALTIME);
        let before = reg.open_items_count();
        reg.create_item(1, attrs("TRI.N", 1), true);
        assert!(reg.free_item(1));
        assert_eq!(reg.open_items_count(), before);
    }
}
