//! Estimated message sizes, logged once at session start and used by
//! `SessionBuffering::acquire` to size outbound buffers before the real
//! message exists (SPEC_FULL.md §11 "Estimated-size message sizing").

use mdp_wire::{BincodeCodec, Codec, DomainType, MsgClass, WireMessage};

/// Estimated encoded size of a message in the given domain, with or
/// without a latency timestamp attached.
pub fn estimate_message_size(domain: DomainType, latency_stamped: bool) -> usize {
    let codec = BincodeCodec;
    let dummy = WireMessage::new(0, domain, MsgClass::Update);
    let dummy = if latency_stamped { dummy.with_latency(0) } else { dummy };
    codec.estimate_size(&dummy)
}

/// Logs the estimated size table for every domain this engine emits,
/// mirroring the reference tool's `printEstimatedMsgSizes` startup log.
pub fn log_estimated_sizes() {
    for domain in [DomainType::MarketPrice] {
        for latency_stamped in [false, true] {
            tracing::debug!(
                ?domain,
                latency_stamped,
                bytes = estimate_message_size(domain, latency_stamped),
                "estimated message size"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_stamped_messages_estimate_larger_than_plain() {
        let plain = estimate_message_size(DomainType::MarketPrice, false);
        let stamped = estimate_message_size(DomainType::MarketPrice, true);
        assert!(stamped >= plain);
    }
}
