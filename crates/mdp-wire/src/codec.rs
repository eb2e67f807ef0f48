use crate::msg::WireMessage;

/// Errors surfaced by the codec stand-in. Spec.md §7 "Encoding" policy:
/// buffer-too-small is recoverable by the caller (double and retry, up to
/// an overflow guard); anything else is a programmer/data error.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Minimal opaque codec contract. The real field-list/map wire encoding is
/// out of scope (spec.md §1); this exists only so `mdp-transport` and
/// `mdp-core` have something concrete to drive. `stream_id` is guaranteed
/// to occupy the first 4 bytes of any encoded message (`StreamIdCodec`
/// relies on that layout for in-place patching, spec.md §4.G).
pub trait Codec: Send + Sync {
    fn encode_into(&self, msg: &WireMessage, out: &mut Vec<u8>) -> Result<(), CodecError>;
    fn decode(&self, buf: &[u8]) -> Result<WireMessage, CodecError>;

    /// Overwrite only the stream-id field of an already-encoded message,
    /// in place. Used by the pre-encoded-template fast path (spec.md
    /// §4.G "latency-preserving encoding rule").
    fn replace_stream_id(&self, buf: &mut [u8], new_stream_id: i32) -> Result<(), CodecError>;

    fn estimate_size(&self, msg: &WireMessage) -> usize;
}

/// `bincode`-backed implementation. `WireMessage::stream_id` is declared
/// first and is a plain `i32`, which bincode's default (non-varint,
/// little-endian, fixed-width-for-primitives) configuration always
/// serializes as the first four bytes of the output — giving us the
/// "stream-id replace is independent of surrounding fields" property the
/// design notes (spec.md §9) require without needing a hand-rolled framer.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode_into(&self, msg: &WireMessage, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let bytes = bincode::serialize(msg).map_err(|e| CodecError::Encode(e.to_string()))?;
        out.clear();
        out.extend_from_slice(&bytes);
        Ok(())
    }

    fn decode(&self, buf: &[u8]) -> Result<WireMessage, CodecError> {
        bincode::deserialize(buf).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn replace_stream_id(&self, buf: &mut [u8], new_stream_id: i32) -> Result<(), CodecError> {
        if buf.len() < 4 {
            return Err(CodecError::BufferTooSmall {
                needed: 4,
                available: buf.len(),
            });
        }
        buf[0..4].copy_from_slice(&new_stream_id.to_le_bytes());
        Ok(())
    }

    fn estimate_size(&self, msg: &WireMessage) -> usize {
        bincode::serialized_size(msg).unwrap_or(128) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::DomainType;
    use crate::msg::MsgClass;

    #[test]
    fn stream_id_occupies_first_four_bytes() {
        let codec = BincodeCodec;
        let msg = WireMessage::new(42, DomainType::MarketPrice, MsgClass::Update)
            .with_payload(vec![1, 2, 3, 4, 5]);
        let mut buf = Vec::new();
        codec.encode_into(&msg, &mut buf).unwrap();
        assert_eq!(&buf[0..4], &42i32.to_le_bytes());

        codec.replace_stream_id(&mut buf, 99).unwrap();
        let decoded = codec.decode(&buf).unwrap();
        assert_eq!(decoded.stream_id, 99);
        assert_eq!(decoded.payload, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn replace_stream_id_rejects_undersized_buffer() {
        let codec = BincodeCodec;
        let mut buf = vec![0u8; 2];
        assert!(codec.replace_stream_id(&mut buf, 1).is_err());
    }

    #[test]
    fn round_trip_preserves_latency_timestamp() {
        let codec = BincodeCodec;
        let msg = WireMessage::new(7, DomainType::MarketByOrder, MsgClass::Update).with_latency(123_456);
        let mut buf = Vec::new();
        codec.encode_into(&msg, &mut buf).unwrap();
        let decoded = codec.decode(&buf).unwrap();
        assert_eq!(decoded.latency_timestamp, 123_456);
    }
}
