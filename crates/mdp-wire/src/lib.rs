//! Wire-level types and a codec stand-in shared by the publisher engine.
//!
//! This crate intentionally does not implement a real market-data wire
//! format: spec.md §1 places the field-list/map encoding, dictionary/XML
//! loading, and JSON conversion out of core scope. What's here is just
//! enough surface — item attributes, message classes, a binary codec with
//! a stream-id-replace operation — for `mdp-core`/`mdp-transport` to drive
//! realistically.

pub mod attributes;
pub mod codec;
pub mod msg;
pub mod rdm;
pub mod reject;

pub use attributes::{DomainType, ItemAttributes, MsgKey, MsgKeyFlags, Qos, QosRequest};
pub use codec::{BincodeCodec, Codec, CodecError};
pub use msg::{DataState, MsgClass, State, StreamState, WireMessage};
pub use rdm::{DictionaryKind, ServiceInfo, ENUM_DICT_NAME, FIELD_DICT_NAME};
pub use reject::RejectReason;
