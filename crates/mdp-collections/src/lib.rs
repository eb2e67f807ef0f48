//! Hot-path data structures shared by the publisher engine: a rotating
//! queue for round-robin item selection (spec.md §4.A) and a chained hash
//! table for the dual item index (spec.md §4.B).

pub mod hash_table;
pub mod rotating_queue;

pub use hash_table::{HashTable, DEFAULT_BUCKET_COUNT};
pub use rotating_queue::{NodeId, RotatingQueue};
