//! Snapshot persistence for entity registries.
//!
//! Each entity type is stored as one whole-collection snapshot, named after
//! the type (lower-cased). Snapshots self-describe the types they contain so
//! load order can be planned before anything is materialized.
//!
//! - [`SnapshotStore`] is the storage contract
//! - [`FileSnapshotStore`] keeps one JSON file per type in a directory
//! - [`InMemorySnapshotStore`] keeps the same documents in memory for tests

mod error;
mod file;
mod memory;
mod record;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileSnapshotStore;
pub use memory::InMemorySnapshotStore;
pub use record::{
    Record, StoredValue, TYPE_TAG, decode_snapshot, encode_snapshot, scan_type_names,
};
pub use traits::SnapshotStore;
