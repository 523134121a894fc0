//! In-memory snapshot store for testing and development.

mod snapshot;

pub use snapshot::InMemorySnapshotStore;
