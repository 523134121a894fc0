//! Storage contract for per-type snapshots.

use std::collections::BTreeSet;

use super::{Record, Result};

/// Store holding one serialized collection per entity type.
///
/// Implementations resolve a type name to its resource themselves; callers
/// always pass the entity type name (e.g. `CampoutScout`).
pub trait SnapshotStore: Send + Sync {
    /// Check whether a snapshot exists for a type.
    fn exists(&self, type_name: &str) -> bool;

    /// Type names referenced anywhere inside a type's snapshot, other than
    /// the type itself.
    ///
    /// The snapshot is walked structurally; no entity is materialized.
    /// Fails with `MissingResource` if there is no snapshot.
    fn dependency_type_names(&self, type_name: &str) -> Result<BTreeSet<String>>;

    /// Load every record of a type.
    ///
    /// Fails with `MissingResource` if there is no snapshot, which callers
    /// treat as an empty collection.
    fn load(&self, type_name: &str) -> Result<Vec<Record>>;

    /// Replace a type's snapshot with `records`.
    fn save(&self, type_name: &str, records: &[Record]) -> Result<()>;

    /// Remove a type's snapshot, if any.
    fn delete(&self, type_name: &str) -> Result<()>;

    /// List the resource names currently stored.
    fn list_resources(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }
}
