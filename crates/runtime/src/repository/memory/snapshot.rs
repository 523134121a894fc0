//! In-memory SnapshotStore implementation for tests and local runs.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use entity_core::naming::resource_name;

use crate::repository::{
    Record, RepositoryError, Result, SnapshotStore, decode_snapshot, encode_snapshot,
    scan_type_names,
};

/// In-memory implementation of SnapshotStore.
///
/// Keeps serialized snapshot text keyed by resource name, so loading and
/// dependency scanning follow the same path as the file-based store.
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<String, String>>,
}

impl InMemorySnapshotStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Seed the store with a type's records.
    pub fn with_snapshot(self, type_name: &str, records: &[Record]) -> Result<Self> {
        self.save(type_name, records)?;
        Ok(self)
    }

    /// Store raw snapshot text, bypassing serialization.
    pub fn insert_raw(&self, type_name: &str, text: impl Into<String>) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.insert(resource_name(type_name), text.into());
        Ok(())
    }

    /// Raw snapshot text for a type, if present.
    pub fn raw(&self, type_name: &str) -> Option<String> {
        self.snapshots
            .read()
            .ok()
            .and_then(|snapshots| snapshots.get(&resource_name(type_name)).cloned())
    }

    fn read(&self, type_name: &str) -> Result<String> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots
            .get(&resource_name(type_name))
            .cloned()
            .ok_or_else(|| RepositoryError::MissingResource(type_name.to_string()))
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn exists(&self, type_name: &str) -> bool {
        self.snapshots
            .read()
            .map(|snapshots| snapshots.contains_key(&resource_name(type_name)))
            .unwrap_or(false)
    }

    fn dependency_type_names(&self, type_name: &str) -> Result<BTreeSet<String>> {
        let text = self.read(type_name)?;
        scan_type_names(type_name, &text)
    }

    fn load(&self, type_name: &str) -> Result<Vec<Record>> {
        let text = self.read(type_name)?;
        decode_snapshot(type_name, &text)
    }

    fn save(&self, type_name: &str, records: &[Record]) -> Result<()> {
        let text = encode_snapshot(records)?;
        self.insert_raw(type_name, text)
    }

    fn delete(&self, type_name: &str) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.remove(&resource_name(type_name));
        Ok(())
    }

    fn list_resources(&self) -> Result<Vec<String>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut resources: Vec<String> = snapshots.keys().cloned().collect();
        resources.sort();
        Ok(resources)
    }
}
