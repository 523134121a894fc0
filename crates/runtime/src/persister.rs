//! One-shot persistence of every loaded registry.

use tracing::{info, warn};

use crate::registry::Registry;
use crate::repository::{RepositoryError, SnapshotStore};

/// Result of the shutdown save.
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Types whose snapshot was written, in load order.
    pub saved: Vec<String>,
    /// Types whose snapshot could not be written.
    pub failed: Vec<(String, RepositoryError)>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Guard making the shutdown save run at most once.
#[derive(Debug, Default)]
pub struct ShutdownPersister {
    persisted: bool,
}

impl ShutdownPersister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_persisted(&self) -> bool {
        self.persisted
    }

    /// Write every given registry to the store. Only the first call does
    /// anything; later calls return `None`.
    ///
    /// A failing type is recorded in the report and does not stop the
    /// remaining types from being saved.
    pub fn trigger<'a>(
        &mut self,
        store: &dyn SnapshotStore,
        registries: impl IntoIterator<Item = &'a Registry>,
    ) -> Option<SaveReport> {
        if self.persisted {
            return None;
        }
        self.persisted = true;

        let mut report = SaveReport::default();
        for registry in registries {
            let type_name = registry.type_name().to_string();
            match store.save(&type_name, &registry.records()) {
                Ok(()) => report.saved.push(type_name),
                Err(e) => {
                    warn!("Failed to save {}: {}", type_name, e);
                    report.failed.push((type_name, e));
                }
            }
        }

        info!("Saved {}", report.saved.join(", "));
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::rc::Rc;

    use entity_core::{EntityType, Value};

    use super::*;
    use crate::repository::{InMemorySnapshotStore, Record, Result};

    /// Store that refuses to write one type.
    struct ReadOnlyFor {
        inner: InMemorySnapshotStore,
        blocked: &'static str,
    }

    impl SnapshotStore for ReadOnlyFor {
        fn exists(&self, type_name: &str) -> bool {
            self.inner.exists(type_name)
        }

        fn dependency_type_names(&self, type_name: &str) -> Result<BTreeSet<String>> {
            self.inner.dependency_type_names(type_name)
        }

        fn load(&self, type_name: &str) -> Result<Vec<Record>> {
            self.inner.load(type_name)
        }

        fn save(&self, type_name: &str, records: &[Record]) -> Result<()> {
            if type_name == self.blocked {
                return Err(RepositoryError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            self.inner.save(type_name, records)
        }

        fn delete(&self, type_name: &str) -> Result<()> {
            self.inner.delete(type_name)
        }
    }

    fn registry(name: &str, count: usize) -> Registry {
        let mut registry = Registry::new(Rc::new(EntityType::new(name).field("n")));
        for i in 0..count {
            registry.create([("n", Value::Int(i as i64))]).unwrap();
        }
        registry
    }

    #[test]
    fn test_trigger_runs_once() {
        let store = InMemorySnapshotStore::new();
        let scouts = registry("Scout", 2);
        let mut persister = ShutdownPersister::new();

        let report = persister.trigger(&store, [&scouts]).unwrap();
        assert_eq!(report.saved, ["Scout"]);
        assert_eq!(store.load("Scout").unwrap().len(), 2);

        let more = registry("Scout", 5);
        assert!(persister.trigger(&store, [&more]).is_none());
        assert_eq!(store.load("Scout").unwrap().len(), 2);
        assert!(persister.has_persisted());
    }

    #[test]
    fn test_failure_does_not_stop_other_types() {
        let store = ReadOnlyFor {
            inner: InMemorySnapshotStore::new(),
            blocked: "Campout",
        };
        let campouts = registry("Campout", 1);
        let scouts = registry("Scout", 1);
        let mut persister = ShutdownPersister::new();

        let report = persister.trigger(&store, [&campouts, &scouts]).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.saved, ["Scout"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "Campout");
        assert!(store.exists("Scout"));
    }
}
