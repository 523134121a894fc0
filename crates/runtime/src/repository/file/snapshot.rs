//! Directory-backed SnapshotStore implementation.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use entity_core::naming::resource_name;

use crate::repository::{
    Record, RepositoryError, Result, SnapshotStore, decode_snapshot, encode_snapshot,
    scan_type_names,
};

/// File-based implementation of SnapshotStore.
///
/// # File Format
///
/// Each type is stored as `{resource}.json`, where the resource is the type
/// name lower-cased (`CampoutScout` → `campoutscout.json`). Saves write a
/// temporary file and rename it over the previous snapshot, so an
/// interrupted save never leaves a half-written snapshot behind.
pub struct FileSnapshotStore {
    base_dir: PathBuf,
}

impl FileSnapshotStore {
    /// Create a new file-based snapshot store rooted at `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to a type's snapshot file.
    pub fn snapshot_path(&self, type_name: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.json", resource_name(type_name)))
    }

    fn read(&self, type_name: &str) -> Result<String> {
        let path = self.snapshot_path(type_name);
        if !path.exists() {
            return Err(RepositoryError::MissingResource(type_name.to_string()));
        }
        fs::read_to_string(&path).map_err(RepositoryError::Io)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn exists(&self, type_name: &str) -> bool {
        self.snapshot_path(type_name).exists()
    }

    fn dependency_type_names(&self, type_name: &str) -> Result<BTreeSet<String>> {
        let text = self.read(type_name)?;
        scan_type_names(type_name, &text)
    }

    fn load(&self, type_name: &str) -> Result<Vec<Record>> {
        let text = self.read(type_name)?;
        let records = decode_snapshot(type_name, &text)?;

        tracing::debug!(
            "Loaded {} {} record(s) from {}",
            records.len(),
            type_name,
            self.snapshot_path(type_name).display()
        );

        Ok(records)
    }

    fn save(&self, type_name: &str, records: &[Record]) -> Result<()> {
        let path = self.snapshot_path(type_name);
        let temp_path = path.with_extension("json.tmp");

        let json = encode_snapshot(records)?;

        // Write to temp file
        fs::write(&temp_path, json).map_err(RepositoryError::Io)?;

        // Atomic rename
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!(
            "Saved {} {} record(s) to {}",
            records.len(),
            type_name,
            path.display()
        );

        Ok(())
    }

    fn delete(&self, type_name: &str) -> Result<()> {
        let path = self.snapshot_path(type_name);

        if path.exists() {
            fs::remove_file(&path).map_err(RepositoryError::Io)?;
            tracing::debug!("Deleted snapshot: {}", path.display());
        }

        Ok(())
    }

    fn list_resources(&self) -> Result<Vec<String>> {
        let mut resources = Vec::new();

        let entries = fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)?;

        for entry in entries {
            let entry = entry.map_err(RepositoryError::Io)?;
            let path = entry.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(resource) = filename.strip_suffix(".json")
            {
                resources.push(resource.to_string());
            }
        }

        resources.sort();
        Ok(resources)
    }
}
