//! Store configuration structures and loaders.
use std::env;
use std::path::PathBuf;

/// Configuration required to open a store session.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Directory holding one snapshot file per entity type.
    pub data_dir: PathBuf,
    /// Optional TOML schema; the built-in campout catalog is used otherwise.
    pub schema_path: Option<PathBuf>,
    /// Save every loaded type when the session ends.
    pub save_on_exit: bool,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            schema_path: None,
            save_on_exit: true,
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SNAPSTORE_DATA_DIR` - Snapshot directory (default: platform data dir)
    /// - `SNAPSTORE_SCHEMA` - TOML schema file (default: built-in catalog)
    /// - `SNAPSTORE_SAVE_ON_EXIT` - Save on session end (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`StoreConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("SNAPSTORE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let mut config = Self::new(data_dir);

        config.schema_path = lookup("SNAPSTORE_SCHEMA").map(PathBuf::from);

        if let Some(save) = lookup("SNAPSTORE_SAVE_ON_EXIT").and_then(|v| v.parse::<bool>().ok()) {
            config.save_on_exit = save;
        }

        config
    }

    pub fn with_schema(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    pub fn with_save_on_exit(mut self, save: bool) -> Self {
        self.save_on_exit = save;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(default_data_dir())
    }
}

/// Platform data directory for the store, falling back to `./data`.
fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "snapstore")
        .map(|dirs| dirs.data_dir().join("snapshots"))
        .unwrap_or_else(|| PathBuf::from("data"))
}
