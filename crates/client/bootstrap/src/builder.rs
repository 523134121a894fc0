//! Builds a store session from configuration and entity type declarations.
use anyhow::{Context, Result};
use entity_content::{SchemaLoader, campout_catalog};
use entity_core::EntityType;
use runtime::{Engine, FileSnapshotStore};

use crate::config::StoreConfig;
use crate::session::Session;

/// Builder that opens the snapshot directory and registers every entity type.
pub struct EngineBuilder {
    config: StoreConfig,
    types: Option<Vec<EntityType>>,
}

impl EngineBuilder {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            types: None,
        }
    }

    /// Provide the entity types explicitly instead of reading them from the
    /// configured schema file or the built-in catalog.
    pub fn types(mut self, types: Vec<EntityType>) -> Self {
        self.types = Some(types);
        self
    }

    fn resolve_types(&self) -> Result<Vec<EntityType>> {
        if let Some(types) = &self.types {
            return Ok(types.clone());
        }
        match &self.config.schema_path {
            Some(path) => {
                tracing::info!("Loading schema from {}", path.display());
                SchemaLoader::load(path)
            }
            None => Ok(campout_catalog()),
        }
    }

    pub fn build(self) -> Result<Session> {
        let types = self.resolve_types()?;

        let store = FileSnapshotStore::new(&self.config.data_dir).with_context(|| {
            format!(
                "Failed to open snapshot directory {}",
                self.config.data_dir.display()
            )
        })?;
        tracing::info!("Snapshot directory: {}", self.config.data_dir.display());

        let mut engine = Engine::new(store);
        for entity_type in types {
            let name = entity_type.name().to_string();
            engine
                .register_type(entity_type)
                .with_context(|| format!("Failed to register entity type {}", name))?;
        }

        for pending in engine.pending_loads() {
            let waiting: Vec<&str> = pending.waiting_on.iter().map(String::as_str).collect();
            tracing::warn!(
                "{} never loaded: waiting on {}",
                pending.type_name,
                waiting.join(", ")
            );
        }
        for (type_name, reason) in engine.failed_loads() {
            tracing::warn!("{} failed to load: {}", type_name, reason);
        }

        Ok(Session::new(engine, self.config.save_on_exit))
    }
}
