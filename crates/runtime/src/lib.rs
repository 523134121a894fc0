//! Embedded object store runtime.
//!
//! Entity types are held entirely in memory, loaded from and saved to one
//! snapshot per type, with declared relations resolved after load. Consumers
//! create an [`Engine`] over a [`SnapshotStore`], register their types, and
//! call [`Engine::trigger_save`] once before the process goes away.
//!
//! Modules are organized by responsibility:
//! - [`repository`] reads, writes and scans per-type snapshots
//! - [`registry`] holds the live instances of one type
//! - [`scheduler`] decides when a type's snapshot can be loaded
//! - [`binder`] resolves belongs-to placeholders into live links
//! - [`persister`] performs the one-shot shutdown save
//! - [`engine`] ties them together behind one context object
pub mod binder;
pub mod engine;
pub mod error;
pub mod persister;
pub mod registry;
pub mod repository;
pub mod scheduler;

pub use binder::{BindReport, PendingRelation, RelationBinder, bind_belongs_to};
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use persister::{SaveReport, ShutdownPersister};
pub use registry::Registry;
pub use repository::{
    FileSnapshotStore, InMemorySnapshotStore, Record, RepositoryError, SnapshotStore, StoredValue,
};
pub use scheduler::{LoadScheduler, LoadState, PendingLoad};

pub use entity_core::{BelongsTo, Entity, EntityHandle, EntityType, HasMany, Link, Value};
