//! Data model for the embedded object store.
//!
//! This crate defines what the runtime stores, independent of how it is
//! persisted:
//! - [`value`] holds field values, including placeholders and live links
//! - [`entity`] holds entity instances and the shared handle type
//! - [`schema`] holds entity type descriptors and relation declarations
//! - [`naming`] holds the inflection rules used to infer related types
//!
//! Entities have no surrogate identifier. Two entities are equal when all of
//! their fields are equal, and relations are matched the same way.
pub mod entity;
pub mod error;
pub mod naming;
pub mod schema;
pub mod value;

pub use entity::{Entity, EntityHandle};
pub use error::SchemaError;
pub use schema::{BelongsTo, EntityType, HasMany};
pub use value::{Link, Value};
