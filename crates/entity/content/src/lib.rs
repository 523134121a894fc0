//! Entity type definitions and schema loaders.
//!
//! This crate houses the concrete entity types the store ships with and
//! provides a loader for declaring types in TOML:
//! - the campout catalog (scouts, campouts, activities and sign-ups)
//! - schema files describing fields and relations
//!
//! Types here only declare fields and relation intents; the runtime crate
//! does all loading, binding and saving.

pub mod catalog;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use catalog::{activity, campout, campout_catalog, campout_scout, scout};

#[cfg(feature = "loaders")]
pub use loaders::SchemaLoader;
