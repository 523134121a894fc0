//! Shared bootstrap utilities for store front-ends.
//!
//! Provides configuration loading, engine assembly, and the session guard
//! that guarantees the shutdown save, so the CLI or any other host can reuse
//! them.
pub mod builder;
pub mod config;
pub mod session;

pub use builder::EngineBuilder;
pub use config::StoreConfig;
pub use session::Session;
