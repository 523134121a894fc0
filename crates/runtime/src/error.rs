//! Unified error type surfaced by the engine API.
//!
//! Wraps schema and snapshot store failures so callers can bubble them up
//! with consistent context. Conditions that are local to one type (a
//! permanently pending load, an unresolved belongs-to) are recorded as
//! engine state instead of being raised.

use thiserror::Error;

use entity_core::SchemaError;

use crate::repository::RepositoryError;
use crate::scheduler::LoadState;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("entity type `{0}` is already registered")]
    AlreadyRegistered(String),

    #[error("entity type `{0}` is not registered")]
    UnknownType(String),

    #[error("entity type `{type_name}` has no field `{field}`")]
    UnknownField { type_name: String, field: String },

    #[error("entity type `{type_name}` has no relation `{relation}`")]
    UnknownRelation { type_name: String, relation: String },

    #[error("entity type `{type_name}` is not loaded ({state})")]
    NotLoaded { type_name: String, state: LoadState },

    #[error("expected a `{expected}` instance, found `{found}`")]
    TypeMismatch { expected: String, found: String },

    #[error("no matching `{0}` instance in registry")]
    NotFound(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
