//! Errors raised while declaring entity types.

use thiserror::Error;

/// Errors surfaced when an entity type descriptor is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("entity type name must not be empty")]
    EmptyTypeName,

    #[error("entity type name `{0}` must start with an uppercase ASCII letter")]
    InvalidTypeName(String),

    #[error("entity type `{type_name}` declares an empty field name")]
    EmptyFieldName { type_name: String },

    #[error("entity type `{type_name}` declares reserved field name `{field}`")]
    ReservedFieldName { type_name: String, field: String },

    #[error("entity type `{type_name}` declares field `{field}` more than once")]
    DuplicateField { type_name: String, field: String },

    #[error("entity type `{type_name}` declares relation `{relation}` more than once")]
    DuplicateRelation { type_name: String, relation: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
