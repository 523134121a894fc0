//! Schema loader for entity types declared in TOML.

use std::path::Path;

use anyhow::Context;
use entity_core::{BelongsTo, EntityType, HasMany};
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file};

/// Top-level layout of a schema file.
///
/// ```toml
/// [[types]]
/// name = "Campout"
/// fields = ["start_time", "end_time", "location"]
/// has_many = [{ name = "activitys" }]
///
/// [[types]]
/// name = "Activity"
/// fields = ["name"]
/// belongs_to = [{ field = "campout" }]
/// ```
#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    types: Vec<TypeSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeSpec {
    name: String,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    has_many: Vec<HasManySpec>,
    #[serde(default)]
    belongs_to: Vec<BelongsToSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HasManySpec {
    name: String,
    singular: Option<String>,
    related_type: Option<String>,
    foreign_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BelongsToSpec {
    field: String,
    related_type: Option<String>,
}

impl TypeSpec {
    fn into_entity_type(self) -> EntityType {
        let mut entity_type = EntityType::new(self.name).fields(self.fields);

        for spec in self.has_many {
            let mut relation = HasMany::new(spec.name);
            if let Some(singular) = spec.singular {
                relation = relation.singular(singular);
            }
            if let Some(related) = spec.related_type {
                relation = relation.related_type(related);
            }
            if let Some(key) = spec.foreign_key {
                relation = relation.foreign_key(key);
            }
            entity_type = entity_type.has_many(relation);
        }

        for spec in self.belongs_to {
            let mut relation = BelongsTo::new(spec.field);
            if let Some(related) = spec.related_type {
                relation = relation.related_type(related);
            }
            entity_type = entity_type.belongs_to(relation);
        }

        entity_type
    }
}

/// Loader for entity type declarations.
pub struct SchemaLoader;

impl SchemaLoader {
    /// Load and validate every type declared in a TOML schema file.
    pub fn load(path: &Path) -> LoadResult<Vec<EntityType>> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("Invalid schema in {}", path.display()))
    }

    /// Parse and validate schema text.
    pub fn parse(content: &str) -> LoadResult<Vec<EntityType>> {
        let file: SchemaFile = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse schema TOML: {}", e))?;

        let types: Vec<EntityType> = file
            .types
            .into_iter()
            .map(TypeSpec::into_entity_type)
            .collect();

        for entity_type in &types {
            entity_type.validate()?;
        }

        Ok(types)
    }
}
