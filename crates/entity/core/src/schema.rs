//! Entity type descriptors and relation declarations.
//!
//! A descriptor is plain data: the runtime consumes it once, at registration
//! time, to create the type's registry and queue its relation bindings.
//!
//! ```ignore
//! let activity = EntityType::new("Activity")
//!     .field("name")
//!     .belongs_to(BelongsTo::new("campout"));
//!
//! let campout = EntityType::new("Campout")
//!     .fields(["start_time", "end_time", "location"])
//!     .has_many(HasMany::new("activitys"));
//! ```

use std::collections::BTreeSet;

use crate::error::{Result, SchemaError};
use crate::naming::{camel_case, resource_name, singularize, snake_case};

/// Schema of one kind of record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityType {
    name: String,
    fields: Vec<String>,
    has_many: Vec<HasMany>,
    belongs_to: Vec<BelongsTo>,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            has_many: Vec::new(),
            belongs_to: Vec::new(),
        }
    }

    /// Declares a stored field.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares a computed one-to-many relation.
    pub fn has_many(mut self, relation: HasMany) -> Self {
        self.has_many.push(relation);
        self
    }

    /// Declares a stored reference. The relation's field becomes a declared
    /// field of this type.
    pub fn belongs_to(mut self, relation: BelongsTo) -> Self {
        self.fields.push(relation.field.clone());
        self.belongs_to.push(relation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the snapshot resource for this type.
    pub fn resource_name(&self) -> String {
        resource_name(&self.name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn declares_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn has_many_relations(&self) -> &[HasMany] {
        &self.has_many
    }

    pub fn belongs_to_relations(&self) -> &[BelongsTo] {
        &self.belongs_to
    }

    /// Looks up a has-many relation by its name.
    pub fn find_has_many(&self, name: &str) -> Option<&HasMany> {
        self.has_many.iter().find(|r| r.name == name)
    }

    /// Looks up a belongs-to relation by its field.
    pub fn find_belongs_to(&self, field: &str) -> Option<&BelongsTo> {
        self.belongs_to.iter().find(|r| r.field == field)
    }

    /// Checks names, duplicate fields and duplicate relation names. Field
    /// names starting with `@` are reserved for snapshot tags.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.name.chars().next() else {
            return Err(SchemaError::EmptyTypeName);
        };
        if !first.is_ascii_uppercase() {
            return Err(SchemaError::InvalidTypeName(self.name.clone()));
        }

        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if field.is_empty() {
                return Err(SchemaError::EmptyFieldName {
                    type_name: self.name.clone(),
                });
            }
            if field.starts_with('@') {
                return Err(SchemaError::ReservedFieldName {
                    type_name: self.name.clone(),
                    field: field.clone(),
                });
            }
            if !seen.insert(field.as_str()) {
                return Err(SchemaError::DuplicateField {
                    type_name: self.name.clone(),
                    field: field.clone(),
                });
            }
        }

        let mut relations = BTreeSet::new();
        for relation in &self.has_many {
            if !relations.insert(relation.name.as_str()) || seen.contains(relation.name.as_str()) {
                return Err(SchemaError::DuplicateRelation {
                    type_name: self.name.clone(),
                    relation: relation.name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Computed one-to-many relation: every instance of the related type whose
/// foreign key field equals the querying instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HasMany {
    name: String,
    related_type: Option<String>,
    foreign_key: Option<String>,
}

impl HasMany {
    /// Declares a relation by its plural name. The related type is inferred
    /// by dropping a trailing `s` and camel-casing: `campout_scouts` relates
    /// to `CampoutScout`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            related_type: None,
            foreign_key: None,
        }
    }

    /// Overrides the singular form used to infer the related type.
    pub fn singular(mut self, singular: impl AsRef<str>) -> Self {
        self.related_type = Some(camel_case(singular.as_ref()));
        self
    }

    pub fn related_type(mut self, type_name: impl Into<String>) -> Self {
        self.related_type = Some(type_name.into());
        self
    }

    /// Overrides the foreign key field on the related type. Defaults to the
    /// owner type's snake_case name.
    pub fn foreign_key(mut self, field: impl Into<String>) -> Self {
        self.foreign_key = Some(field.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolved_related_type(&self) -> String {
        self.related_type
            .clone()
            .unwrap_or_else(|| camel_case(singularize(&self.name)))
    }

    pub fn resolved_foreign_key(&self, owner_type: &str) -> String {
        self.foreign_key
            .clone()
            .unwrap_or_else(|| snake_case(owner_type))
    }
}

/// Stored single-valued reference, resolved after both sides are loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BelongsTo {
    field: String,
    related_type: Option<String>,
}

impl BelongsTo {
    /// Declares the reference by its field name; the related type is the
    /// camel-cased field name unless overridden.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            related_type: None,
        }
    }

    pub fn related_type(mut self, type_name: impl Into<String>) -> Self {
        self.related_type = Some(type_name.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn resolved_related_type(&self) -> String {
        self.related_type
            .clone()
            .unwrap_or_else(|| camel_case(&self.field))
    }
}
