//! Per-type live collections of entity instances.

use std::rc::Rc;

use entity_core::{Entity, EntityHandle, EntityType, Value};

use crate::error::{EngineError, Result};
use crate::repository::Record;

/// Ordered collection of live instances for one entity type.
///
/// The registry holds the only strong references to its instances; deleting
/// an instance here ends its lifetime once callers drop their handles.
pub struct Registry {
    entity_type: Rc<EntityType>,
    entries: Vec<EntityHandle>,
}

impl Registry {
    pub fn new(entity_type: Rc<EntityType>) -> Self {
        Self {
            entity_type,
            entries: Vec::new(),
        }
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn type_name(&self) -> &str {
        self.entity_type.name()
    }

    /// Append a new instance, seeded with `Null` for every declared field and
    /// then updated with `fields`.
    pub fn create<I, K>(&mut self, fields: I) -> Result<EntityHandle>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let fields: Vec<(String, Value)> = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.check_fields(fields.iter().map(|(k, _)| k.as_str()))?;

        let mut entity = Entity::new(self.type_name());
        entity.fill_missing(self.entity_type.field_names());
        for (field, value) in fields {
            entity.set(field, value);
        }

        let handle = entity.into_handle();
        self.entries.push(handle.clone());
        Ok(handle)
    }

    pub fn all(&self) -> &[EntityHandle] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every instance whose named fields all equal the given values. An empty
    /// predicate matches everything.
    pub fn where_eq(&self, predicate: &[(&str, Value)]) -> Vec<EntityHandle> {
        self.entries
            .iter()
            .filter(|handle| Self::matches(handle, predicate))
            .cloned()
            .collect()
    }

    /// First instance, in registry order, matching the predicate.
    pub fn find_first(&self, predicate: &[(&str, Value)]) -> Option<EntityHandle> {
        self.entries
            .iter()
            .find(|handle| Self::matches(handle, predicate))
            .cloned()
    }

    fn matches(handle: &EntityHandle, predicate: &[(&str, Value)]) -> bool {
        let Ok(entity) = handle.try_borrow() else {
            return false;
        };
        predicate.iter().all(|(field, expected)| match entity.get(field) {
            Some(actual) => actual == expected,
            None => expected.is_null(),
        })
    }

    /// Apply field assignments in place and return the instance.
    pub fn update<I, K>(&self, handle: &EntityHandle, fields: I) -> Result<EntityHandle>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let fields: Vec<(String, Value)> = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.check_instance(handle)?;
        self.check_fields(fields.iter().map(|(k, _)| k.as_str()))?;

        let mut entity = handle.borrow_mut();
        for (field, value) in fields {
            entity.set(field, value);
        }
        drop(entity);

        Ok(handle.clone())
    }

    /// Remove the first instance structurally equal to `handle`.
    ///
    /// With several equal instances present the first in registry order is
    /// removed, which need not be `handle` itself.
    pub fn delete(&mut self, handle: &EntityHandle) -> Result<EntityHandle> {
        self.check_instance(handle)?;

        let target = handle.borrow();
        let position = self
            .entries
            .iter()
            .position(|entry| Rc::ptr_eq(entry, handle) || entry.try_borrow().is_ok_and(|e| *e == *target));
        drop(target);

        match position {
            Some(index) => Ok(self.entries.remove(index)),
            None => Err(EngineError::NotFound(self.type_name().to_string())),
        }
    }

    /// Remove exactly this instance, matched by identity rather than by
    /// structure.
    pub fn remove_handle(&mut self, handle: &EntityHandle) -> Result<EntityHandle> {
        match self.entries.iter().position(|entry| Rc::ptr_eq(entry, handle)) {
            Some(index) => Ok(self.entries.remove(index)),
            None => Err(EngineError::NotFound(self.type_name().to_string())),
        }
    }

    /// Replace the whole collection with freshly loaded entities.
    pub(crate) fn install(&mut self, entities: Vec<Entity>) {
        self.entries = entities
            .into_iter()
            .map(|mut entity| {
                entity.fill_missing(self.entity_type.field_names());
                entity.into_handle()
            })
            .collect();
    }

    /// Serializable snapshot of every instance.
    pub fn records(&self) -> Vec<Record> {
        self.entries
            .iter()
            .map(|handle| Record::from_entity(&handle.borrow()))
            .collect()
    }

    fn check_instance(&self, handle: &EntityHandle) -> Result<()> {
        let entity = handle.borrow();
        if entity.type_name() != self.type_name() {
            return Err(EngineError::TypeMismatch {
                expected: self.type_name().to_string(),
                found: entity.type_name().to_string(),
            });
        }
        Ok(())
    }

    fn check_fields<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for field in fields {
            if !self.entity_type.declares_field(field) {
                return Err(EngineError::UnknownField {
                    type_name: self.type_name().to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}
