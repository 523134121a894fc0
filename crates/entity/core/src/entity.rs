//! Entity instances.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::value::{Value, VisitedPairs, Visiting};

/// Shared handle to a live instance. Registries own the strong references;
/// links between entities hold weak ones.
pub type EntityHandle = Rc<RefCell<Entity>>;

/// One record of an entity type: a type name plus named field values.
///
/// Equality is structural over fields only. A field missing on one side
/// compares equal to `Null` on the other.
#[derive(Clone, Debug, Default)]
pub struct Entity {
    type_name: String,
    fields: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Inserts `Null` for every listed field that is not already present.
    pub fn fill_missing<'a>(&mut self, fields: impl IntoIterator<Item = &'a str>) {
        for field in fields {
            self.fields.entry(field.to_string()).or_insert(Value::Null);
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Wraps the entity into a shared handle.
    pub fn into_handle(self) -> EntityHandle {
        Rc::new(RefCell::new(self))
    }
}

impl Entity {
    pub(crate) fn eq_in(&self, other: &Entity, seen: &mut VisitedPairs) -> bool {
        self.fields
            .iter()
            .all(|(name, value)| match other.fields.get(name) {
                Some(theirs) => value.eq_in(theirs, seen),
                None => value.is_null(),
            })
            && other
                .fields
                .iter()
                .filter(|(name, _)| !self.fields.contains_key(*name))
                .all(|(_, value)| value.is_null())
    }

    pub(crate) fn fmt_in(&self, f: &mut fmt::Formatter<'_>, visiting: &mut Visiting) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: ", name)?;
            value.fmt_in(f, visiting)?;
        }
        write!(f, " }}")
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.eq_in(other, &mut Vec::new())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_in(f, &mut Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_type_name() {
        let a = Entity::new("Parent").with_field("name", "A");
        let b = Entity::new("Other").with_field("name", "A");
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_field_equals_null() {
        let a = Entity::new("Scout").with_field("name", "Ann");
        let b = Entity::new("Scout")
            .with_field("name", "Ann")
            .with_field("rank", Value::Null);
        assert_eq!(a, b);
        assert_eq!(b, a);

        let c = b.clone().with_field("rank", "Eagle");
        assert_ne!(a, c);
        assert_ne!(c, a);
    }

    #[test]
    fn test_fill_missing_keeps_existing_values() {
        let mut entity = Entity::new("Campout").with_field("location", "Lake");
        entity.fill_missing(["location", "start_time"]);

        assert_eq!(entity.get("location"), Some(&Value::from("Lake")));
        assert_eq!(entity.get("start_time"), Some(&Value::Null));
        assert_eq!(entity.field_count(), 2);
    }

    #[test]
    fn test_display() {
        let entity = Entity::new("Activity").with_field("name", "hike");
        assert_eq!(entity.to_string(), r#"Activity { name: "hike" }"#);
    }

    #[test]
    fn test_mutual_links_compare_and_print() {
        let ann = Entity::new("Scout").with_field("name", "Ann").into_handle();
        let bo = Entity::new("Scout").with_field("name", "Bo").into_handle();
        ann.borrow_mut().set("mentor", Value::link(&bo));
        bo.borrow_mut().set("mentor", Value::link(&ann));

        assert_ne!(*ann.borrow(), *bo.borrow());
        assert_eq!(*ann.borrow(), *ann.borrow());

        let shown = ann.borrow().to_string();
        assert_eq!(
            shown,
            r#"Scout { mentor: &Scout { mentor: &Scout { mentor: &Scout, name: "Ann" }, name: "Bo" }, name: "Ann" }"#
        );
    }
}
