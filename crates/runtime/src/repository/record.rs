//! Snapshot wire format.
//!
//! A snapshot is a JSON array of records:
//!
//! ```text
//! [
//!   {
//!     "@type": "Activity",
//!     "fields": {
//!       "name": { "text": "hike" },
//!       "campout": { "entity": { "@type": "Campout", "fields": { ... } } }
//!     }
//!   }
//! ]
//! ```
//!
//! Every record carries its type under [`TYPE_TAG`], including records nested
//! inside field values, so [`scan_type_names`] can discover the types a
//! snapshot depends on from the parsed JSON tree alone.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use entity_core::{Entity, Value};
use serde::{Deserialize, Serialize};

use super::{RepositoryError, Result};

/// Key under which each serialized record declares its entity type.
pub const TYPE_TAG: &str = "@type";

const FIELDS_KEY: &str = "fields";

/// Serialized form of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "@type")]
    pub type_name: String,

    #[serde(default)]
    pub fields: BTreeMap<String, StoredValue>,
}

/// Serialized form of a field value. Live links are written out as the
/// target's fields and come back as detached placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<StoredValue>),
    Entity(Record),
}

impl Record {
    /// Captures an entity's current field values.
    pub fn from_entity(entity: &Entity) -> Self {
        let mut visiting = Vec::new();
        Self::capture(entity, &mut visiting)
    }

    fn capture(entity: &Entity, visiting: &mut Vec<*const RefCell<Entity>>) -> Self {
        let fields = entity
            .fields()
            .map(|(name, value)| (name.to_string(), StoredValue::capture(value, visiting)))
            .collect();

        Self {
            type_name: entity.type_name().to_string(),
            fields,
        }
    }

    /// Rebuilds the entity; nested records become detached placeholders.
    pub fn into_entity(self) -> Entity {
        self.fields
            .into_iter()
            .fold(Entity::new(self.type_name), |entity, (name, value)| {
                entity.with_field(name, value.into_value())
            })
    }
}

impl StoredValue {
    fn capture(value: &Value, visiting: &mut Vec<*const RefCell<Entity>>) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(i) => Self::Int(*i),
            Value::Float(f) => Self::Float(*f),
            Value::Text(s) => Self::Text(s.clone()),
            Value::List(items) => {
                Self::List(items.iter().map(|v| Self::capture(v, visiting)).collect())
            }
            Value::Detached(entity) => Self::Entity(Record::capture(entity, visiting)),
            Value::Link(link) => {
                let Some(target) = link.target() else {
                    return Self::Null;
                };
                let ptr = std::rc::Rc::as_ptr(&target);
                // A reference cycle is cut at the first revisit.
                if visiting.contains(&ptr) {
                    return Self::Null;
                }
                let Ok(entity) = target.try_borrow() else {
                    return Self::Null;
                };
                visiting.push(ptr);
                let record = Record::capture(&entity, visiting);
                visiting.pop();
                Self::Entity(record)
            }
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(b),
            Self::Int(i) => Value::Int(i),
            Self::Float(f) => Value::Float(f),
            Self::Text(s) => Value::Text(s),
            Self::List(items) => Value::List(items.into_iter().map(Self::into_value).collect()),
            Self::Entity(record) => Value::Detached(Box::new(record.into_entity())),
        }
    }
}

/// Serialize a collection of records into snapshot text.
pub fn encode_snapshot(records: &[Record]) -> Result<String> {
    serde_json::to_string_pretty(records).map_err(|e| RepositoryError::Json(e.to_string()))
}

/// Parse snapshot text into records, checking that every top-level record
/// belongs to `type_name`.
pub fn decode_snapshot(type_name: &str, text: &str) -> Result<Vec<Record>> {
    let records: Vec<Record> =
        serde_json::from_str(text).map_err(|e| RepositoryError::Json(e.to_string()))?;

    if let Some(stray) = records.iter().find(|r| r.type_name != type_name) {
        return Err(RepositoryError::CorruptedData(format!(
            "snapshot for `{}` contains a `{}` record",
            type_name, stray.type_name
        )));
    }

    Ok(records)
}

/// Collect every type name tagged anywhere in snapshot text, excluding
/// `own_type`.
pub fn scan_type_names(own_type: &str, text: &str) -> Result<BTreeSet<String>> {
    let tree: serde_json::Value =
        serde_json::from_str(text).map_err(|e| RepositoryError::Json(e.to_string()))?;

    let mut names = BTreeSet::new();
    collect_type_tags(&tree, &mut names);
    names.remove(own_type);
    Ok(names)
}

fn collect_type_tags(node: &serde_json::Value, names: &mut BTreeSet<String>) {
    match node {
        serde_json::Value::Object(map) => {
            // Only record objects carry a tag; a field map may hold a
            // field that happens to be named like one.
            if map.contains_key(FIELDS_KEY)
                && let Some(serde_json::Value::String(tag)) = map.get(TYPE_TAG)
            {
                names.insert(tag.clone());
            }
            for child in map.values() {
                collect_type_tags(child, names);
            }
        }
        serde_json::Value::Array(items) => {
            for child in items {
                collect_type_tags(child, names);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity() -> Entity {
        Entity::new("Activity").with_field("name", "hike").with_field(
            "campout",
            Entity::new("Campout")
                .with_field("location", "Lake")
                .with_field("start_time", Value::Null),
        )
    }

    #[test]
    fn test_wire_shape() {
        let record = Record::from_entity(&Entity::new("Scout").with_field("name", "Ann"));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"@type": "Scout", "fields": {"name": {"text": "Ann"}}})
        );
    }

    #[test]
    fn test_snapshot_round_trip_keeps_structure() {
        let text = encode_snapshot(&[Record::from_entity(&activity())]).unwrap();
        let records = decode_snapshot("Activity", &text).unwrap();

        assert_eq!(records.len(), 1);
        let restored = records.into_iter().next().unwrap().into_entity();
        assert_eq!(restored, activity());
        assert!(matches!(restored.get("campout"), Some(Value::Detached(_))));
    }

    #[test]
    fn test_empty_snapshot_round_trip() {
        let text = encode_snapshot(&[]).unwrap();
        assert!(decode_snapshot("Scout", &text).unwrap().is_empty());
        assert!(scan_type_names("Scout", &text).unwrap().is_empty());
    }

    #[test]
    fn test_live_link_is_written_as_target_fields() {
        let campout = Entity::new("Campout").with_field("location", "Lake").into_handle();
        let activity = Entity::new("Activity").with_field("campout", Value::link(&campout));

        let record = Record::from_entity(&activity);
        let Some(StoredValue::Entity(nested)) = record.fields.get("campout") else {
            panic!("link should serialize as a nested record");
        };
        assert_eq!(nested.type_name, "Campout");
        assert_eq!(
            nested.fields.get("location"),
            Some(&StoredValue::Text("Lake".into()))
        );
    }

    #[test]
    fn test_self_link_cycle_is_cut() {
        let scout = Entity::new("Scout").with_field("name", "Ann").into_handle();
        let link = Value::link(&scout);
        scout.borrow_mut().set("mentor", link);

        let record = Record::from_entity(&scout.borrow());
        let Some(StoredValue::Entity(nested)) = record.fields.get("mentor") else {
            panic!("first level should be captured");
        };
        assert_eq!(nested.fields.get("mentor"), Some(&StoredValue::Null));
    }

    #[test]
    fn test_scan_finds_nested_tags() {
        let record = Record {
            type_name: "CampoutScout".into(),
            fields: BTreeMap::from([
                (
                    "scout".to_string(),
                    StoredValue::Entity(Record {
                        type_name: "Scout".into(),
                        fields: BTreeMap::new(),
                    }),
                ),
                (
                    "campout".to_string(),
                    StoredValue::List(vec![StoredValue::Entity(Record {
                        type_name: "Campout".into(),
                        fields: BTreeMap::from([(
                            "host".to_string(),
                            StoredValue::Entity(Record {
                                type_name: "Troop".into(),
                                fields: BTreeMap::new(),
                            }),
                        )]),
                    })]),
                ),
            ]),
        };
        let text = encode_snapshot(&[record]).unwrap();

        let names = scan_type_names("CampoutScout", &text).unwrap();
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            ["Campout", "Scout", "Troop"]
        );
    }

    #[test]
    fn test_field_named_like_tag_is_not_a_dependency() {
        let text = r#"[{"@type": "Odd", "fields": {"@type": {"text": "Ghost"}}}]"#;
        assert!(scan_type_names("Odd", text).unwrap().is_empty());
    }

    #[test]
    fn test_null_field_named_like_tag_is_not_a_dependency() {
        let record = Record {
            type_name: "Odd".into(),
            fields: BTreeMap::from([("@type".to_string(), StoredValue::Null)]),
        };
        let text = encode_snapshot(&[record]).unwrap();

        assert!(text.contains(r#""@type": "null""#));
        assert!(scan_type_names("Odd", &text).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_foreign_records() {
        let text = r#"[{"@type": "Campout", "fields": {}}]"#;
        assert!(matches!(
            decode_snapshot("Activity", text),
            Err(RepositoryError::CorruptedData(_))
        ));
        assert!(matches!(
            decode_snapshot("Activity", "not json"),
            Err(RepositoryError::Json(_))
        ));
    }
}
