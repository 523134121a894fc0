//! Load scheduling across registration orders.

use std::collections::BTreeMap;

use entity_content::{activity, campout, campout_catalog, campout_scout, scout};
use runtime::{Engine, Entity, EntityType, InMemorySnapshotStore, LoadState, Record, Value};

fn campout_record(location: &str) -> Entity {
    Entity::new("Campout")
        .with_field("location", location)
        .with_field("start_time", Value::Null)
        .with_field("end_time", Value::Null)
}

fn scout_record(name: &str) -> Entity {
    Entity::new("Scout")
        .with_field("name", name)
        .with_field("rank", Value::Null)
}

/// Snapshots for the whole catalog, referencing each other.
fn seeded_store() -> InMemorySnapshotStore {
    let lake = campout_record("Lake");
    let ridge = campout_record("Ridge");
    let ann = scout_record("Ann");

    let activities = [
        Entity::new("Activity")
            .with_field("name", "hike")
            .with_field("campout", lake.clone()),
        Entity::new("Activity")
            .with_field("name", "canoe")
            .with_field("campout", lake.clone()),
        Entity::new("Activity")
            .with_field("name", "climb")
            .with_field("campout", ridge.clone()),
    ];
    let signups = [Entity::new("CampoutScout")
        .with_field("scout", ann.clone())
        .with_field("campout", ridge.clone())];

    let records = |entities: &[Entity]| entities.iter().map(Record::from_entity).collect::<Vec<_>>();

    InMemorySnapshotStore::new()
        .with_snapshot("Campout", &records(&[lake, ridge]))
        .unwrap()
        .with_snapshot("Scout", &records(&[ann]))
        .unwrap()
        .with_snapshot("Activity", &records(&activities))
        .unwrap()
        .with_snapshot("CampoutScout", &records(&signups))
        .unwrap()
}

fn permutations(items: Vec<EntityType>) -> Vec<Vec<EntityType>> {
    if items.len() <= 1 {
        return vec![items];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.clone();
        let head = rest.remove(i);
        for mut tail in permutations(rest) {
            tail.insert(0, head.clone());
            out.push(tail);
        }
    }
    out
}

/// Type name → rendered instances, for comparing final engine contents.
fn contents(engine: &Engine) -> BTreeMap<String, Vec<String>> {
    engine
        .type_names()
        .map(|name| {
            let rendered = engine
                .all(name)
                .unwrap()
                .iter()
                .map(|h| h.borrow().to_string())
                .collect();
            (name.to_string(), rendered)
        })
        .collect()
}

#[test]
fn test_every_registration_order_reaches_same_fixed_point() {
    let mut baseline = None;

    for order in permutations(campout_catalog()) {
        let names: Vec<String> = order.iter().map(|t| t.name().to_string()).collect();
        let mut engine = Engine::new(seeded_store());
        for entity_type in order {
            engine.register_type(entity_type).unwrap();
        }

        let mut loaded = engine.loaded_types().to_vec();
        loaded.sort();
        assert_eq!(
            loaded,
            ["Activity", "Campout", "CampoutScout", "Scout"],
            "order {:?}",
            names
        );
        assert!(engine.pending_loads().is_empty(), "order {:?}", names);
        assert!(engine.pending_relations().is_empty(), "order {:?}", names);

        // Every activity and sign-up is linked to a live campout.
        for handle in engine.all("Activity").unwrap() {
            assert!(engine.belongs_to(&handle, "campout").unwrap().is_some());
        }
        for handle in engine.all("CampoutScout").unwrap() {
            assert!(engine.belongs_to(&handle, "scout").unwrap().is_some());
            assert!(engine.belongs_to(&handle, "campout").unwrap().is_some());
        }

        let snapshot = contents(&engine);
        match &baseline {
            None => baseline = Some(snapshot),
            Some(expected) => assert_eq!(&snapshot, expected, "order {:?}", names),
        }
    }
}

#[test]
fn test_deferred_load_cascades() {
    let mut engine = Engine::new(seeded_store());

    let state = engine.register_type(campout_scout()).unwrap();
    assert_eq!(
        state,
        LoadState::Pending {
            waiting_on: ["Campout", "Scout"].iter().map(|s| s.to_string()).collect()
        }
    );

    engine.register_type(scout()).unwrap();
    assert!(matches!(
        engine.load_state("CampoutScout"),
        Some(LoadState::Pending { waiting_on }) if waiting_on.len() == 1
    ));

    engine.register_type(activity()).unwrap();
    assert_eq!(engine.pending_loads().len(), 2);

    engine.register_type(campout()).unwrap();
    assert!(engine.pending_loads().is_empty());
    assert_eq!(
        engine.loaded_types(),
        ["Scout", "Campout", "CampoutScout", "Activity"]
    );
    assert_eq!(engine.count("Activity").unwrap(), 3);
    assert_eq!(engine.count("CampoutScout").unwrap(), 1);
}

#[test]
fn test_dependency_never_registered_stays_pending() {
    let mut engine = Engine::new(seeded_store());

    engine.register_type(activity()).unwrap();
    engine.register_type(scout()).unwrap();

    let pending = engine.pending_loads();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].type_name, "Activity");
    assert!(pending[0].waiting_on.contains("Campout"));
    assert_eq!(engine.count("Activity").unwrap(), 0);
    assert!(!engine.is_loaded("Activity"));

    // The rest of the engine keeps working.
    assert_eq!(engine.count("Scout").unwrap(), 1);
    assert_eq!(
        engine.pending_relations()[0].owner_type,
        "Activity",
        "belongs-to stays queued while its owner is pending"
    );
}

#[test]
fn test_pending_types_are_not_saved() {
    let mut engine = Engine::new(seeded_store());

    engine.register_type(activity()).unwrap();
    engine.register_type(scout()).unwrap();

    let report = engine.trigger_save().unwrap();
    assert_eq!(report.saved, ["Scout"]);
    assert_eq!(engine.store().load("Activity").unwrap().len(), 3);
}

#[test]
fn test_snapshot_without_dependencies_loads_immediately() {
    let mut engine = Engine::new(seeded_store());

    assert_eq!(engine.register_type(scout()).unwrap(), LoadState::Loaded);
    let ann = engine
        .find_first("Scout", &[("name", Value::from("Ann"))])
        .unwrap()
        .unwrap();
    assert_eq!(ann.borrow().get("rank"), Some(&Value::Null));
}
