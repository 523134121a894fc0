//! Save/load round trips through the shutdown save.

use entity_content::{activity, campout, campout_catalog};
use runtime::{Engine, EntityType, FileSnapshotStore, SnapshotStore, Value};
use tempfile::TempDir;

fn register_all(engine: &mut Engine, types: Vec<EntityType>) {
    for entity_type in types {
        engine.register_type(entity_type).unwrap();
    }
}

#[test]
fn test_round_trip_through_shutdown_save() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut engine = Engine::new(FileSnapshotStore::new(temp_dir.path()).unwrap());
        register_all(&mut engine, campout_catalog());

        let lake = engine
            .create(
                "Campout",
                [
                    ("location", Value::from("Lake")),
                    ("start_time", Value::from("2026-06-01")),
                ],
            )
            .unwrap();
        let ann = engine
            .create("Scout", [("name", Value::from("Ann")), ("rank", Value::from("Star"))])
            .unwrap();
        engine
            .create(
                "Activity",
                [("name", Value::from("hike")), ("campout", Value::link(&lake))],
            )
            .unwrap();
        engine
            .create(
                "CampoutScout",
                [("scout", Value::link(&ann)), ("campout", Value::link(&lake))],
            )
            .unwrap();

        let report = engine.trigger_save().unwrap();
        assert!(report.is_complete());
        assert_eq!(report.saved.len(), 4);
    }

    let mut engine = Engine::new(FileSnapshotStore::new(temp_dir.path()).unwrap());
    register_all(&mut engine, campout_catalog());

    assert!(engine.pending_loads().is_empty());
    let lake = engine
        .find_first("Campout", &[("location", Value::from("Lake"))])
        .unwrap()
        .unwrap();
    assert_eq!(lake.borrow().get("end_time"), Some(&Value::Null));

    let activities = engine.has_many(&lake, "activitys").unwrap();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].borrow().get("name"), Some(&Value::from("hike")));

    let signups = engine.has_many(&lake, "campout_scouts").unwrap();
    assert_eq!(signups.len(), 1);
    let scout = engine.belongs_to(&signups[0], "scout").unwrap().unwrap();
    assert_eq!(scout.borrow().get("rank"), Some(&Value::from("Star")));
}

#[test]
fn test_empty_registries_round_trip() {
    let temp_dir = TempDir::new().unwrap();

    let mut engine = Engine::new(FileSnapshotStore::new(temp_dir.path()).unwrap());
    register_all(&mut engine, vec![campout(), activity()]);
    engine.trigger_save().unwrap();

    let store = FileSnapshotStore::new(temp_dir.path()).unwrap();
    assert!(store.exists("Campout"));
    assert!(store.load("Campout").unwrap().is_empty());

    let mut reloaded = Engine::new(store);
    register_all(&mut reloaded, vec![activity(), campout()]);
    assert_eq!(reloaded.count("Campout").unwrap(), 0);
    assert_eq!(reloaded.count("Activity").unwrap(), 0);
}

#[test]
fn test_deleting_one_of_two_equal_instances() {
    let temp_dir = TempDir::new().unwrap();
    let mut engine = Engine::new(FileSnapshotStore::new(temp_dir.path()).unwrap());
    register_all(&mut engine, vec![campout()]);

    let first = engine.create("Campout", [("location", Value::from("Lake"))]).unwrap();
    let second = engine.create("Campout", [("location", Value::from("Lake"))]).unwrap();
    engine.create("Campout", [("location", Value::from("Ridge"))]).unwrap();

    let removed = engine.delete(&second).unwrap();

    assert_eq!(engine.count("Campout").unwrap(), 2);
    assert!(std::rc::Rc::ptr_eq(&removed, &first));
    let survivors = engine
        .where_eq("Campout", &[("location", Value::from("Lake"))])
        .unwrap();
    assert_eq!(survivors.len(), 1);
    assert_eq!(*survivors[0].borrow(), *removed.borrow());
}
