//! Scoped store session that guarantees the shutdown save.

use std::ops::{Deref, DerefMut};

use runtime::{Engine, SaveReport};

/// Owns an engine for the lifetime of a host process.
///
/// The shutdown save runs exactly once: explicitly through
/// [`Session::close`], or from `Drop` on every other exit path (early
/// return, `?`, panic unwind). With `save_on_exit` off, neither path saves.
pub struct Session {
    engine: Engine,
    save_on_exit: bool,
}

impl Session {
    pub fn new(engine: Engine, save_on_exit: bool) -> Self {
        Self {
            engine,
            save_on_exit,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// End the session, saving every loaded type.
    ///
    /// Returns `None` if saving on exit is disabled or the save already ran.
    pub fn close(mut self) -> Option<SaveReport> {
        if !self.save_on_exit {
            tracing::info!("Session closed without saving");
            return None;
        }
        let report = self.engine.trigger_save();
        if let Some(report) = &report {
            log_report(report);
        }
        report
    }
}

impl Deref for Session {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.engine
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.save_on_exit {
            return;
        }
        if let Some(report) = self.engine.trigger_save() {
            log_report(&report);
        }
    }
}

fn log_report(report: &SaveReport) {
    for (type_name, error) in &report.failed {
        tracing::error!("Could not save {}: {}", type_name, error);
    }
    tracing::info!(
        "Session closed: {} type(s) saved, {} failed",
        report.saved.len(),
        report.failed.len()
    );
}

#[cfg(test)]
mod tests {
    use runtime::{EntityType, FileSnapshotStore, InMemorySnapshotStore, SnapshotStore, Value};
    use tempfile::TempDir;

    use super::*;

    fn scout() -> EntityType {
        EntityType::new("Scout").field("name")
    }

    fn engine() -> Engine {
        let mut engine = Engine::new(InMemorySnapshotStore::new());
        engine.register_type(scout()).unwrap();
        engine
    }

    fn file_engine(temp_dir: &TempDir) -> Engine {
        let mut engine = Engine::new(FileSnapshotStore::new(temp_dir.path()).unwrap());
        engine.register_type(scout()).unwrap();
        engine
    }

    #[test]
    fn test_close_saves_once() {
        let mut session = Session::new(engine(), true);
        session
            .create("Scout", [("name", Value::from("Ann"))])
            .unwrap();

        let report = session.close().unwrap();
        assert_eq!(report.saved, ["Scout"]);
    }

    #[test]
    fn test_drop_saves_on_early_exit() {
        fn run(session: &mut Session) -> Result<(), &'static str> {
            session.create("Scout", [("name", Value::from("Ann"))]).unwrap();
            Err("bail out")
        }

        let temp_dir = TempDir::new().unwrap();
        {
            let mut session = Session::new(file_engine(&temp_dir), true);
            assert!(run(&mut session).is_err());
        }

        let store = FileSnapshotStore::new(temp_dir.path()).unwrap();
        assert_eq!(store.load("Scout").unwrap().len(), 1);
    }

    #[test]
    fn test_save_after_close_is_noop() {
        let mut session = Session::new(engine(), true);
        assert!(session.trigger_save().is_some());
        assert!(session.has_persisted());
        assert!(session.close().is_none());
    }

    #[test]
    fn test_drop_respects_save_on_exit() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut session = Session::new(file_engine(&temp_dir), false);
            session.create("Scout", [("name", Value::from("Ann"))]).unwrap();
        }

        let store = FileSnapshotStore::new(temp_dir.path()).unwrap();
        assert!(!store.exists("Scout"));
    }

    #[test]
    fn test_close_respects_save_on_exit() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = Session::new(file_engine(&temp_dir), false);
        session.create("Scout", [("name", Value::from("Ann"))]).unwrap();

        assert!(session.close().is_none());

        let store = FileSnapshotStore::new(temp_dir.path()).unwrap();
        assert!(!store.exists("Scout"));
    }
}
