//! The engine context: registries, load scheduling, relation binding and the
//! shutdown save, owned by one object instead of process-wide state.
//!
//! # Registration
//!
//! [`Engine::register_type`] is the only way a type becomes known. It
//! creates the type's (empty) registry, queues its belongs-to bindings, and
//! then either loads its snapshot, defers it until the types the snapshot
//! references are loaded, or marks it loaded straight away when there is no
//! snapshot. Every load releases deferred types that were waiting on it and
//! fires relation bindings whose two sides are now loaded; this repeats on a
//! worklist until nothing else becomes ready.
//!
//! The engine is single-threaded. Callers that share it across threads must
//! wrap the whole engine in one lock.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

use entity_core::{EntityHandle, EntityType, Value};
use tracing::{debug, info, warn};

use crate::binder::{BindReport, PendingRelation, RelationBinder, bind_belongs_to};
use crate::error::{EngineError, Result};
use crate::persister::{SaveReport, ShutdownPersister};
use crate::registry::Registry;
use crate::repository::{Record, RepositoryError, SnapshotStore};
use crate::scheduler::{Admission, LoadScheduler, LoadState, PendingLoad};

pub struct Engine {
    store: Box<dyn SnapshotStore>,
    types: BTreeMap<String, Rc<EntityType>>,
    registries: HashMap<String, Registry>,
    scheduler: LoadScheduler,
    binder: RelationBinder,
    persister: ShutdownPersister,
}

impl Engine {
    pub fn new(store: impl SnapshotStore + 'static) -> Self {
        Self::from_boxed(Box::new(store))
    }

    pub fn from_boxed(store: Box<dyn SnapshotStore>) -> Self {
        Self {
            store,
            types: BTreeMap::new(),
            registries: HashMap::new(),
            scheduler: LoadScheduler::new(),
            binder: RelationBinder::new(),
            persister: ShutdownPersister::new(),
        }
    }

    pub fn store(&self) -> &dyn SnapshotStore {
        self.store.as_ref()
    }

    // ------------------------------------------------------------------
    // Registration and loading
    // ------------------------------------------------------------------

    /// Register a new entity type and return its load state afterwards.
    ///
    /// Snapshot problems are local to the type: they leave it `Pending` or
    /// `Failed` and never fail the call.
    pub fn register_type(&mut self, entity_type: EntityType) -> Result<LoadState> {
        entity_type.validate()?;
        let name = entity_type.name().to_string();
        if self.types.contains_key(&name) {
            return Err(EngineError::AlreadyRegistered(name));
        }

        let entity_type = Rc::new(entity_type);
        self.types.insert(name.clone(), entity_type.clone());
        self.registries
            .insert(name.clone(), Registry::new(entity_type.clone()));

        for relation in entity_type.has_many_relations() {
            debug!(
                "{} has many {} ({}.{})",
                name,
                relation.name(),
                relation.resolved_related_type(),
                relation.resolved_foreign_key(&name)
            );
        }
        for relation in entity_type.belongs_to_relations() {
            self.binder.declare(PendingRelation {
                owner_type: name.clone(),
                target_type: relation.resolved_related_type(),
                field: relation.field().to_string(),
            });
        }

        if !self.store.exists(&name) {
            info!("Type {} is available", name);
            self.scheduler.mark_loaded(&name);
            self.settle(name.clone());
        } else {
            match self.store.dependency_type_names(&name) {
                Err(e) if e.is_missing() => {
                    info!("Type {} is available", name);
                    self.scheduler.mark_loaded(&name);
                    self.settle(name.clone());
                }
                Err(e) => {
                    warn!("Cannot scan snapshot for {}: {}", name, e);
                    self.scheduler.mark_failed(&name, e.to_string());
                }
                Ok(dependencies) => match self.scheduler.admit(&name, dependencies) {
                    Admission::Ready => {
                        if self.load_now(&name) {
                            self.settle(name.clone());
                        }
                    }
                    Admission::Deferred(waiting_on) => {
                        let names: Vec<&str> = waiting_on.iter().map(String::as_str).collect();
                        info!("Deferring {} until {} is loaded", name, names.join(", "));
                    }
                },
            }
        }

        self.load_state(&name)
            .cloned()
            .ok_or(EngineError::UnknownType(name))
    }

    /// Materialize a type's snapshot into its registry and record the
    /// outcome. Returns true if the type is now loaded.
    fn load_now(&mut self, type_name: &str) -> bool {
        match self.read_snapshot(type_name) {
            Ok(records) => {
                info!("Loading {} ({} records)", type_name, records.len());
                if let Some(registry) = self.registries.get_mut(type_name) {
                    registry.install(records.into_iter().map(Record::into_entity).collect());
                }
                self.scheduler.mark_loaded(type_name);
                true
            }
            Err(e) => {
                warn!("Failed to load {}: {}", type_name, e);
                self.scheduler.mark_failed(type_name, e.to_string());
                false
            }
        }
    }

    fn read_snapshot(&self, type_name: &str) -> std::result::Result<Vec<Record>, RepositoryError> {
        match self.store.load(type_name) {
            Err(e) if e.is_missing() => Ok(Vec::new()),
            other => other,
        }
    }

    /// Propagate a newly loaded type until no more work becomes ready.
    ///
    /// Each type enters the worklist at most once (on its transition to
    /// `Loaded`), so this terminates after at most one pass per type.
    fn settle(&mut self, loaded: String) {
        let mut worklist = VecDeque::from([loaded]);

        while let Some(type_name) = worklist.pop_front() {
            self.fire_ready_relations();

            for released in self.scheduler.release(&type_name) {
                info!("Now loading {}", released);
                if self.load_now(&released) {
                    worklist.push_back(released);
                }
            }
        }
    }

    fn fire_ready_relations(&mut self) {
        let scheduler = &self.scheduler;
        let ready = self.binder.take_ready(|name| scheduler.is_loaded(name));

        for relation in ready {
            self.bind(&relation);
        }
    }

    fn bind(&self, relation: &PendingRelation) -> BindReport {
        match (
            self.registries.get(&relation.owner_type),
            self.registries.get(&relation.target_type),
        ) {
            (Some(owners), Some(targets)) => bind_belongs_to(owners, targets, &relation.field),
            _ => BindReport::default(),
        }
    }

    /// Run the belongs-to binding for one relation again.
    ///
    /// Already linked fields are left alone, so this only picks up
    /// placeholders that can now be matched.
    pub fn rebind(&self, owner_type: &str, field: &str) -> Result<BindReport> {
        let owner = self.entity_type(owner_type)?;
        let relation = owner
            .find_belongs_to(field)
            .ok_or_else(|| EngineError::UnknownRelation {
                type_name: owner_type.to_string(),
                relation: field.to_string(),
            })?;

        Ok(self.bind(&PendingRelation {
            owner_type: owner_type.to_string(),
            target_type: relation.resolved_related_type(),
            field: field.to_string(),
        }))
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn entity_type(&self, type_name: &str) -> Result<&EntityType> {
        self.types
            .get(type_name)
            .map(Rc::as_ref)
            .ok_or_else(|| EngineError::UnknownType(type_name.to_string()))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn load_state(&self, type_name: &str) -> Option<&LoadState> {
        self.scheduler.state(type_name)
    }

    pub fn is_loaded(&self, type_name: &str) -> bool {
        self.scheduler.is_loaded(type_name)
    }

    /// Loaded types, in load order.
    pub fn loaded_types(&self) -> &[String] {
        self.scheduler.loaded()
    }

    /// Types whose snapshot is waiting on types that are not loaded.
    pub fn pending_loads(&self) -> Vec<PendingLoad> {
        self.scheduler.pending()
    }

    /// Types whose snapshot could not be read, with the reason.
    pub fn failed_loads(&self) -> Vec<(String, String)> {
        self.scheduler.failed()
    }

    /// Belongs-to bindings still waiting for one of their types.
    pub fn pending_relations(&self) -> &[PendingRelation] {
        self.binder.pending()
    }

    // ------------------------------------------------------------------
    // Registry access
    // ------------------------------------------------------------------

    pub fn registry(&self, type_name: &str) -> Result<&Registry> {
        self.registries
            .get(type_name)
            .ok_or_else(|| EngineError::UnknownType(type_name.to_string()))
    }

    /// Mutable registry access; only loaded types can be mutated, so a
    /// later snapshot load can never overwrite runtime changes.
    pub fn registry_mut(&mut self, type_name: &str) -> Result<&mut Registry> {
        match self.scheduler.state(type_name) {
            Some(LoadState::Loaded) => {}
            Some(state) => {
                return Err(EngineError::NotLoaded {
                    type_name: type_name.to_string(),
                    state: state.clone(),
                });
            }
            None => return Err(EngineError::UnknownType(type_name.to_string())),
        }
        self.registries
            .get_mut(type_name)
            .ok_or_else(|| EngineError::UnknownType(type_name.to_string()))
    }

    pub fn create<I, K>(&mut self, type_name: &str, fields: I) -> Result<EntityHandle>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.registry_mut(type_name)?.create(fields)
    }

    pub fn all(&self, type_name: &str) -> Result<Vec<EntityHandle>> {
        Ok(self.registry(type_name)?.all().to_vec())
    }

    pub fn count(&self, type_name: &str) -> Result<usize> {
        Ok(self.registry(type_name)?.count())
    }

    pub fn where_eq(&self, type_name: &str, predicate: &[(&str, Value)]) -> Result<Vec<EntityHandle>> {
        Ok(self.registry(type_name)?.where_eq(predicate))
    }

    pub fn find_first(
        &self,
        type_name: &str,
        predicate: &[(&str, Value)],
    ) -> Result<Option<EntityHandle>> {
        Ok(self.registry(type_name)?.find_first(predicate))
    }

    pub fn update<I, K>(&mut self, handle: &EntityHandle, fields: I) -> Result<EntityHandle>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let type_name = handle.borrow().type_name().to_string();
        self.registry_mut(&type_name)?.update(handle, fields)
    }

    pub fn delete(&mut self, handle: &EntityHandle) -> Result<EntityHandle> {
        let type_name = handle.borrow().type_name().to_string();
        self.registry_mut(&type_name)?.delete(handle)
    }

    /// Remove exactly `handle` from its registry, even when structurally
    /// equal instances exist.
    pub fn remove_handle(&mut self, handle: &EntityHandle) -> Result<EntityHandle> {
        let type_name = handle.borrow().type_name().to_string();
        self.registry_mut(&type_name)?.remove_handle(handle)
    }

    // ------------------------------------------------------------------
    // Relations
    // ------------------------------------------------------------------

    /// Evaluate a has-many relation: every instance of the related type whose
    /// foreign key equals `owner`. Empty while the related type is unknown.
    pub fn has_many(&self, owner: &EntityHandle, relation: &str) -> Result<Vec<EntityHandle>> {
        let owner_type = owner.borrow().type_name().to_string();
        let schema = self.entity_type(&owner_type)?;
        let relation = schema
            .find_has_many(relation)
            .ok_or_else(|| EngineError::UnknownRelation {
                type_name: owner_type.clone(),
                relation: relation.to_string(),
            })?;

        let related = relation.resolved_related_type();
        let foreign_key = relation.resolved_foreign_key(&owner_type);

        match self.registries.get(&related) {
            Some(registry) => Ok(registry.where_eq(&[(foreign_key.as_str(), Value::link(owner))])),
            None => Ok(Vec::new()),
        }
    }

    /// The live target of a belongs-to field, or `None` while the field is
    /// empty or still holds an unresolved placeholder.
    pub fn belongs_to(&self, owner: &EntityHandle, field: &str) -> Result<Option<EntityHandle>> {
        let entity = owner.borrow();
        let schema = self.entity_type(entity.type_name())?;
        if schema.find_belongs_to(field).is_none() {
            return Err(EngineError::UnknownRelation {
                type_name: entity.type_name().to_string(),
                relation: field.to_string(),
            });
        }

        Ok(entity.get(field).and_then(Value::as_link_target))
    }

    // ------------------------------------------------------------------
    // Shutdown
    // ------------------------------------------------------------------

    /// Save every loaded type's registry. Only the first call writes
    /// anything; later calls return `None`.
    ///
    /// Pending and failed types are never saved, so their snapshots on disk
    /// are left as they were.
    pub fn trigger_save(&mut self) -> Option<SaveReport> {
        let registries = self
            .scheduler
            .loaded()
            .iter()
            .filter_map(|name| self.registries.get(name));
        self.persister.trigger(self.store.as_ref(), registries)
    }

    pub fn has_persisted(&self) -> bool {
        self.persister.has_persisted()
    }
}
