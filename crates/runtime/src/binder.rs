//! Deferred belongs-to resolution.
//!
//! A belongs-to field deserializes as a detached placeholder carrying the
//! target's field values. Once both the owning type and the referenced type
//! are loaded, the binder swaps each placeholder for a link to the first
//! structurally equal live instance of the referenced type.
//!
//! Has-many needs no binding: it is a live query evaluated on every call
//! (see `Engine::has_many`).

use entity_core::{Link, Value};
use tracing::{debug, warn};

use crate::registry::Registry;

/// A belongs-to binding waiting for both of its types to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRelation {
    pub owner_type: String,
    pub target_type: String,
    pub field: String,
}

/// Counts from one binding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindReport {
    /// Placeholders replaced with a live link.
    pub resolved: usize,
    /// Placeholders with no structural match; left as they were.
    pub unresolved: usize,
    /// Fields already linked or empty; not touched.
    pub skipped: usize,
    /// Placeholders that matched more than one instance (first one won).
    pub duplicate_matches: usize,
}

/// Queue of belongs-to bindings not yet fired.
#[derive(Default)]
pub struct RelationBinder {
    pending: Vec<PendingRelation>,
}

impl RelationBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, relation: PendingRelation) {
        debug!(
            "{}s belong to {} via `{}`",
            relation.owner_type, relation.target_type, relation.field
        );
        self.pending.push(relation);
    }

    /// Remove and return every pending relation whose owning and referenced
    /// types are both loaded, in declaration order.
    pub fn take_ready(&mut self, is_loaded: impl Fn(&str) -> bool) -> Vec<PendingRelation> {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|r| is_loaded(&r.owner_type) && is_loaded(&r.target_type));
        self.pending = waiting;
        ready
    }

    pub fn pending(&self) -> &[PendingRelation] {
        &self.pending
    }
}

/// Resolve `field` on every instance of `owners` against `targets`.
///
/// Only detached placeholders are considered, so running this again over the
/// same registries changes nothing that was already linked. Owners and
/// targets may be the same registry.
pub fn bind_belongs_to(owners: &Registry, targets: &Registry, field: &str) -> BindReport {
    let mut report = BindReport::default();

    for owner in owners.all() {
        let placeholder = match owner.borrow().get(field) {
            Some(Value::Detached(placeholder)) => placeholder.clone(),
            _ => {
                report.skipped += 1;
                continue;
            }
        };

        let mut matches = targets
            .all()
            .iter()
            .filter(|target| target.try_borrow().is_ok_and(|live| *live == *placeholder));

        let Some(target) = matches.next().cloned() else {
            report.unresolved += 1;
            continue;
        };
        if matches.next().is_some() {
            report.duplicate_matches += 1;
            debug!(
                "{}.{} matched several {} instances; using the first",
                owners.type_name(),
                field,
                targets.type_name()
            );
        }

        owner
            .borrow_mut()
            .set(field, Value::Link(Link::to(&target)));
        report.resolved += 1;
    }

    if report.unresolved > 0 {
        warn!(
            "{} {}.{} reference(s) have no matching {}",
            report.unresolved,
            owners.type_name(),
            field,
            targets.type_name()
        );
    }
    debug!(
        "Bound {}.{} -> {}: {:?}",
        owners.type_name(),
        field,
        targets.type_name(),
        report
    );

    report
}
