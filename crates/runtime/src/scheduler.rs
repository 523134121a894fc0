//! Dependency-ordered load planning.
//!
//! A type's snapshot may only be materialized once every type it references
//! is loaded. The scheduler tracks, per registered type:
//!
//! ```text
//! Unregistered ──register──► Pending { waiting_on } ──last dependency loaded──► Loaded
//!       │                                                                         ▲
//!       └────────────── no snapshot, or no unmet dependencies ────────────────────┘
//! ```
//!
//! A snapshot that cannot be scanned or parsed ends in `Failed` instead.
//! The scheduler performs no I/O; the engine asks it what to load next.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Load state of one registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Waiting for the listed types to load.
    Pending { waiting_on: BTreeSet<String> },
    /// Registry holds the full snapshot (or started empty).
    Loaded,
    /// Snapshot exists but could not be read; the registry stays empty.
    Failed { reason: String },
}

impl LoadState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { waiting_on } => {
                let names: Vec<&str> = waiting_on.iter().map(String::as_str).collect();
                write!(f, "pending on {}", names.join(", "))
            }
            Self::Loaded => write!(f, "loaded"),
            Self::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// A deferred load, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    pub type_name: String,
    pub waiting_on: BTreeSet<String>,
}

/// Outcome of admitting a newly registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Every dependency is loaded; the snapshot can be materialized now.
    Ready,
    /// Deferred until the listed types load.
    Deferred(BTreeSet<String>),
}

#[derive(Default)]
pub struct LoadScheduler {
    states: BTreeMap<String, LoadState>,
    /// Types in the order they reached `Loaded`.
    loaded: Vec<String>,
    /// Pending types in registration order.
    pending: Vec<String>,
}

impl LoadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a type with the given snapshot dependencies can load now.
    ///
    /// Already-loaded dependencies are discarded. A deferred type is recorded
    /// as pending; a ready type stays untracked until the caller reports the
    /// load result.
    pub fn admit(&mut self, type_name: &str, dependencies: BTreeSet<String>) -> Admission {
        let waiting_on: BTreeSet<String> = dependencies
            .into_iter()
            .filter(|dep| dep != type_name && !self.is_loaded(dep))
            .collect();

        if waiting_on.is_empty() {
            return Admission::Ready;
        }

        self.states.insert(
            type_name.to_string(),
            LoadState::Pending {
                waiting_on: waiting_on.clone(),
            },
        );
        self.pending.push(type_name.to_string());
        Admission::Deferred(waiting_on)
    }

    pub fn mark_loaded(&mut self, type_name: &str) {
        self.pending.retain(|name| name != type_name);
        self.states.insert(type_name.to_string(), LoadState::Loaded);
        self.loaded.push(type_name.to_string());
    }

    pub fn mark_failed(&mut self, type_name: &str, reason: impl Into<String>) {
        self.pending.retain(|name| name != type_name);
        self.states.insert(
            type_name.to_string(),
            LoadState::Failed {
                reason: reason.into(),
            },
        );
    }

    /// Record that `loaded` is now available and return every pending type
    /// whose dependency set became empty, in registration order.
    ///
    /// Released types are removed from the pending set; the caller must
    /// report each one back through `mark_loaded` or `mark_failed`.
    pub fn release(&mut self, loaded: &str) -> Vec<String> {
        let mut released = Vec::new();

        for name in &self.pending {
            if let Some(LoadState::Pending { waiting_on }) = self.states.get_mut(name) {
                waiting_on.remove(loaded);
                if waiting_on.is_empty() {
                    released.push(name.clone());
                }
            }
        }

        self.pending.retain(|name| !released.contains(name));
        for name in &released {
            self.states.remove(name);
        }

        released
    }

    pub fn state(&self, type_name: &str) -> Option<&LoadState> {
        self.states.get(type_name)
    }

    pub fn is_loaded(&self, type_name: &str) -> bool {
        self.states.get(type_name).is_some_and(LoadState::is_loaded)
    }

    /// Loaded types, in load order.
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    pub fn pending(&self) -> Vec<PendingLoad> {
        self.pending
            .iter()
            .filter_map(|name| match self.states.get(name) {
                Some(LoadState::Pending { waiting_on }) => Some(PendingLoad {
                    type_name: name.clone(),
                    waiting_on: waiting_on.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn failed(&self) -> Vec<(String, String)> {
        self.states
            .iter()
            .filter_map(|(name, state)| match state {
                LoadState::Failed { reason } => Some((name.clone(), reason.clone())),
                _ => None,
            })
            .collect()
    }
}
