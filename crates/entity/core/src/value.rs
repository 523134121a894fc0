//! Field values stored on entities.
//!
//! Besides plain scalars, a value can refer to another entity in one of two
//! forms:
//! - [`Value::Detached`]: a copy of an entity's fields that is not a live
//!   instance. Snapshots deserialize nested entities into this form.
//! - [`Value::Link`]: a weak reference to a live, registry-owned instance.
//!
//! Both forms compare structurally, so a placeholder equals the live instance
//! it was serialized from.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::entity::{Entity, EntityHandle};

/// Pairs of live targets currently being compared.
pub(crate) type VisitedPairs = Vec<(*const RefCell<Entity>, *const RefCell<Entity>)>;

/// Live targets currently being printed.
pub(crate) type Visiting = Vec<*const RefCell<Entity>>;

/// A field value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    /// Entity fields that are not (yet) bound to a live instance.
    Detached(Box<Entity>),
    /// Reference to a live instance owned by its registry.
    Link(Link),
}

impl Value {
    /// Builds a link to a live instance.
    pub fn link(target: &EntityHandle) -> Self {
        Self::Link(Link::to(target))
    }

    /// True for `Null` and for links whose target no longer exists.
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Link(link) => link.target().is_none(),
            _ => false,
        }
    }

    /// Returns the live target if this value is a resolvable link.
    pub fn as_link_target(&self) -> Option<EntityHandle> {
        match self {
            Self::Link(link) => link.target(),
            _ => None,
        }
    }

    /// Structural comparison against an entity's fields.
    pub fn matches_entity(&self, entity: &Entity) -> bool {
        self.matches_entity_in(entity, &mut Vec::new())
    }

    fn matches_entity_in(&self, entity: &Entity, seen: &mut VisitedPairs) -> bool {
        match self {
            Self::Detached(detached) => detached.eq_in(entity, seen),
            Self::Link(link) => link.target().is_some_and(|target| {
                target
                    .try_borrow()
                    .is_ok_and(|live| live.eq_in(entity, seen))
            }),
            _ => false,
        }
    }

    /// Equality that remembers which pairs of live targets are being
    /// compared. A pair met again further down compares by identity, which
    /// for distinct targets is `false`, so link cycles terminate.
    pub(crate) fn eq_in(&self, other: &Self, seen: &mut VisitedPairs) -> bool {
        match (self, other) {
            (Self::Link(a), Self::Link(b)) => {
                if a.same_target(b) {
                    return true;
                }
                match (a.target(), b.target()) {
                    (Some(x), Some(y)) => {
                        let pair = (Rc::as_ptr(&x), Rc::as_ptr(&y));
                        if seen.contains(&pair) {
                            return false;
                        }
                        seen.push(pair);
                        let equal = match (x.try_borrow(), y.try_borrow()) {
                            (Ok(left), Ok(right)) => left.eq_in(&right, seen),
                            _ => false,
                        };
                        seen.pop();
                        equal
                    }
                    (None, None) => true,
                    _ => false,
                }
            }
            (Self::Link(link), _) => match link.target() {
                Some(target) => target
                    .try_borrow()
                    .is_ok_and(|live| other.matches_entity_in(&live, seen)),
                None => other.is_null(),
            },
            (_, Self::Link(_)) => other.eq_in(self, seen),
            (Self::Detached(a), Self::Detached(b)) => a.eq_in(b, seen),
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_in(y, seen))
            }
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }

    /// Display that prints a target already being printed as `&Type`.
    pub(crate) fn fmt_in(&self, f: &mut fmt::Formatter<'_>, visiting: &mut Visiting) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_in(f, visiting)?;
                }
                write!(f, "]")
            }
            Self::Detached(entity) => {
                write!(f, "~")?;
                entity.fmt_in(f, visiting)
            }
            Self::Link(link) => {
                let Some(target) = link.target() else {
                    return write!(f, "null");
                };
                let ptr = Rc::as_ptr(&target);
                if visiting.contains(&ptr) {
                    return write!(f, "&{}", link.type_name());
                }
                let Ok(live) = target.try_borrow() else {
                    return write!(f, "&{}(busy)", link.type_name());
                };
                visiting.push(ptr);
                write!(f, "&")?;
                let result = live.fmt_in(f, visiting);
                visiting.pop();
                result
            }
        }
    }

    /// Parses a command-line literal: integers, floats, booleans and `null`,
    /// falling back to text.
    pub fn parse_literal(raw: &str) -> Self {
        if raw == "null" {
            return Self::Null;
        }
        if let Ok(b) = raw.parse::<bool>() {
            return Self::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Self::Float(f);
        }
        Self::Text(raw.to_string())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_in(other, &mut Vec::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_in(f, &mut Vec::new())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Entity> for Value {
    fn from(value: Entity) -> Self {
        Self::Detached(Box::new(value))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Weak reference from one entity to a live instance of another.
///
/// The target's lifetime is governed by its registry; a link never keeps its
/// target alive.
#[derive(Clone)]
pub struct Link {
    target: Weak<RefCell<Entity>>,
    type_name: String,
}

impl Link {
    pub fn to(target: &EntityHandle) -> Self {
        let type_name = target
            .try_borrow()
            .map(|entity| entity.type_name().to_string())
            .unwrap_or_default();
        Self {
            target: Rc::downgrade(target),
            type_name,
        }
    }

    /// The live target, or `None` if it has been dropped by its registry.
    pub fn target(&self) -> Option<EntityHandle> {
        self.target.upgrade()
    }

    /// Type name of the target at the time the link was made.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// True if this link points at `handle` (identity, not structure).
    pub fn points_to(&self, handle: &EntityHandle) -> bool {
        std::ptr::eq(self.target.as_ptr(), Rc::as_ptr(handle))
    }

    pub fn same_target(&self, other: &Link) -> bool {
        self.target.ptr_eq(&other.target)
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.target.strong_count() > 0 {
            "live"
        } else {
            "dangling"
        };
        write!(f, "Link({}, {})", self.type_name, state)
    }
}
