//! Stable ids and weak constraint handles.

use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Constraint;

/// Stable identity of a constraint.
///
/// Survives graph rebuilds, unlike node or snapshot indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StableId(Uuid);

impl StableId {
    /// Generate a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying GUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for StableId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for StableId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<u128> for StableId {
    fn from(id: u128) -> Self {
        Self(Uuid::from_u128(id))
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A weak reference to an external constraint plus its stable id.
///
/// Cloning a handle never extends the lifetime of the constraint.
#[derive(Clone)]
pub struct ConstraintHandle {
    id: StableId,
    target: Weak<dyn Constraint>,
}

impl ConstraintHandle {
    /// Create a handle observing `constraint`.
    pub fn new<C>(constraint: &Rc<C>) -> Self
    where
        C: Constraint + 'static,
    {
        let target: Rc<dyn Constraint> = constraint.clone();
        Self::from_dyn(&target)
    }

    /// Create a handle from an already type-erased constraint.
    pub fn from_dyn(constraint: &Rc<dyn Constraint>) -> Self {
        Self {
            id: constraint.stable_id(),
            target: Rc::downgrade(constraint),
        }
    }

    /// Get the constraint's stable id.
    ///
    /// Available even after the constraint has been dropped.
    pub fn id(&self) -> StableId {
        self.id
    }

    /// Upgrade to the live constraint, if it still exists.
    pub fn resolve(&self) -> Option<Rc<dyn Constraint>> {
        self.target.upgrade()
    }

    /// Check whether the constraint is still alive.
    pub fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Label used in logs: the constraint's name when live, else its id.
    pub fn label(&self) -> String {
        match self.resolve() {
            Some(constraint) => constraint.name(),
            None => self.id.to_string(),
        }
    }
}

impl fmt::Debug for ConstraintHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintHandle")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

impl PartialEq for ConstraintHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConstraintHandle {}
