//! Constraint Handles
//!
//! This module defines how the scheduler sees the constraints it orders.
//!
//! # Overview
//!
//! Constraints are owned by an external collection. The scheduler never
//! holds a strong reference to one; it keeps a [`ConstraintHandle`] made of
//! a [`StableId`] and a weak pointer. Every use of a handle goes through
//! [`ConstraintHandle::resolve`], and a handle whose target has been dropped
//! is treated as stale and skipped.
//!
//! Concrete constraint types plug in through the [`Constraint`] trait, which
//! exposes the capabilities the scheduler consumes:
//!
//! - identity (`stable_id`)
//! - ordering data (`prerequisites`)
//! - gating (`is_active_and_enabled`)
//! - the side-effecting computation itself (`evaluate`)
//!
//! The owning collection is abstracted as a [`ConstraintSource`] that can
//! produce an ordered snapshot of handles on demand.

mod handle;
mod source;

#[cfg(test)]
pub(crate) mod mock;

pub use handle::{ConstraintHandle, StableId};
pub use source::ConstraintSource;

/// A schedulable constraint.
///
/// Implementations use interior mutability for their own state: the
/// scheduler only ever calls through `&self`.
pub trait Constraint {
    /// Identity used to deduplicate and look up nodes across rebuilds.
    fn stable_id(&self) -> StableId;

    /// Handles of the constraints that must evaluate before this one.
    fn prerequisites(&self) -> Vec<ConstraintHandle>;

    /// Whether `evaluate` should run. Disabled constraints still settle.
    fn is_active_and_enabled(&self) -> bool;

    /// Run the constraint's computation.
    fn evaluate(&self);

    /// Human readable label for logs and dumps.
    fn name(&self) -> String {
        self.stable_id().to_string()
    }
}
