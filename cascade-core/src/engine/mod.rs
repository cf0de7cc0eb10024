//! Evaluation Engine
//!
//! The engine owns one node store and drives it through the graph lifecycle:
//! build and sort on demand, collect dirty marks, then flush them.
//!
//! # How It Works
//!
//! 1. The first use (or the first use after [`EvaluationGraph::invalidate_data`])
//!    takes a snapshot from the [`ConstraintSource`], builds the node store
//!    and sorts it.
//!
//! 2. [`EvaluationGraph::mark_for_evaluation`] flags the node for a
//!    constraint and moves the graph to `PendingEvaluation`.
//!
//! 3. [`EvaluationGraph::flush_pending_evaluations`] visits nodes in sorted
//!    order and evaluates every marked one. Evaluating a node re-runs all of
//!    its children recursively, so a whole downstream subgraph settles in
//!    the same flush.
//!
//! # Re-entrancy
//!
//! Constraints are allowed to call back into the graph while they evaluate.
//! All state lives behind `Cell`/`RefCell` and no borrow is held across a
//! call into a constraint. Marks made during a flush are dropped, and a
//! per-node `evaluating` flag stops the cascade from re-entering a node that
//! is already on the call stack, which is what keeps cyclic graphs finite.
//!
//! A node reachable through several parents may run more than once per
//! flush; constraint evaluation is expected to be idempotent.

mod flush;
mod state;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::config::GraphConfig;
use crate::constraint::{ConstraintHandle, ConstraintSource, StableId};
use crate::dump::{GraphDump, NodeDump};
use crate::error::BuildError;
use crate::graph::{self, Node, SortOutcome};

pub use state::GraphState;

/// One built generation of the graph.
#[derive(Default)]
struct Store {
    /// Snapshot the nodes were built from; indexed by `constraint_index`.
    constraints: Vec<ConstraintHandle>,
    /// Nodes in evaluation order.
    nodes: Vec<Node>,
    /// Stable id to node index, valid for the current order.
    index_by_id: IndexMap<StableId, usize>,
}

impl Store {
    fn handle(&self, node: &Node) -> Option<&ConstraintHandle> {
        self.constraints.get(node.constraint_index())
    }
}

/// Incremental, dependency-ordered scheduler for a set of constraints.
///
/// # Example
///
/// ```rust,ignore
/// let graph = EvaluationGraph::new(&source, GraphConfig::default());
///
/// graph.mark_for_evaluation(&handle);
/// assert!(graph.is_pending_evaluation());
///
/// graph.flush_pending_evaluations();
/// assert_eq!(graph.state(), GraphState::ReadyForEvaluation);
/// ```
pub struct EvaluationGraph {
    /// The owning collection. Held weakly; a dropped source is an invalid context.
    source: Weak<dyn ConstraintSource>,
    config: GraphConfig,
    state: Cell<GraphState>,
    store: RefCell<Store>,
    /// Bumped whenever the store is replaced or dropped.
    generation: Cell<u64>,
    cycle_detected: Cell<bool>,
}

impl EvaluationGraph {
    /// Create a graph over `source`. Nothing is built until first use.
    pub fn new<S>(source: &Rc<S>, config: GraphConfig) -> Self
    where
        S: ConstraintSource + 'static,
    {
        let source: Rc<dyn ConstraintSource> = source.clone();
        Self {
            source: Rc::downgrade(&source),
            config,
            state: Cell::new(GraphState::InvalidData),
            store: RefCell::new(Store::default()),
            generation: Cell::new(0),
            cycle_detected: Cell::new(false),
        }
    }

    /// Get the configuration the graph was created with.
    pub fn config(&self) -> GraphConfig {
        self.config
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> GraphState {
        self.state.get()
    }

    /// Check whether marked nodes are waiting for a flush.
    pub fn is_pending_evaluation(&self) -> bool {
        self.state.get() == GraphState::PendingEvaluation
    }

    /// Check whether the last build had to fall back to a best-effort order.
    pub fn cycle_detected(&self) -> bool {
        self.cycle_detected.get()
    }

    /// Rebuild the node store from the current snapshot of the source.
    ///
    /// Leaves the graph in `InvalidData` if the source is gone or has no live
    /// constraints. Ignored while a flush is running.
    pub fn rebuild(&self) {
        if !self.config.enabled {
            trace!("graph disabled, not building");
            return;
        }
        if self.state.get() == GraphState::Flushing {
            debug!("rebuild requested while flushing; ignored");
            return;
        }

        self.generation.set(self.generation.get().wrapping_add(1));

        match self.build_store() {
            Ok((store, outcome)) => {
                debug!(
                    nodes = store.nodes.len(),
                    constraints = store.constraints.len(),
                    ?outcome,
                    "rebuilt evaluation graph"
                );
                self.cycle_detected.set(outcome == SortOutcome::CycleFallback);
                *self.store.borrow_mut() = store;
                self.state.set(GraphState::ReadyForEvaluation);

                if self.config.debug_dump {
                    self.log_dump();
                }
            }
            Err(err) => {
                debug!(%err, "evaluation graph has no data");
                self.cycle_detected.set(false);
                *self.store.borrow_mut() = Store::default();
                self.state.set(GraphState::InvalidData);
            }
        }
    }

    fn build_store(&self) -> Result<(Store, SortOutcome), BuildError> {
        let source = self.source.upgrade().ok_or(BuildError::InvalidContext)?;
        let constraints = source.snapshot().ok_or(BuildError::InvalidContext)?;

        let mut nodes = graph::build(&constraints);
        if nodes.is_empty() {
            return Err(BuildError::EmptySnapshot {
                stale: constraints.len(),
            });
        }

        let outcome = graph::sort(&mut nodes);
        let index_by_id = graph::index_by_id(&nodes);

        Ok((
            Store {
                constraints,
                nodes,
                index_by_id,
            },
            outcome,
        ))
    }

    /// Drop the node store. The next use rebuilds it.
    pub fn invalidate_data(&self) {
        trace!(state = %self.state.get(), "invalidating evaluation graph");
        self.generation.set(self.generation.get().wrapping_add(1));
        self.cycle_detected.set(false);
        *self.store.borrow_mut() = Store::default();
        self.state.set(GraphState::InvalidData);
    }

    /// Notify the graph that the owner gained a constraint.
    pub fn on_constraint_added(&self, handle: &ConstraintHandle) {
        debug!(constraint = %handle.label(), "constraint added");
        self.invalidate_data();
    }

    /// Notify the graph that the owner lost a constraint.
    pub fn on_constraint_removed(&self, handle: &ConstraintHandle) {
        debug!(id = %handle.id(), "constraint removed");
        self.invalidate_data();
    }

    /// Flag the constraint behind `handle` for the next flush.
    ///
    /// Builds the graph first if needed. Unknown or stale handles are
    /// ignored, as are all marks made while a flush is running.
    pub fn mark_for_evaluation(&self, handle: &ConstraintHandle) {
        if !self.config.enabled {
            return;
        }

        match self.state.get() {
            GraphState::Flushing => {
                trace!(id = %handle.id(), "mark dropped during flush");
                return;
            }
            GraphState::InvalidData => self.rebuild(),
            GraphState::ReadyForEvaluation | GraphState::PendingEvaluation => {}
        }

        if !self.state.get().has_data() || !handle.is_live() {
            return;
        }

        let mut store = self.store.borrow_mut();
        let Some(&index) = store.index_by_id.get(&handle.id()) else {
            trace!(id = %handle.id(), "mark for unknown constraint ignored");
            return;
        };
        store.nodes[index].marked_for_evaluation = true;
        drop(store);

        trace!(id = %handle.id(), index, "marked for evaluation");
        if self.state.get() == GraphState::ReadyForEvaluation {
            self.state.set(GraphState::PendingEvaluation);
        }
    }

    /// Constraints in evaluation order, skipping any that have been dropped.
    ///
    /// Builds the graph first if needed. Returns `None` when no order is
    /// available (graph disabled, source gone, or no live constraints).
    pub fn sorted_constraints(&self) -> Option<Vec<ConstraintHandle>> {
        if !self.config.enabled {
            return None;
        }
        if self.state.get() == GraphState::InvalidData {
            self.rebuild();
        }
        if !self.state.get().has_data() {
            return None;
        }

        let store = self.store.borrow();
        let sorted = store
            .nodes
            .iter()
            .filter_map(|node| store.handle(node))
            .filter(|handle| handle.is_live())
            .cloned()
            .collect();
        Some(sorted)
    }

    /// Get the number of nodes in the current store.
    pub fn node_count(&self) -> usize {
        self.store.borrow().nodes.len()
    }

    /// Get a copy of the current nodes, in evaluation order.
    pub fn nodes(&self) -> Vec<Node> {
        self.store.borrow().nodes.clone()
    }

    /// Borrow the current nodes without copying.
    #[cfg(test)]
    pub(crate) fn nodes_ref(&self) -> std::cell::Ref<'_, [Node]> {
        std::cell::Ref::map(self.store.borrow(), |store| store.nodes.as_slice())
    }

    /// Get the number of nodes still marked for evaluation.
    pub fn marked_count(&self) -> usize {
        self.store
            .borrow()
            .nodes
            .iter()
            .filter(|node| node.is_marked_for_evaluation())
            .count()
    }

    /// Build a serializable view of the current graph.
    pub fn dump(&self) -> GraphDump {
        let store = self.store.borrow();
        GraphDump {
            state: self.state.get(),
            cycle_detected: self.cycle_detected.get(),
            nodes: store
                .nodes
                .iter()
                .map(|node| NodeDump::new(node, store.handle(node)))
                .collect(),
        }
    }

    fn log_dump(&self) {
        match self.dump().to_json() {
            Ok(json) => debug!(target: "cascade_core::dump", "evaluation graph:\n{json}"),
            Err(err) => warn!(%err, "failed to serialize graph dump"),
        }
    }
}
