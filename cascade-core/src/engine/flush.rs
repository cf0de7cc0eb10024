//! Flushing marked nodes and cascading into their children.

use smallvec::SmallVec;
use tracing::{debug, error, trace};

use super::{EvaluationGraph, GraphState};
use crate::constraint::ConstraintHandle;
use crate::graph::Node;

impl EvaluationGraph {
    /// Evaluate every marked node and everything downstream of it.
    ///
    /// Does nothing without data, with an empty store, or when called from
    /// inside a running flush.
    pub fn flush_pending_evaluations(&self) {
        match self.state.get() {
            GraphState::InvalidData | GraphState::Flushing => return,
            GraphState::ReadyForEvaluation | GraphState::PendingEvaluation => {}
        }

        let count = self.store.borrow().nodes.len();
        if count == 0 {
            return;
        }

        let generation = self.generation.get();
        self.state.set(GraphState::Flushing);
        debug!(nodes = count, "flushing pending evaluations");

        for index in 0..count {
            if self.generation.get() != generation {
                debug!("graph invalidated during flush");
                break;
            }
            let marked = self
                .store
                .borrow()
                .nodes
                .get(index)
                .is_some_and(Node::is_marked_for_evaluation);
            if marked {
                self.evaluate(index, generation);
            }
        }

        // Invalidated (and possibly rebuilt) from inside an evaluation.
        if self.state.get() != GraphState::Flushing {
            return;
        }

        let still_marked = self.marked_count();
        if still_marked > 0 {
            error!(still_marked, "nodes left marked after flush");
        }
        debug_assert_eq!(still_marked, 0, "nodes left marked after flush");

        self.state.set(GraphState::ReadyForEvaluation);
    }

    /// Evaluate one node, then cascade into all of its children.
    fn evaluate(&self, index: usize, generation: u64) {
        let Some((handle, children)) = self.enter(index, generation) else {
            return;
        };

        if let Some(constraint) = handle.as_ref().and_then(ConstraintHandle::resolve) {
            if constraint.is_active_and_enabled() {
                trace!(constraint = %constraint.name(), index, "evaluating");
                constraint.evaluate();
            } else {
                trace!(constraint = %constraint.name(), index, "skipping disabled constraint");
            }
        }

        self.with_node(index, generation, |node| node.marked_for_evaluation = false);

        for child in children {
            self.evaluate(child, generation);
        }

        self.with_node(index, generation, |node| node.evaluating = false);
    }

    /// Set the re-entrancy guard and collect what the evaluation needs.
    ///
    /// Returns `None` if the node is already on the call stack or no longer
    /// exists.
    fn enter(
        &self,
        index: usize,
        generation: u64,
    ) -> Option<(Option<ConstraintHandle>, SmallVec<[usize; 8]>)> {
        if self.generation.get() != generation {
            return None;
        }

        let mut store = self.store.borrow_mut();
        let node = store.nodes.get_mut(index)?;
        if node.evaluating {
            trace!(index, "node already evaluating; breaking cycle");
            return None;
        }
        node.evaluating = true;
        let constraint_index = node.constraint_index;
        let children = node.children.iter().copied().collect();

        let handle = store.constraints.get(constraint_index).cloned();
        Some((handle, children))
    }

    fn with_node(&self, index: usize, generation: u64, update: impl FnOnce(&mut Node)) {
        if self.generation.get() != generation {
            return;
        }
        if let Some(node) = self.store.borrow_mut().nodes.get_mut(index) {
            update(node);
        }
    }
}
