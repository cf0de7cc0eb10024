//! Graph lifecycle states.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of an [`EvaluationGraph`](super::EvaluationGraph).
///
/// ```text
/// InvalidData --rebuild--> ReadyForEvaluation --mark--> PendingEvaluation
///      ^                          ^                            |
///      |                          +------- Flushing <--flush---+
///      +-- invalidate (from any state)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum GraphState {
    /// No usable node store; the next use rebuilds.
    #[default]
    InvalidData,
    /// Built and sorted, nothing marked.
    ReadyForEvaluation,
    /// At least one node is marked and waiting for a flush.
    PendingEvaluation,
    /// A flush is running. Marks are dropped until it completes.
    Flushing,
}

impl GraphState {
    /// Check whether the graph currently has a node store.
    pub fn has_data(self) -> bool {
        self != GraphState::InvalidData
    }
}

impl fmt::Display for GraphState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphState::InvalidData => "invalid data",
            GraphState::ReadyForEvaluation => "ready for evaluation",
            GraphState::PendingEvaluation => "pending evaluation",
            GraphState::Flushing => "flushing",
        };
        f.write_str(name)
    }
}
