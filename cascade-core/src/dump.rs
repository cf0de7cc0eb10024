//! Debug Dump
//!
//! A serializable snapshot of a built graph, logged after each rebuild when
//! `GraphConfig::debug_dump` is set and available on demand through
//! [`EvaluationGraph::dump`](crate::EvaluationGraph::dump).

use serde::Serialize;

use crate::constraint::{ConstraintHandle, StableId};
use crate::engine::GraphState;
use crate::graph::Node;

/// One node as it appears in a dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDump {
    pub id: StableId,
    /// Constraint name, or `None` if the constraint has been dropped.
    pub name: Option<String>,
    pub node_index: usize,
    pub constraint_index: usize,
    pub parents: Vec<usize>,
    pub children: Vec<usize>,
    pub marked_for_evaluation: bool,
}

impl NodeDump {
    pub(crate) fn new(node: &Node, handle: Option<&ConstraintHandle>) -> Self {
        Self {
            id: node.id(),
            name: handle
                .and_then(ConstraintHandle::resolve)
                .map(|constraint| constraint.name()),
            node_index: node.node_index(),
            constraint_index: node.constraint_index(),
            parents: node.parents().iter().copied().collect(),
            children: node.children().iter().copied().collect(),
            marked_for_evaluation: node.is_marked_for_evaluation(),
        }
    }
}

/// The whole graph, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphDump {
    pub state: GraphState,
    pub cycle_detected: bool,
    pub nodes: Vec<NodeDump>,
}

impl GraphDump {
    /// Render the dump as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Names in evaluation order, with `?` for dropped constraints.
    pub fn names(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .map(|node| node.name.as_deref().unwrap_or("?"))
            .collect()
    }
}
