//! Graph Nodes
//!
//! This module defines the scheduling record kept for each constraint.

use indexmap::IndexSet;

use crate::constraint::StableId;

/// A node in the evaluation graph.
///
/// Nodes live in one dense array. `node_index` always equals the node's
/// position in that array, and edges are stored as sets of those positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Stable identity of the constraint this node schedules.
    pub(crate) id: StableId,

    /// Position of this node in the node store.
    pub(crate) node_index: usize,

    /// Position of the constraint in the snapshot the store was built from.
    pub(crate) constraint_index: usize,

    /// Nodes that must evaluate before this one.
    pub(crate) parents: IndexSet<usize>,

    /// Nodes that evaluate after this one and are re-run when it is.
    pub(crate) children: IndexSet<usize>,

    /// Set by a mark, cleared once the node has been evaluated in a flush.
    pub(crate) marked_for_evaluation: bool,

    /// True only while the node is on the active evaluation call stack.
    pub(crate) evaluating: bool,
}

impl Node {
    /// Create an unlinked, unmarked node.
    pub fn new(id: StableId, node_index: usize, constraint_index: usize) -> Self {
        Self {
            id,
            node_index,
            constraint_index,
            parents: IndexSet::new(),
            children: IndexSet::new(),
            marked_for_evaluation: false,
            evaluating: false,
        }
    }

    /// Get the node's stable id.
    pub fn id(&self) -> StableId {
        self.id
    }

    /// Get the node's position in the store.
    pub fn node_index(&self) -> usize {
        self.node_index
    }

    /// Get the constraint's position in the source snapshot.
    pub fn constraint_index(&self) -> usize {
        self.constraint_index
    }

    /// Get the parents (prerequisites) of this node.
    pub fn parents(&self) -> &IndexSet<usize> {
        &self.parents
    }

    /// Get the children (dependents) of this node.
    pub fn children(&self) -> &IndexSet<usize> {
        &self.children
    }

    /// Check whether the node is waiting for the next flush.
    pub fn is_marked_for_evaluation(&self) -> bool {
        self.marked_for_evaluation
    }

    /// Check whether the node is currently being evaluated.
    pub fn is_evaluating(&self) -> bool {
        self.evaluating
    }

    /// Check whether `other` is one of this node's prerequisites.
    pub fn depends_on(&self, other: &Node) -> bool {
        self.parents.contains(&other.node_index)
    }
}

/// Record the edge `parent -> child` in both directions.
///
/// Self-loops and out-of-range indices are ignored. Returns `true` if the
/// edge was newly added.
pub(crate) fn link(nodes: &mut [Node], parent: usize, child: usize) -> bool {
    if parent == child || parent >= nodes.len() || child >= nodes.len() {
        return false;
    }
    let added = nodes[parent].children.insert(child);
    nodes[child].parents.insert(parent);
    added
}
