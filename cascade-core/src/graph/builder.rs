//! Dependency Builder
//!
//! Turns an ordered snapshot of constraint handles into a node store.
//!
//! # Algorithm
//!
//! 1. Walk the snapshot in order, skipping stale handles and handles whose
//!    id already has a node. Each survivor gets the next dense node index
//!    and remembers its position in the snapshot.
//! 2. Ask every surviving constraint for its prerequisites and resolve each
//!    one by id against the nodes of this pass. Unknown prerequisites and
//!    self-references are dropped; everything else becomes a symmetric
//!    parent/child edge.
//!
//! Building never fails. A snapshot with no live constraints simply yields
//! an empty store.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use super::node::{link, Node};
use crate::constraint::{Constraint, ConstraintHandle, StableId};

/// Build unsorted nodes and edges from `snapshot`.
pub fn build(snapshot: &[ConstraintHandle]) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(snapshot.len());
    let mut live: Vec<Rc<dyn Constraint>> = Vec::with_capacity(snapshot.len());
    let mut index_by_id: IndexMap<StableId, usize> = IndexMap::with_capacity(snapshot.len());

    for (constraint_index, handle) in snapshot.iter().enumerate() {
        let Some(constraint) = handle.resolve() else {
            trace!(id = %handle.id(), constraint_index, "skipping stale constraint");
            continue;
        };

        let id = handle.id();
        if index_by_id.contains_key(&id) {
            trace!(%id, constraint_index, "skipping duplicate constraint");
            continue;
        }

        let node_index = nodes.len();
        index_by_id.insert(id, node_index);
        nodes.push(Node::new(id, node_index, constraint_index));
        live.push(constraint);
    }

    for (child, constraint) in live.iter().enumerate() {
        for prerequisite in constraint.prerequisites() {
            match index_by_id.get(&prerequisite.id()) {
                Some(&parent) => {
                    link(&mut nodes, parent, child);
                }
                None => {
                    trace!(
                        child = %nodes[child].id,
                        prerequisite = %prerequisite.id(),
                        "prerequisite is not part of this snapshot"
                    );
                }
            }
        }
    }

    nodes
}

/// Map each node's stable id to its current node index.
pub fn index_by_id(nodes: &[Node]) -> IndexMap<StableId, usize> {
    nodes.iter().map(|node| (node.id, node.node_index)).collect()
}
