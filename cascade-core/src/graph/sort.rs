//! Topological Sorter
//!
//! Reorders the node store so that every node follows all of its parents,
//! then rewrites every index so the store stays dense and consistent.
//!
//! # Algorithm
//!
//! 1. Kahn's algorithm over the `parents` sets. Ready nodes are taken in
//!    snapshot order (smallest `constraint_index` first), so nodes that are
//!    not ordered relative to each other keep their original order.
//! 2. If some nodes can never become ready, the relation has a cycle. We
//!    then group the nodes into strongly connected components and run the
//!    same Kahn pass over the components, so every edge between components
//!    is honoured. Inside a component (a cyclic subset) we use a stable
//!    comparator sort: a node goes before the nodes that declare it as a
//!    prerequisite, and snapshot order breaks ties. The comparator is not a
//!    total order on a cycle, so that sort is a hand-written insertion sort
//!    that terminates regardless.
//! 3. The chosen order becomes an old-to-new index map. An identity map is
//!    skipped; otherwise every node and every stored edge is rewritten
//!    through the map and the store is permuted in place.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::Serialize;
use tracing::{debug, warn};

use super::node::Node;
use crate::error::CycleError;

/// What [`sort`] did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOutcome {
    /// The store was already in dependency order.
    Unchanged,
    /// A topological order was found and applied.
    Reordered,
    /// The relation is cyclic; a best-effort order was applied.
    CycleFallback,
}

/// Sort `nodes` into dependency order and remap all indices.
pub fn sort(nodes: &mut [Node]) -> SortOutcome {
    let (order, outcome) = match topological_order(nodes) {
        Ok(order) => (order, SortOutcome::Reordered),
        Err(err) => {
            warn!(%err, "using best-effort constraint order");
            (fallback_order(nodes), SortOutcome::CycleFallback)
        }
    };

    let remapped = remap(nodes, &order);
    debug_assert!(is_consistent(nodes), "node store inconsistent after sort");

    match outcome {
        SortOutcome::Reordered if !remapped => SortOutcome::Unchanged,
        outcome => outcome,
    }
}

/// Compute a dependency-respecting order of node indices.
///
/// Returns an error if the parent relation contains a cycle.
pub fn topological_order(nodes: &[Node]) -> Result<Vec<usize>, CycleError> {
    let mut in_degree: Vec<usize> = nodes.iter().map(|node| node.parents.len()).collect();
    let mut ready: BinaryHeap<Reverse<(usize, usize)>> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.parents.is_empty())
        .map(|(index, node)| Reverse((node.constraint_index, index)))
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(Reverse((_, index))) = ready.pop() {
        order.push(index);

        for &child in &nodes[index].children {
            let degree = &mut in_degree[child];
            *degree = degree.saturating_sub(1);
            if *degree == 0 {
                ready.push(Reverse((nodes[child].constraint_index, child)));
            }
        }
    }

    if order.len() == nodes.len() {
        Ok(order)
    } else {
        Err(CycleError {
            unsorted: nodes.len() - order.len(),
            total: nodes.len(),
        })
    }
}

/// Best-effort order for a cyclic relation. Never fails.
///
/// Only edges inside a strongly connected component can end up unsatisfied.
fn fallback_order(nodes: &[Node]) -> Vec<usize> {
    let (component_of, count) = strongly_connected(nodes);

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (index, &component) in component_of.iter().enumerate() {
        members[component].push(index);
    }
    for group in &mut members {
        group.sort_by_key(|&index| nodes[index].constraint_index);
    }

    let mut in_degree = vec![0usize; count];
    for (index, node) in nodes.iter().enumerate() {
        for &child in &node.children {
            if component_of[child] != component_of[index] {
                in_degree[component_of[child]] += 1;
            }
        }
    }

    // Components are keyed by their earliest snapshot position.
    let key = |component: usize| nodes[members[component][0]].constraint_index;
    let mut ready: BinaryHeap<Reverse<(usize, usize)>> = (0..count)
        .filter(|&component| in_degree[component] == 0)
        .map(|component| Reverse((key(component), component)))
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(Reverse((_, component))) = ready.pop() {
        let start = order.len();
        order.extend_from_slice(&members[component]);
        insertion_sort(nodes, &mut order[start..]);

        for &index in &members[component] {
            for &child in &nodes[index].children {
                let target = component_of[child];
                if target == component {
                    continue;
                }
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    ready.push(Reverse((key(target), target)));
                }
            }
        }
    }

    order
}

/// Stable insertion sort of `order` by [`compare`].
fn insertion_sort(nodes: &[Node], order: &mut [usize]) {
    for i in 1..order.len() {
        let mut j = i;
        while j > 0 && compare(&nodes[order[j]], &nodes[order[j - 1]]) == Ordering::Less {
            order.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Tarjan's algorithm. Returns each node's component and the component count.
fn strongly_connected(nodes: &[Node]) -> (Vec<usize>, usize) {
    struct Tarjan<'a> {
        nodes: &'a [Node],
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        next: usize,
        component: Vec<usize>,
        count: usize,
    }

    impl Tarjan<'_> {
        fn visit(&mut self, v: usize) {
            self.index[v] = Some(self.next);
            self.lowlink[v] = self.next;
            self.next += 1;
            self.stack.push(v);
            self.on_stack[v] = true;

            let nodes = self.nodes;
            for &w in &nodes[v].children {
                match self.index[w] {
                    None => {
                        self.visit(w);
                        self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                    }
                    Some(w_index) if self.on_stack[w] => {
                        self.lowlink[v] = self.lowlink[v].min(w_index);
                    }
                    Some(_) => {}
                }
            }

            if Some(self.lowlink[v]) == self.index[v] {
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    self.component[w] = self.count;
                    if w == v {
                        break;
                    }
                }
                self.count += 1;
            }
        }
    }

    let mut tarjan = Tarjan {
        nodes,
        index: vec![None; nodes.len()],
        lowlink: vec![0; nodes.len()],
        on_stack: vec![false; nodes.len()],
        stack: Vec::new(),
        next: 0,
        component: vec![0; nodes.len()],
        count: 0,
    };
    for v in 0..nodes.len() {
        if tarjan.index[v].is_none() {
            tarjan.visit(v);
        }
    }

    (tarjan.component, tarjan.count)
}

/// Prerequisites first, then snapshot order.
fn compare(a: &Node, b: &Node) -> Ordering {
    if b.depends_on(a) {
        Ordering::Less
    } else if a.depends_on(b) {
        Ordering::Greater
    } else {
        a.constraint_index.cmp(&b.constraint_index)
    }
}

/// Apply `order` (new position -> old index). Returns `false` for identity.
fn remap(nodes: &mut [Node], order: &[usize]) -> bool {
    let mut new_index = vec![0; nodes.len()];
    for (new, &old) in order.iter().enumerate() {
        new_index[old] = new;
    }

    if new_index.iter().enumerate().all(|(old, &new)| old == new) {
        return false;
    }

    debug!(nodes = nodes.len(), "remapping node store");
    for node in nodes.iter_mut() {
        node.node_index = new_index[node.node_index];
        node.parents = node.parents.iter().map(|&p| new_index[p]).collect();
        node.children = node.children.iter().map(|&c| new_index[c]).collect();
    }
    nodes.sort_unstable_by_key(|node| node.node_index);

    true
}

/// Check the store invariants: dense indices, symmetric edges, no self-loops.
pub(crate) fn is_consistent(nodes: &[Node]) -> bool {
    nodes.iter().enumerate().all(|(position, node)| {
        node.node_index == position
            && !node.parents.contains(&position)
            && !node.children.contains(&position)
            && node
                .children
                .iter()
                .all(|&c| nodes.get(c).is_some_and(|child| child.parents.contains(&position)))
            && node
                .parents
                .iter()
                .all(|&p| nodes.get(p).is_some_and(|parent| parent.children.contains(&position)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::StableId;
    use crate::graph::node::link;

    fn store(count: usize) -> Vec<Node> {
        (0..count).map(|i| Node::new(StableId::from(i as u128), i, i)).collect()
    }

    fn ids(nodes: &[Node]) -> Vec<u128> {
        nodes.iter().map(|node| node.id().uuid().as_u128()).collect()
    }

    #[test]
    fn unlinked_nodes_keep_snapshot_order() {
        let mut nodes = store(4);
        assert_eq!(sort(&mut nodes), SortOutcome::Unchanged);
        assert_eq!(ids(&nodes), vec![0, 1, 2, 3]);
    }

    #[test]
    fn parents_move_before_children() {
        // 0 depends on 2, 1 depends on 0.
        let mut nodes = store(3);
        link(&mut nodes, 2, 0);
        link(&mut nodes, 0, 1);

        assert_eq!(sort(&mut nodes), SortOutcome::Reordered);
        assert_eq!(ids(&nodes), vec![2, 0, 1]);
        assert!(is_consistent(&nodes));

        // Edges follow the nodes they belonged to.
        assert!(nodes[0].children().contains(&1));
        assert!(nodes[1].parents().contains(&0));
        assert!(nodes[1].children().contains(&2));
        assert!(nodes[2].parents().contains(&1));
    }

    #[test]
    fn unordered_nodes_keep_relative_order() {
        // Only 3 -> 1 is constrained; 0 and 2 stay where they were.
        let mut nodes = store(4);
        link(&mut nodes, 3, 1);

        sort(&mut nodes);
        assert_eq!(ids(&nodes), vec![0, 2, 3, 1]);
    }

    #[test]
    fn topological_order_reports_cycle() {
        let mut nodes = store(3);
        link(&mut nodes, 0, 1);
        link(&mut nodes, 1, 2);
        link(&mut nodes, 2, 0);

        let err = topological_order(&nodes).unwrap_err();
        assert_eq!(err, CycleError { unsorted: 3, total: 3 });
    }

    #[test]
    fn three_node_cycle_uses_fallback_order() {
        let mut nodes = store(3);
        link(&mut nodes, 0, 1);
        link(&mut nodes, 1, 2);
        link(&mut nodes, 2, 0);

        assert_eq!(sort(&mut nodes), SortOutcome::CycleFallback);
        assert_eq!(ids(&nodes), vec![0, 1, 2]);
        assert!(is_consistent(&nodes));
    }

    #[test]
    fn fallback_orders_acyclic_part_of_a_cyclic_store() {
        // 0 <-> 1 form a cycle; 3 must still go before 2.
        let mut nodes = store(4);
        link(&mut nodes, 0, 1);
        link(&mut nodes, 1, 0);
        link(&mut nodes, 3, 2);

        assert_eq!(sort(&mut nodes), SortOutcome::CycleFallback);
        assert_eq!(ids(&nodes), vec![1, 0, 3, 2]);
        assert!(is_consistent(&nodes));
    }

    #[test]
    fn fallback_keeps_edges_outside_the_cycle() {
        // 0 <-> 1 form a cycle; 2 depends on 4 with 3 in between.
        let mut nodes = store(5);
        link(&mut nodes, 0, 1);
        link(&mut nodes, 1, 0);
        link(&mut nodes, 4, 2);

        assert_eq!(sort(&mut nodes), SortOutcome::CycleFallback);
        assert_eq!(ids(&nodes), vec![1, 0, 3, 4, 2]);
        assert!(is_consistent(&nodes));
    }

    #[test]
    fn fallback_orders_nodes_downstream_of_a_cycle() {
        // 3 depends on the 1 <-> 2 cycle and 0 depends on 3.
        let mut nodes = store(4);
        link(&mut nodes, 1, 2);
        link(&mut nodes, 2, 1);
        link(&mut nodes, 2, 3);
        link(&mut nodes, 3, 0);

        assert_eq!(sort(&mut nodes), SortOutcome::CycleFallback);
        let order = ids(&nodes);
        let pos = |id: u128| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(1) < pos(3));
        assert!(pos(2) < pos(3));
        assert!(pos(3) < pos(0));
    }

    #[test]
    fn fallback_is_deterministic() {
        let make = || {
            let mut nodes = store(5);
            link(&mut nodes, 4, 0);
            link(&mut nodes, 0, 3);
            link(&mut nodes, 3, 4);
            link(&mut nodes, 2, 1);
            nodes
        };

        let mut first = make();
        let mut second = make();
        sort(&mut first);
        sort(&mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_store_sorts_trivially() {
        let mut nodes: Vec<Node> = Vec::new();
        assert_eq!(sort(&mut nodes), SortOutcome::Unchanged);
    }
}
