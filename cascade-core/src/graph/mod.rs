//! Evaluation Graph Structure
//!
//! This module holds the node store and the two passes that produce it.
//!
//! # Overview
//!
//! The node store is a dense array with one [`Node`] per live constraint:
//!
//! - Nodes are addressed by their position (`node_index`)
//! - Edges are sets of positions: a node's `parents` must evaluate first,
//!   its `children` are re-run whenever it is
//!
//! The store is never patched. Whenever the set of constraints changes it is
//! rebuilt from scratch by [`build`] and then ordered by [`sort`], which
//! permutes the array once and rewrites every stored index.

mod builder;
mod node;
mod sort;

pub use builder::{build, index_by_id};
pub use node::Node;
pub use sort::{sort, topological_order, SortOutcome};
