//! Error Types
//!
//! Most failure modes of the scheduler are absorbed where they occur: a
//! failed build leaves the graph in `InvalidData`, a cycle falls back to a
//! best-effort order. These types carry the detail for logging, and only
//! configuration parsing surfaces an error to the caller.

use thiserror::Error;

/// Why a node store could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The owning collection is gone or reported an invalid context.
    #[error("constraint source is no longer available")]
    InvalidContext,

    /// The snapshot had no live constraints.
    #[error("snapshot of {stale} constraint(s) contained no live constraint")]
    EmptySnapshot {
        /// Number of stale handles that were skipped.
        stale: usize,
    },
}

/// The prerequisite relation contains at least one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle: {unsorted} of {total} node(s) could not be ordered")]
pub struct CycleError {
    /// Nodes left over once no more nodes had all parents placed.
    pub unsorted: usize,
    /// Total number of nodes in the store.
    pub total: usize,
}

/// Failure to read a [`GraphConfig`](crate::GraphConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration was not valid JSON for the expected shape.
    #[error("invalid graph configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
