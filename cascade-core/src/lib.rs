//! Cascade Core
//!
//! This crate provides an incremental, dependency-ordered evaluation
//! scheduler for a dynamic set of constraints. It implements:
//!
//! - A dense node store built from a snapshot of constraint handles
//! - Dependency-respecting ordering with a deterministic cycle fallback
//! - Dirty marking and flushing with a full downstream cascade
//!
//! The constraints themselves live outside this crate. The scheduler only
//! observes them through weak handles and the [`Constraint`] capability
//! trait, so dropping a constraint never leaves the graph dangling.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `constraint`: Stable ids, weak handles and the snapshot source
//! - `graph`: Node store, dependency builder and topological sorter
//! - `engine`: The evaluation state machine (mark, flush, cascade)
//! - `config`: Explicit configuration passed to the engine
//! - `dump`: Serializable debug view of a built graph
//!
//! # Example
//!
//! ```rust,ignore
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use cascade_core::{ConstraintHandle, EvaluationGraph, GraphConfig};
//!
//! // The owning collection hands out its current list of constraints.
//! let source = Rc::new(RefCell::new(vec![
//!     ConstraintHandle::new(&parent),
//!     ConstraintHandle::new(&child),
//! ]));
//!
//! let graph = EvaluationGraph::new(&source, GraphConfig::default());
//!
//! // Something moved: re-run `parent` and everything downstream of it.
//! graph.mark_for_evaluation(&ConstraintHandle::new(&parent));
//! graph.flush_pending_evaluations();
//! ```

pub mod config;
pub mod constraint;
pub mod dump;
pub mod engine;
pub mod error;
pub mod graph;

pub use config::GraphConfig;
pub use constraint::{Constraint, ConstraintHandle, ConstraintSource, StableId};
pub use engine::{EvaluationGraph, GraphState};
pub use error::{BuildError, ConfigError, CycleError};
pub use graph::{Node, SortOutcome};
