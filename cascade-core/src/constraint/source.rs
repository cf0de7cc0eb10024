//! The owning collection, as seen by the scheduler.

use std::cell::RefCell;

use super::ConstraintHandle;

/// Supplies the ordered list of constraints a graph is built from.
///
/// The scheduler reads snapshots and never mutates the source.
pub trait ConstraintSource {
    /// Current constraints, in the owner's order.
    ///
    /// `None` means the context itself is invalid (for example, the world the
    /// constraints belong to is being torn down).
    fn snapshot(&self) -> Option<Vec<ConstraintHandle>>;
}

impl ConstraintSource for RefCell<Vec<ConstraintHandle>> {
    fn snapshot(&self) -> Option<Vec<ConstraintHandle>> {
        Some(self.borrow().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::mock::MockConstraint;

    #[test]
    fn list_source_snapshots_in_order() {
        let a = MockConstraint::new("a");
        let b = MockConstraint::new("b");
        let source = RefCell::new(vec![ConstraintHandle::new(&a), ConstraintHandle::new(&b)]);

        let snapshot = source.snapshot().unwrap();
        let ids: Vec<_> = snapshot.iter().map(|h| h.id()).collect();
        assert_eq!(ids, vec![a.id(), b.id()]);

        // Later changes to the owner do not affect an earlier snapshot.
        source.borrow_mut().clear();
        assert_eq!(snapshot.len(), 2);
        assert!(source.snapshot().unwrap().is_empty());
    }
}
