//! Recording constraint used by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{Constraint, ConstraintHandle, StableId};

/// Shared, ordered record of which constraints evaluated.
pub(crate) type EvalLog = Rc<RefCell<Vec<&'static str>>>;

pub(crate) struct MockConstraint {
    id: StableId,
    name: &'static str,
    prerequisites: RefCell<Vec<ConstraintHandle>>,
    enabled: Cell<bool>,
    evaluations: Cell<usize>,
    log: Option<EvalLog>,
    on_evaluate: RefCell<Option<Box<dyn Fn()>>>,
}

impl MockConstraint {
    pub(crate) fn new(name: &'static str) -> Rc<Self> {
        Self::build(name, None)
    }

    pub(crate) fn logged(name: &'static str, log: &EvalLog) -> Rc<Self> {
        Self::build(name, Some(log.clone()))
    }

    fn build(name: &'static str, log: Option<EvalLog>) -> Rc<Self> {
        Rc::new(Self {
            id: StableId::new(),
            name,
            prerequisites: RefCell::new(Vec::new()),
            enabled: Cell::new(true),
            evaluations: Cell::new(0),
            log,
            on_evaluate: RefCell::new(None),
        })
    }

    pub(crate) fn id(&self) -> StableId {
        self.id
    }

    /// Declare that `prerequisite` must evaluate before `self`.
    pub(crate) fn depends_on<C>(&self, prerequisite: &Rc<C>)
    where
        C: Constraint + 'static,
    {
        self.prerequisites
            .borrow_mut()
            .push(ConstraintHandle::new(prerequisite));
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub(crate) fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    pub(crate) fn on_evaluate(&self, hook: impl Fn() + 'static) {
        *self.on_evaluate.borrow_mut() = Some(Box::new(hook));
    }
}

impl Constraint for MockConstraint {
    fn stable_id(&self) -> StableId {
        self.id
    }

    fn prerequisites(&self) -> Vec<ConstraintHandle> {
        self.prerequisites.borrow().clone()
    }

    fn is_active_and_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn evaluate(&self) {
        self.evaluations.set(self.evaluations.get() + 1);
        if let Some(log) = &self.log {
            log.borrow_mut().push(self.name);
        }
        if let Some(hook) = self.on_evaluate.borrow().as_ref() {
            hook();
        }
    }

    fn name(&self) -> String {
        self.name.to_string()
    }
}
