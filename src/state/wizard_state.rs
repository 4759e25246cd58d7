use crate::core::StepKey;
use crate::core::value::Value;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Everything one wizard run has gathered so far. Only `Wizard` builds new
/// states; callers read them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardState {
    current: StepKey,
    data: IndexMap<String, Value>,
    completed: IndexSet<StepKey>,
}

impl WizardState {
    pub(crate) fn new(first: StepKey) -> Self {
        Self {
            current: first,
            data: IndexMap::new(),
            completed: IndexSet::new(),
        }
    }

    pub fn current_step(&self) -> &StepKey {
        &self.current
    }

    pub fn data(&self) -> &IndexMap<String, Value> {
        &self.data
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn completed_steps(&self) -> &IndexSet<StepKey> {
        &self.completed
    }

    pub fn is_completed(&self, step: &str) -> bool {
        self.completed.contains(step)
    }

    pub(crate) fn with_current(&self, step: StepKey) -> Self {
        let mut next = self.clone();
        next.current = step;
        next
    }

    pub(crate) fn mark_completed(&mut self, step: StepKey) {
        self.completed.insert(step);
    }

    pub(crate) fn set(&mut self, field: String, value: Value) {
        self.data.insert(field, value);
    }

    pub(crate) fn remove(&mut self, field: &str) -> Option<Value> {
        self.data.shift_remove(field)
    }
}
