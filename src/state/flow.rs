use crate::context::FlowContext;
use crate::core::StepKey;
use crate::core::guard::{GuardContext, GuardIssue};
use crate::core::step::WizardStep;
use crate::core::value::Value;
use crate::error::{ConfigError, WizardError};
use crate::state::wizard_state::WizardState;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Snapshot handed to the submitter once the terminal step is satisfied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub flow: String,
    pub data: IndexMap<String, Value>,
    pub completed_steps: Vec<StepKey>,
    pub context: FlowContext,
}

/// Ordered, guarded steps. Transitions take a state and return a new one;
/// a failed transition leaves the caller's state as it was.
pub struct Wizard {
    id: String,
    title: String,
    steps: Vec<WizardStep>,
    context: FlowContext,
}

impl Wizard {
    pub fn new(id: impl Into<String>, mut steps: Vec<WizardStep>) -> Result<Self, ConfigError> {
        validate_steps(&mut steps)?;
        let id = id.into();
        Ok(Self {
            title: id.clone(),
            id,
            steps,
            context: FlowContext::default(),
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_context(mut self, context: FlowContext) -> Self {
        self.context = context;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn context(&self) -> &FlowContext {
        &self.context
    }

    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, key: &str) -> Option<&WizardStep> {
        self.steps.iter().find(|step| step.key.as_str() == key)
    }

    /// Fresh state positioned on the first step.
    pub fn start(&self) -> WizardState {
        debug!(flow = %self.id, step = %self.steps[0].key, "wizard started");
        WizardState::new(self.steps[0].key.clone())
    }

    pub fn index_of(&self, state: &WizardState) -> Result<usize, WizardError> {
        self.position(state.current_step().as_str())
    }

    pub fn current<'a>(&'a self, state: &WizardState) -> Result<&'a WizardStep, WizardError> {
        Ok(&self.steps[self.index_of(state)?])
    }

    pub fn is_terminal(&self, state: &WizardState) -> bool {
        self.index_of(state)
            .is_ok_and(|index| index + 1 == self.steps.len())
    }

    pub fn blocking_issues(&self, state: &WizardState) -> Vec<GuardIssue> {
        let Ok(step) = self.current(state) else {
            return vec![GuardIssue::step(format!(
                "unknown step '{}'",
                state.current_step()
            ))];
        };
        let ctx = GuardContext::new(&step.key, state.data(), &self.context);
        step.evaluate(&ctx)
    }

    pub fn can_advance(&self, state: &WizardState) -> bool {
        self.blocking_issues(state).is_empty()
    }

    pub fn advance(&self, state: &WizardState) -> Result<WizardState, WizardError> {
        let index = self.index_of(state)?;
        let issues = self.blocking_issues(state);
        if !issues.is_empty() {
            debug!(flow = %self.id, step = %state.current_step(), issues = issues.len(), "advance blocked");
            return Err(WizardError::GuardNotSatisfied {
                step: state.current_step().clone(),
                issues,
            });
        }
        let Some(next) = self.steps.get(index + 1) else {
            return Err(WizardError::NoNextStep {
                current: state.current_step().clone(),
            });
        };

        let mut out = state.with_current(next.key.clone());
        out.mark_completed(state.current_step().clone());
        debug!(flow = %self.id, from = %state.current_step(), to = %next.key, "advanced");
        Ok(out)
    }

    pub fn retreat(&self, state: &WizardState) -> Result<WizardState, WizardError> {
        let index = self.index_of(state)?;
        if index == 0 {
            return Err(WizardError::NoPreviousStep {
                current: state.current_step().clone(),
            });
        }
        let previous = &self.steps[index - 1];
        if previous.is_locked() {
            return Err(WizardError::StepLocked {
                step: previous.key.clone(),
            });
        }
        debug!(flow = %self.id, from = %state.current_step(), to = %previous.key, "retreated");
        Ok(state.with_current(previous.key.clone()))
    }

    /// Moves back to an earlier step in one go. Every step from the target up
    /// to the current one must be revisitable.
    pub fn jump_to(&self, state: &WizardState, target: &str) -> Result<WizardState, WizardError> {
        let from = self.index_of(state)?;
        let to = self.position(target)?;
        if to > from {
            return Err(WizardError::InvalidJump {
                from: state.current_step().clone(),
                to: self.steps[to].key.clone(),
            });
        }
        if let Some(locked) = self.steps[to..from].iter().find(|step| step.is_locked()) {
            return Err(WizardError::StepLocked {
                step: locked.key.clone(),
            });
        }
        let target = &self.steps[to];
        debug!(flow = %self.id, from = %state.current_step(), to = %target.key, "jumped");
        Ok(state.with_current(target.key.clone()))
    }

    pub fn update_field(
        &self,
        state: &WizardState,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> WizardState {
        let field = field.into();
        debug!(flow = %self.id, step = %state.current_step(), field = %field, "field updated");
        let mut out = state.clone();
        out.set(field, value.into());
        out
    }

    pub fn remove_field(&self, state: &WizardState, field: &str) -> WizardState {
        let mut out = state.clone();
        if out.remove(field).is_some() {
            debug!(flow = %self.id, field = %field, "field removed");
        }
        out
    }

    pub fn finish(&self, state: &WizardState) -> Result<Submission, WizardError> {
        if !self.is_terminal(state) || !self.can_advance(state) {
            return Err(WizardError::IncompleteWizard {
                current: state.current_step().clone(),
            });
        }

        let mut completed: IndexSet<StepKey> = state.completed_steps().clone();
        completed.insert(state.current_step().clone());
        info!(flow = %self.id, fields = state.data().len(), "wizard finished");
        Ok(Submission {
            flow: self.id.clone(),
            data: state.data().clone(),
            completed_steps: completed.into_iter().collect(),
            context: self.context.clone(),
        })
    }

    /// Display-only completion percentage of the current step.
    pub fn progress(&self, state: &WizardState) -> f64 {
        match self.index_of(state) {
            Ok(index) => (index + 1) as f64 / self.steps.len() as f64 * 100.0,
            Err(_) => 0.0,
        }
    }

    fn position(&self, key: &str) -> Result<usize, WizardError> {
        self.steps
            .iter()
            .position(|step| step.key.as_str() == key)
            .ok_or_else(|| WizardError::UnknownStep {
                step: StepKey::from(key),
            })
    }
}

impl fmt::Debug for Wizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("id", &self.id)
            .field("steps", &self.steps)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

fn validate_steps(steps: &mut [WizardStep]) -> Result<(), ConfigError> {
    if steps.is_empty() {
        return Err(ConfigError::Empty);
    }

    let mut seen = IndexSet::<&str>::new();
    for (position, step) in steps.iter().enumerate() {
        if step.key.as_str().trim().is_empty() {
            return Err(ConfigError::BlankKey { position });
        }
        if !seen.insert(step.key.as_str()) {
            return Err(ConfigError::DuplicateKey {
                key: step.key.clone(),
            });
        }
    }

    let explicit = steps.iter().filter(|step| step.order.is_some()).count();
    if explicit == 0 {
        for (position, step) in steps.iter_mut().enumerate() {
            step.order = Some(position as i64);
        }
        return Ok(());
    }

    let mut previous: Option<i64> = None;
    for step in steps.iter() {
        let Some(order) = step.order else {
            return Err(ConfigError::PartialOrder {
                key: step.key.clone(),
            });
        };
        if let Some(previous) = previous
            && order <= previous
        {
            return Err(ConfigError::OrderNotIncreasing {
                key: step.key.clone(),
                order,
                previous,
            });
        }
        previous = Some(order);
    }
    Ok(())
}
