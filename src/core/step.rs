use crate::core::StepKey;
use crate::core::guard::{self, GuardContext, GuardIssue, StepGuard};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepNavigation {
    #[default]
    Allowed,

    /// Once passed, the step cannot be entered again by moving back.
    Locked,
}

pub struct WizardStep {
    pub key: StepKey,
    pub label: String,
    /// Position in the flow. Left unset, `Wizard::start` assigns the list
    /// position.
    pub order: Option<i64>,
    pub description: Option<String>,
    pub navigation: StepNavigation,
    pub guard: StepGuard,
}

impl WizardStep {
    pub fn new(key: impl Into<StepKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            order: None,
            description: None,
            navigation: StepNavigation::default(),
            guard: guard::always(),
        }
    }

    pub fn builder(key: impl Into<StepKey>, label: impl Into<String>) -> StepBuilder {
        StepBuilder::new(key, label)
    }

    pub fn is_locked(&self) -> bool {
        self.navigation == StepNavigation::Locked
    }

    pub fn evaluate(&self, ctx: &GuardContext<'_>) -> Vec<GuardIssue> {
        (self.guard)(ctx)
    }
}

impl fmt::Debug for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardStep")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("order", &self.order)
            .field("navigation", &self.navigation)
            .finish_non_exhaustive()
    }
}

pub struct StepBuilder {
    key: StepKey,
    label: String,
    order: Option<i64>,
    description: Option<String>,
    navigation: StepNavigation,
    guards: Vec<StepGuard>,
}

impl StepBuilder {
    pub fn new(key: impl Into<StepKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            order: None,
            description: None,
            navigation: StepNavigation::default(),
            guards: Vec::new(),
        }
    }

    pub fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn locked(mut self) -> Self {
        self.navigation = StepNavigation::Locked;
        self
    }

    pub fn navigation(mut self, navigation: StepNavigation) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn guard(mut self, guard: StepGuard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn require(self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.guard(guard::required(field, message))
    }

    pub fn require_true(self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.guard(guard::is_true(field, message))
    }

    pub fn when(
        self,
        predicate: impl Fn(&GuardContext<'_>) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        self.guard(guard::custom(predicate, message))
    }

    pub fn build(mut self) -> WizardStep {
        let guard = match self.guards.len() {
            0 => guard::always(),
            1 => self.guards.remove(0),
            _ => guard::all_of(self.guards),
        };
        WizardStep {
            key: self.key,
            label: self.label,
            order: self.order,
            description: self.description,
            navigation: self.navigation,
            guard,
        }
    }
}
