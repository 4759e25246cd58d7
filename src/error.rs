use crate::core::StepKey;
use crate::core::guard::GuardIssue;
use thiserror::Error;

/// A malformed flow: raised while building a wizard, never while running one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("flow has no steps")]
    Empty,

    #[error("step key cannot be blank (position {position})")]
    BlankKey { position: usize },

    #[error("duplicate step key '{key}'")]
    DuplicateKey { key: StepKey },

    #[error("step order must be given for every step or for none (missing on '{key}')")]
    PartialOrder { key: StepKey },

    #[error("step order must be strictly increasing: '{key}' has {order}, previous was {previous}")]
    OrderNotIncreasing {
        key: StepKey,
        order: i64,
        previous: i64,
    },

    #[error("invalid pattern for step '{step}': {source}")]
    Pattern {
        step: StepKey,
        #[source]
        source: regex::Error,
    },

    #[error("invalid MIME pattern '{pattern}': {source}")]
    MimePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to parse flow definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read flow definition: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown built-in flow '{0}'")]
    UnknownFlow(String),
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("step '{step}' is not complete: {}", join_issues(.issues))]
    GuardNotSatisfied {
        step: StepKey,
        issues: Vec<GuardIssue>,
    },

    #[error("step '{step}' cannot be revisited")]
    StepLocked { step: StepKey },

    #[error("wizard is not finished: current step is '{current}'")]
    IncompleteWizard { current: StepKey },

    #[error("step '{current}' is the last step")]
    NoNextStep { current: StepKey },

    #[error("step '{current}' is the first step")]
    NoPreviousStep { current: StepKey },

    #[error("unknown step '{step}'")]
    UnknownStep { step: StepKey },

    #[error("cannot jump forward from '{from}' to '{to}'")]
    InvalidJump { from: StepKey, to: StepKey },
}

impl WizardError {
    /// Issues to show inline next to the current step.
    pub fn issues(&self) -> &[GuardIssue] {
        match self {
            Self::GuardNotSatisfied { issues, .. } => issues.as_slice(),
            _ => &[],
        }
    }
}

fn join_issues(issues: &[GuardIssue]) -> String {
    if issues.is_empty() {
        return "requirement not met".to_string();
    }
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
