use crate::collab::attachment::{AttachmentPolicy, DEFAULT_MAX_BYTES, DEFAULT_MIME_PATTERNS};
use crate::context::FlowContext;
use crate::core::StepKey;
use crate::core::guard::{self, StepGuard};
use crate::core::step::{StepNavigation, WizardStep};
use crate::core::value::Value;
use crate::error::ConfigError;
use crate::state::flow::Wizard;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field that receives the outcome of a credential check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<AttachmentSettings>,
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentSettings {
    #[serde(default = "default_mime")]
    pub mime: Vec<String>,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

fn default_mime() -> Vec<String> {
    DEFAULT_MIME_PATTERNS.iter().map(|p| p.to_string()).collect()
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub locked: bool,
    /// All must hold before leaving the step.
    #[serde(default)]
    pub guards: Vec<GuardSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GuardSpec {
    Always,
    Required {
        field: String,
        #[serde(default)]
        message: Option<String>,
    },
    IsTrue {
        field: String,
        #[serde(default)]
        message: Option<String>,
    },
    Equals {
        field: String,
        value: Value,
        #[serde(default)]
        message: Option<String>,
    },
    Matches {
        field: String,
        pattern: String,
        #[serde(default)]
        message: Option<String>,
    },
    MinLength {
        field: String,
        min: usize,
        #[serde(default)]
        message: Option<String>,
    },
    ValidCnpj {
        field: String,
        #[serde(default)]
        message: Option<String>,
    },
    AttachmentPresent {
        field: String,
        #[serde(default)]
        message: Option<String>,
    },
    AllOf {
        guards: Vec<GuardSpec>,
    },
    AnyOf {
        guards: Vec<GuardSpec>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl GuardSpec {
    fn compile(&self, step: &str) -> Result<StepGuard, ConfigError> {
        let guard = match self {
            Self::Always => guard::always(),
            Self::Required { field, message } => guard::required(
                field,
                message_or(message, || format!("{field} is required")),
            ),
            Self::IsTrue { field, message } => guard::is_true(
                field,
                message_or(message, || format!("{field} must be confirmed")),
            ),
            Self::Equals {
                field,
                value,
                message,
            } => guard::equals(
                field,
                value.clone(),
                message_or(message, || format!("{field} has an unexpected value")),
            ),
            Self::Matches {
                field,
                pattern,
                message,
            } => {
                let regex = Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                    step: StepKey::from(step),
                    source,
                })?;
                guard::matches(
                    field,
                    regex,
                    message_or(message, || format!("{field} has an invalid format")),
                )
            }
            Self::MinLength {
                field,
                min,
                message,
            } => guard::min_length(
                field,
                *min,
                message_or(message, || format!("{field} needs at least {min} characters")),
            ),
            Self::ValidCnpj { field, message } => guard::valid_cnpj(
                field,
                message_or(message, || format!("{field} is not a valid CNPJ")),
            ),
            Self::AttachmentPresent { field, message } => guard::attachment_present(
                field,
                message_or(message, || format!("{field} needs an attached file")),
            ),
            Self::AllOf { guards } => guard::all_of(compile_all(guards, step)?),
            Self::AnyOf { guards, message } => guard::any_of(
                compile_all(guards, step)?,
                message_or(message, || "none of the alternatives is satisfied".to_string()),
            ),
        };
        Ok(guard)
    }
}

fn compile_all(specs: &[GuardSpec], step: &str) -> Result<Vec<StepGuard>, ConfigError> {
    specs.iter().map(|spec| spec.compile(step)).collect()
}

fn message_or(message: &Option<String>, fallback: impl FnOnce() -> String) -> String {
    message.clone().unwrap_or_else(fallback)
}

impl StepDefinition {
    fn compile(&self) -> Result<WizardStep, ConfigError> {
        let guard = match self.guards.len() {
            0 => guard::always(),
            1 => self.guards[0].compile(&self.key)?,
            _ => guard::all_of(compile_all(&self.guards, &self.key)?),
        };
        Ok(WizardStep {
            key: StepKey::from(&self.key),
            label: self.label.clone(),
            order: self.order,
            description: self.description.clone(),
            navigation: if self.locked {
                StepNavigation::Locked
            } else {
                StepNavigation::Allowed
            },
            guard,
        })
    }
}

impl FlowDefinition {
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    pub fn compile(&self, context: FlowContext) -> Result<Wizard, ConfigError> {
        let steps = self
            .steps
            .iter()
            .map(StepDefinition::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Wizard::new(self.id.clone(), steps)?
            .with_title(self.title())
            .with_context(context))
    }

    pub fn attachment_policy(&self) -> Result<AttachmentPolicy, ConfigError> {
        match &self.attachments {
            Some(settings) => AttachmentPolicy::new(settings.mime.iter().cloned(), settings.max_bytes),
            None => Ok(AttachmentPolicy::default()),
        }
    }
}
