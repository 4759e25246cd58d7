use crate::collab::attachment::Upload;
use crate::collab::credentials::StaticCredentialValidator;
use crate::collab::submission::RecordingSubmitter;
use crate::config::definition::FlowDefinition;
use crate::context::FlowContext;
use crate::core::StepKey;
use crate::core::value::Value;
use crate::error::ConfigError;
use crate::state::flow::Submission;
use crate::state::session::{SessionError, WizardSession};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A recorded sequence of user actions replayed against a flow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub context: FlowContext,
    /// Secret the credential check accepts.
    #[serde(default)]
    pub expected_secret: Option<String>,
    pub actions: Vec<ScriptAction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptAction {
    Set { field: String, value: Value },
    Unset { field: String },
    Password { secret: String },
    Attach {
        field: String,
        name: String,
        mime: String,
        size: u64,
    },
    Advance,
    Retreat,
    Jump { to: String },
    Finish,
}

impl fmt::Display for ScriptAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set { field, .. } => write!(f, "set {field}"),
            Self::Unset { field } => write!(f, "unset {field}"),
            Self::Password { .. } => f.write_str("password"),
            Self::Attach { field, name, .. } => write!(f, "attach {name} to {field}"),
            Self::Advance => f.write_str("advance"),
            Self::Retreat => f.write_str("retreat"),
            Self::Jump { to } => write!(f, "jump to {to}"),
            Self::Finish => f.write_str("finish"),
        }
    }
}

impl Script {
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub action: String,
    pub ok: bool,
    pub step: StepKey,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub flow: String,
    pub outcomes: Vec<ActionOutcome>,
    pub submission: Option<Submission>,
}

impl ScriptReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.ok).count()
    }
}

/// Applies every action in order. A rejected action is recorded and the
/// replay continues from the unchanged state, as a user would.
pub fn replay(
    definition: &FlowDefinition,
    script: &Script,
    secret: Option<&str>,
) -> Result<ScriptReport, ConfigError> {
    let wizard = definition.compile(script.context.clone())?;
    let policy = definition.attachment_policy()?;
    let credential_field = definition
        .credential_field
        .clone()
        .unwrap_or_else(|| "password_validated".to_string());
    let mut validator = secret
        .map(str::to_string)
        .or_else(|| script.expected_secret.clone())
        .map(StaticCredentialValidator::new);
    let mut submitter = RecordingSubmitter::new();
    let mut session = WizardSession::new(&wizard);
    let mut outcomes = Vec::with_capacity(script.actions.len());
    let mut submission = None;

    for action in &script.actions {
        debug!(flow = %wizard.id(), action = %action, "replaying action");
        let result: Result<Option<String>, String> = match action {
            ScriptAction::Set { field, value } => session
                .set(field.as_str(), value.clone())
                .map(|()| None)
                .map_err(describe),
            ScriptAction::Unset { field } => session.unset(field).map(|()| None).map_err(describe),
            ScriptAction::Password { secret } => match validator.as_mut() {
                Some(validator) => {
                    match session.check_credential(validator, &credential_field, secret) {
                        Ok(check) if check.valid => Ok(None),
                        Ok(check) => Err(format!(
                            "credential rejected ({} attempts left)",
                            check.attempts_remaining
                        )),
                        Err(err) => Err(describe(err)),
                    }
                }
                None => Err("no credential validator configured".to_string()),
            },
            ScriptAction::Attach {
                field,
                name,
                mime,
                size,
            } => session
                .attach(field, &Upload::new(name.as_str(), mime.as_str(), *size), &policy)
                .map(|()| None)
                .map_err(|err| err.to_string()),
            ScriptAction::Advance => session.advance().map(|()| None).map_err(describe),
            ScriptAction::Retreat => session.retreat().map(|()| None).map_err(describe),
            ScriptAction::Jump { to } => session.jump_to(to).map(|()| None).map_err(describe),
            ScriptAction::Finish => match session.finish(&mut submitter) {
                Ok(done) => {
                    submission = Some(done);
                    Ok(Some("submitted".to_string()))
                }
                Err(err) => Err(describe(err)),
            },
        };

        let (ok, message) = match result {
            Ok(message) => (true, message),
            Err(message) => (false, Some(message)),
        };
        outcomes.push(ActionOutcome {
            action: action.to_string(),
            ok,
            step: session.state().current_step().clone(),
            progress: session.progress(),
            message,
        });
    }

    Ok(ScriptReport {
        flow: wizard.id().to_string(),
        outcomes,
        submission,
    })
}

fn describe(err: SessionError) -> String {
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin;

    const APPROVAL: &str = r#"
context:
  company: Acme Ltda
  user: ana
expected_secret: master-key
actions:
  - { action: password, secret: wrong }
  - action: advance
  - { action: password, secret: master-key }
  - action: advance
  - action: retreat
  - { action: set, field: company_id, value: "7" }
  - action: advance
  - { action: set, field: decision, value: approve }
  - action: advance
  - { action: set, field: justification, value: "Documents are in order" }
  - action: advance
  - action: finish
  - { action: set, field: confirmed, value: true }
  - action: finish
"#;

    #[test]
    fn replays_company_approval() {
        let def = builtin::builtin("company_approval").expect("flow");
        let script = Script::from_yaml(APPROVAL).expect("script");
        let report = replay(&def, &script, None).expect("replay");

        let oks: Vec<bool> = report.outcomes.iter().map(|o| o.ok).collect();
        assert_eq!(
            oks,
            vec![
                false, false, true, true, false, true, true, true, true, true, true, false,
                true, true
            ]
        );
        assert_eq!(report.failures(), 4);
        assert_eq!(report.outcomes[4].step.as_str(), "review");
        assert_eq!(
            report.outcomes[0].message.as_deref(),
            Some("credential rejected (2 attempts left)")
        );

        let submission = report.submission.expect("submitted");
        assert_eq!(submission.data.get("decision"), Some(&Value::from("approve")));
        assert_eq!(submission.context.user.as_deref(), Some("ana"));
    }

    #[test]
    fn password_without_validator_is_rejected() {
        let def = builtin::builtin("company_approval").expect("flow");
        let script = Script::from_yaml("actions:\n  - { action: password, secret: x }\n")
            .expect("script");
        let report = replay(&def, &script, None).expect("replay");
        assert_eq!(
            report.outcomes[0].message.as_deref(),
            Some("no credential validator configured")
        );
    }

    #[test]
    fn cli_secret_overrides_script() {
        let def = builtin::builtin("company_approval").expect("flow");
        let script = Script::from_yaml(
            "expected_secret: old\nactions:\n  - { action: password, secret: new }\n",
        )
        .expect("script");
        let report = replay(&def, &script, Some("new")).expect("replay");
        assert!(report.outcomes[0].ok);
    }

    #[test]
    fn unquoted_cnpj_passes_details() {
        let def = builtin::builtin("supplier_onboarding").expect("flow");
        let script = Script::from_yaml(
            r#"
actions:
  - { action: set, field: supplier_name, value: Acme Supplies }
  - { action: set, field: cnpj, value: 11222333000181 }
  - action: advance
"#,
        )
        .expect("script");
        let report = replay(&def, &script, None).expect("replay");
        assert!(report.outcomes.iter().all(|o| o.ok));
        assert_eq!(report.outcomes[2].step.as_str(), "contact");
    }

    #[test]
    fn rejected_attachment_is_reported() {
        let def = builtin::builtin("supplier_onboarding").expect("flow");
        let script = Script::from_yaml(
            r#"
actions:
  - { action: attach, field: certificate, name: cert.png, mime: image/png, size: 10 }
"#,
        )
        .expect("script");
        let report = replay(&def, &script, None).expect("replay");
        assert!(!report.outcomes[0].ok);
        assert!(
            report.outcomes[0]
                .message
                .as_deref()
                .is_some_and(|m| m.contains("unsupported type"))
        );
    }
}
