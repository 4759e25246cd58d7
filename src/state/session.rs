use crate::collab::attachment::{AttachmentError, AttachmentPolicy, Upload};
use crate::collab::credentials::{CredentialCheck, CredentialValidator};
use crate::collab::preview::{PreviewHandle, PreviewRegistry, PreviewReleaser};
use crate::collab::submission::{SubmitError, Submitter};
use crate::core::guard::GuardIssue;
use crate::core::step::WizardStep;
use crate::core::value::Value;
use crate::error::WizardError;
use crate::state::flow::{Submission, Wizard};
use crate::state::wizard_state::WizardState;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("wizard '{flow}' was already submitted")]
    AlreadySubmitted { flow: String },
}

/// One run of a wizard: owns the state, applies transitions in place, and
/// cleans up previews when the user leaves a step.
pub struct WizardSession<'w> {
    wizard: &'w Wizard,
    state: WizardState,
    previews: PreviewRegistry,
    submitted: bool,
}

impl<'w> WizardSession<'w> {
    pub fn new(wizard: &'w Wizard) -> Self {
        Self::with_previews(wizard, PreviewRegistry::default())
    }

    pub fn with_releaser(wizard: &'w Wizard, releaser: impl PreviewReleaser + 'static) -> Self {
        Self::with_previews(wizard, PreviewRegistry::new(releaser))
    }

    fn with_previews(wizard: &'w Wizard, previews: PreviewRegistry) -> Self {
        Self {
            wizard,
            state: wizard.start(),
            previews,
            submitted: false,
        }
    }

    pub fn wizard(&self) -> &Wizard {
        self.wizard
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> Result<&WizardStep, WizardError> {
        self.wizard.current(&self.state)
    }

    pub fn progress(&self) -> f64 {
        self.wizard.progress(&self.state)
    }

    pub fn can_advance(&self) -> bool {
        self.wizard.can_advance(&self.state)
    }

    pub fn blocking_issues(&self) -> Vec<GuardIssue> {
        self.wizard.blocking_issues(&self.state)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn set(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.state = self.wizard.update_field(&self.state, field, value);
        Ok(())
    }

    pub fn unset(&mut self, field: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.state = self.wizard.remove_field(&self.state, field);
        Ok(())
    }

    /// Runs the check and stores only its outcome under `field`.
    pub fn check_credential(
        &mut self,
        validator: &mut dyn CredentialValidator,
        field: &str,
        secret: &str,
    ) -> Result<CredentialCheck, SessionError> {
        self.ensure_open()?;
        let check = validator.validate(secret);
        if !check.valid {
            warn!(
                flow = %self.wizard.id(),
                attempts_remaining = check.attempts_remaining,
                "credential rejected"
            );
        }
        self.set(field, check.valid)?;
        Ok(check)
    }

    /// Stores the upload under `field` if the policy accepts it. A rejected
    /// upload clears any earlier value so a stale file cannot satisfy a guard.
    pub fn attach(
        &mut self,
        field: &str,
        upload: &Upload,
        policy: &AttachmentPolicy,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        match policy.accept(upload) {
            Ok(attachment) => self.set(field, attachment),
            Err(err) => {
                self.unset(field)?;
                Err(err.into())
            }
        }
    }

    pub fn add_preview(&mut self, handle: PreviewHandle) {
        self.previews
            .register(self.state.current_step().clone(), handle);
    }

    pub fn advance(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        let next = self.wizard.advance(&self.state)?;
        self.replace_state(next);
        Ok(())
    }

    pub fn retreat(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        let next = self.wizard.retreat(&self.state)?;
        self.replace_state(next);
        Ok(())
    }

    pub fn jump_to(&mut self, target: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let next = self.wizard.jump_to(&self.state, target)?;
        self.replace_state(next);
        Ok(())
    }

    /// Hands the collected data to `submitter`. Succeeds at most once; after
    /// that the session rejects every further change.
    pub fn finish(&mut self, submitter: &mut dyn Submitter) -> Result<Submission, SessionError> {
        self.ensure_open()?;
        let submission = self.wizard.finish(&self.state)?;
        submitter.submit(&submission)?;
        self.submitted = true;
        self.previews.release_all();
        info!(flow = %self.wizard.id(), "wizard submitted");
        Ok(submission)
    }

    pub fn cancel(mut self) {
        info!(flow = %self.wizard.id(), step = %self.state.current_step(), "wizard cancelled");
        self.previews.release_all();
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.submitted {
            return Err(SessionError::AlreadySubmitted {
                flow: self.wizard.id().to_string(),
            });
        }
        Ok(())
    }

    fn replace_state(&mut self, next: WizardState) {
        if next.current_step() != self.state.current_step() {
            self.previews.release_step(self.state.current_step().as_str());
        }
        self.state = next;
    }
}
