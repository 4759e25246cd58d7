pub mod cli;
pub mod collab;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod state;

pub use crate::context::FlowContext;
pub use crate::core::StepKey;
pub use crate::core::guard::{GuardContext, GuardIssue, StepGuard};
pub use crate::core::step::{StepBuilder, StepNavigation, WizardStep};
pub use crate::core::value::{Attachment, Value};
pub use crate::error::{ConfigError, WizardError};
pub use crate::state::flow::{Submission, Wizard};
pub use crate::state::session::{SessionError, WizardSession};
pub use crate::state::wizard_state::WizardState;
