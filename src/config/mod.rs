pub mod builtin;
pub mod definition;

pub use builtin::{all_builtin, builtin, builtin_ids};
pub use definition::{AttachmentSettings, FlowDefinition, GuardSpec, StepDefinition};
