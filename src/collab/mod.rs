pub mod attachment;
pub mod credentials;
pub mod preview;
pub mod submission;

pub use attachment::{AttachmentError, AttachmentPolicy, Upload};
pub use credentials::{CredentialCheck, CredentialValidator, StaticCredentialValidator};
pub use preview::{PreviewHandle, PreviewRegistry, PreviewReleaser};
pub use submission::{JsonSubmitter, RecordingSubmitter, SubmitError, Submitter};
