//! Import job orchestration on top of the REST client.
//!
//! - [`poller`]: follows one running import until it reaches a terminal
//!   stage, then refreshes the import-log list once.
//! - [`upload`]: validates a file before uploading it and hands back a
//!   poller for the accepted job.

pub mod poller;
pub mod upload;

pub use poller::{ImportBackend, PollEvent, PollHandle, PollOutcome, PollerConfig, ProgressPoller};
pub use upload::{AutoConfirm, UploadError, UploadOutcome, UploadWorkflow, WarningConfirmation};
