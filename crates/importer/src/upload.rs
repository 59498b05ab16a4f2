//! Validate-then-upload workflow.
//!
//! A file is always validated by the backend first. Invalid files are never
//! uploaded; files that validate with warnings are only uploaded once the
//! user has confirmed them.

use std::sync::Arc;

use async_trait::async_trait;
use triage_client::{ApiClient, ClientError, UploadFile};
use triage_core::import::{ImportLog, ImportStatus, ImportType, ValidationResult};

use crate::poller::{ImportBackend, PollHandle, PollerConfig, ProgressPoller};

/// Asks the user whether to proceed despite validation warnings.
#[async_trait]
pub trait WarningConfirmation: Send + Sync {
    async fn confirm(&self, warnings: &[String]) -> bool;
}

/// Accepts every warning without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

#[async_trait]
impl WarningConfirmation for AutoConfirm {
    async fn confirm(&self, warnings: &[String]) -> bool {
        tracing::info!(warnings = warnings.len(), "Accepting validation warnings");
        true
    }
}

/// Result of [`UploadWorkflow::submit`].
pub enum UploadOutcome {
    /// Validation failed; nothing was uploaded.
    Rejected(ValidationResult),
    /// The user declined the warnings; nothing was uploaded.
    Declined(ValidationResult),
    /// The backend accepted the file. `poll` follows the job when it is
    /// still running.
    Accepted {
        log: ImportLog,
        poll: Option<PollHandle>,
    },
}

impl std::fmt::Debug for UploadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadOutcome::Rejected(v) => f.debug_tuple("Rejected").field(v).finish(),
            UploadOutcome::Declined(v) => f.debug_tuple("Declined").field(v).finish(),
            UploadOutcome::Accepted { log, poll } => f
                .debug_struct("Accepted")
                .field("log", log)
                .field("polling", &poll.is_some())
                .finish(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File validation failed: {0}")]
    Validation(#[source] ClientError),

    #[error("File upload failed: {0}")]
    Upload(#[source] ClientError),
}

impl UploadError {
    pub fn client_error(&self) -> &ClientError {
        match self {
            UploadError::Validation(e) | UploadError::Upload(e) => e,
        }
    }
}

/// Runs the validation gate and upload for one file at a time.
pub struct UploadWorkflow {
    client: ApiClient,
    poller: PollerConfig,
}

impl UploadWorkflow {
    pub fn new(client: ApiClient, poller: PollerConfig) -> Self {
        Self { client, poller }
    }

    pub async fn submit(
        &self,
        file: &UploadFile,
        import_type: ImportType,
        confirmer: &dyn WarningConfirmation,
    ) -> Result<UploadOutcome, UploadError> {
        let validation = self
            .client
            .validate_file(file)
            .await
            .map_err(UploadError::Validation)?;

        if !validation.is_valid {
            tracing::warn!(
                file_name = %file.file_name,
                errors = validation.errors.len(),
                "File rejected by validation",
            );
            return Ok(UploadOutcome::Rejected(validation));
        }

        if validation.has_warnings() && !confirmer.confirm(&validation.warnings).await {
            tracing::info!(file_name = %file.file_name, "Upload declined after warnings");
            return Ok(UploadOutcome::Declined(validation));
        }

        let log = self
            .client
            .upload_file(file, import_type)
            .await
            .map_err(UploadError::Upload)?;

        tracing::info!(
            import_id = log.id,
            file_name = %file.file_name,
            status = %log.status,
            "Import accepted",
        );

        let poll = (log.status == ImportStatus::InProgress).then(|| {
            let backend: Arc<dyn ImportBackend> = Arc::new(self.client.clone());
            ProgressPoller::start(backend, log.id, self.poller)
        });

        Ok(UploadOutcome::Accepted { log, poll })
    }
}
