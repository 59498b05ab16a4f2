//! Import job records, progress snapshots and validation results.
//!
//! An [`ImportLog`] is the durable record of one import job. While the job
//! is `IN_PROGRESS` the backend also exposes an [`ImportProgress`]
//! snapshot; once the job reaches a terminal stage the snapshot is
//! discarded in favour of the refreshed log.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Lifecycle status of an import job as stored in its log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    #[default]
    Pending,
    InProgress,
    Success,
    Failed,
}

impl ImportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportStatus::Pending => "PENDING",
            ImportStatus::InProgress => "IN_PROGRESS",
            ImportStatus::Success => "SUCCESS",
            ImportStatus::Failed => "FAILED",
        }
    }

    /// Only failed jobs can be retried.
    pub fn is_retryable(self) -> bool {
        self == ImportStatus::Failed
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing stage reported by the progress endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStage {
    #[default]
    Parsing,
    Validating,
    Importing,
    Completed,
    Failed,
    /// A stage this client does not know about. Treated as still running.
    #[serde(other)]
    Unknown,
}

impl ImportStage {
    /// Ordered steps of the progress display.
    pub const STEPS: [ImportStage; 4] = [
        ImportStage::Parsing,
        ImportStage::Validating,
        ImportStage::Importing,
        ImportStage::Completed,
    ];

    /// `COMPLETED` and `FAILED` end a job; every other stage keeps polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportStage::Completed | ImportStage::Failed)
    }

    /// Position within [`ImportStage::STEPS`], or `None` for `FAILED` and
    /// unknown stages.
    pub fn step_index(self) -> Option<usize> {
        Self::STEPS.iter().position(|s| *s == self)
    }

    pub fn label(self) -> &'static str {
        match self {
            ImportStage::Parsing => "Parsing file",
            ImportStage::Validating => "Validating data",
            ImportStage::Importing => "Importing records",
            ImportStage::Completed => "Completed",
            ImportStage::Failed => "Failed",
            ImportStage::Unknown => "Unknown",
        }
    }
}

/// Kind of data carried by an uploaded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportType {
    #[default]
    JiraTickets,
    Assignees,
}

impl ImportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportType::JiraTickets => "JIRA_TICKETS",
            ImportType::Assignees => "ASSIGNEES",
        }
    }
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "JIRA_TICKETS" => Ok(ImportType::JiraTickets),
            "ASSIGNEES" => Ok(ImportType::Assignees),
            _ => Err(CoreError::Parse {
                kind: "import type",
                value: s.to_string(),
            }),
        }
    }
}

/// File formats offered by the template download endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateFormat {
    #[default]
    Csv,
    Excel,
    Json,
}

impl TemplateFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateFormat::Csv => "CSV",
            TemplateFormat::Excel => "EXCEL",
            TemplateFormat::Json => "JSON",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TemplateFormat::Csv => "csv",
            TemplateFormat::Excel => "xlsx",
            TemplateFormat::Json => "json",
        }
    }
}

impl fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CSV" => Ok(TemplateFormat::Csv),
            "EXCEL" | "XLSX" => Ok(TemplateFormat::Excel),
            "JSON" => Ok(TemplateFormat::Json),
            _ => Err(CoreError::Parse {
                kind: "template format",
                value: s.to_string(),
            }),
        }
    }
}

/// Durable record of one import job.
///
/// Every field defaults so that a minimal acknowledgement such as
/// `{"id": 42, "status": "IN_PROGRESS"}` still decodes. Timestamps are kept
/// as the server formats them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportLog {
    pub id: DbId,
    pub file_name: String,
    pub file_size_bytes: u64,
    pub import_type: String,
    pub status: ImportStatus,
    pub records_processed: i64,
    pub records_success: i64,
    pub records_failed: i64,
    pub error_message: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_by: Option<String>,
}

/// Transient snapshot of an in-flight import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportProgress {
    /// Completion percentage (0-100).
    pub current_progress: f64,
    pub total_records: i64,
    pub processed_records: i64,
    pub current_stage: ImportStage,
    pub estimated_completion: Option<String>,
}

impl ImportProgress {
    pub fn is_terminal(&self) -> bool {
        self.current_stage.is_terminal()
    }
}

/// Response of the pre-upload validation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub statistics: serde_json::Value,
}

impl ValidationResult {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
