//! File, fine-tuning job and model objects returned by the service.

use serde::{Deserialize, Serialize};

/// An uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,

    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default)]
    pub purpose: Option<String>,

    #[serde(default)]
    pub bytes: Option<u64>,
}

/// Lifecycle state of a fine-tuning job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    ValidatingFiles,
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Whether the job will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::ValidatingFiles => "validating_files",
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fine-tuning job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineTuningJob {
    pub id: String,

    pub model: String,

    pub status: JobStatus,

    #[serde(default)]
    pub training_file: Option<String>,

    /// Resulting model id, set once the job succeeds
    #[serde(default)]
    pub fine_tuned_model: Option<String>,

    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Body of a job creation request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateFineTuningJob {
    pub training_file: String,
    pub model: String,
}

/// A model visible to the credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelObject {
    pub id: String,

    #[serde(default)]
    pub owned_by: Option<String>,

    #[serde(default)]
    pub created: Option<i64>,
}

impl ModelObject {
    /// Fine-tuned models carry the `ft:` prefix.
    pub fn is_fine_tuned(&self) -> bool {
        self.id.starts_with("ft:")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModelList {
    pub data: Vec<ModelObject>,
}

/// Result of a model deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedModel {
    pub id: String,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_parsing() {
        let job: FineTuningJob = serde_json::from_str(
            r#"{"id":"ftjob-1","model":"gpt-3.5-turbo-0125","status":"validating_files","training_file":"file-1"}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::ValidatingFiles);
        assert!(!job.status.is_terminal());
        assert_eq!(job.fine_tuned_model, None);
    }

    #[test]
    fn test_unknown_status_tolerated() {
        let status: JobStatus = serde_json::from_str(r#""paused""#).unwrap();
        assert_eq!(status, JobStatus::Unknown);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert_eq!(JobStatus::Succeeded.to_string(), "succeeded");
    }

    #[test]
    fn test_fine_tuned_prefix() {
        let base = ModelObject {
            id: "gpt-4".to_string(),
            owned_by: None,
            created: None,
        };
        let tuned = ModelObject {
            id: "ft:gpt-3.5-turbo-0125:acme::9x".to_string(),
            owned_by: Some("acme".to_string()),
            created: None,
        };
        assert!(!base.is_fine_tuned());
        assert!(tuned.is_fine_tuned());
    }
}
