//! Job identity and job-level views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::{validate_job_id, ValidationResult};
use crate::{Artifact, Continuity, JobStatus, RenderErrorRecord};

/// Caller-supplied job identifier.
///
/// Ids are never generated internally; construction validates the
/// characters so the id can be embedded in blob keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Validate and wrap a raw id.
    pub fn parse(raw: impl Into<String>) -> ValidationResult<Self> {
        let raw = raw.into();
        validate_job_id(&raw)?;
        Ok(Self(raw))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JobId {
    type Error = crate::ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of sealing a job's chunk set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeResult {
    pub job_id: JobId,
    pub chunk_count: usize,
    /// Status after the call
    pub status: JobStatus,
    /// Advisory continuity report
    pub continuity: Continuity,
}

/// Point-in-time view of a job, returned by status lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub status: JobStatus,
    pub continuity: Continuity,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RenderErrorRecord>,
    pub updated_at: DateTime<Utc>,
}
