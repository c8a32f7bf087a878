//! Submission schema
//!
//! Submissions are a log, not a keyed record: remote persistence is
//! append-only with auto-assigned document keys, and the local cache keeps
//! every entry.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identified;

/// Remote collection / local namespace for submissions
pub const SUBMISSION_COLLECTION: &str = "submissions";

/// Per-criterion grading entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionScore {
    pub name: String,
    pub score: u8,
    pub explanation: String,
}

/// Grading result attached to a submission after evaluation.
///
/// Produced by an external collaborator; a quota or rate-limit failure there
/// surfaces as an absent report with a degraded-response message, never as a
/// retried call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    pub score: u8,
    pub overall: String,
    #[serde(default)]
    pub criteria: Vec<CriterionScore>,
    #[serde(default)]
    pub latency_ms: u64,
}

/// One free-text task response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub identity_id: String,
    pub organization_id: String,
    pub unit_id: String,
    pub task_id: String,
    pub response: String,

    /// Epoch milliseconds
    pub started_at: i64,
    /// Epoch milliseconds
    pub submitted_at: i64,
    pub elapsed_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<GradeReport>,
}

impl Submission {
    /// Build an ungraded submission stamped with the current time.
    pub fn new(
        identity_id: impl Into<String>,
        organization_id: impl Into<String>,
        unit_id: impl Into<String>,
        task_id: impl Into<String>,
        response: impl Into<String>,
        started_at: i64,
    ) -> Self {
        let submitted_at = Utc::now().timestamp_millis();
        let elapsed_secs = submitted_at.saturating_sub(started_at).max(0) as u64 / 1000;
        Self {
            id: format!("SUB-{}", Uuid::new_v4()),
            identity_id: identity_id.into(),
            organization_id: organization_id.into(),
            unit_id: unit_id.into(),
            task_id: task_id.into(),
            response: response.into(),
            started_at,
            submitted_at,
            elapsed_secs,
            grade: None,
        }
    }
}

impl Identified for Submission {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_submission_elapsed() {
        let started = Utc::now().timestamp_millis() - 90_000;
        let sub = Submission::new("USR-1", "ORG-1", "ALG-101", "T-1", "answer", started);
        assert!(sub.elapsed_secs >= 90);
        assert!(sub.grade.is_none());
        assert!(sub.id.starts_with("SUB-"));
    }

    #[test]
    fn test_grade_optional_on_wire() {
        let sub = Submission::new("USR-1", "ORG-1", "ALG-101", "T-1", "answer", 0);
        let encoded = serde_json::to_value(&sub).expect("encode");
        assert!(encoded.get("grade").is_none());
    }
}
