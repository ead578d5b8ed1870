//! Job lifecycle status and its legal transitions.

use serde::{Deserialize, Serialize};

/// Job lifecycle status.
///
/// ```text
/// Collecting --finalize--> Finalized --render--> Rendering --ok--> Rendered
///                              ^                     |                 |
///                              +------ failure ------+                 |
///                                                    ^---- re-render --+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is receiving chunks
    #[default]
    Collecting,
    /// Producer signalled that the chunk set is complete
    Finalized,
    /// A render attempt is in flight
    Rendering,
    /// The latest render attempt produced an artifact
    Rendered,
    /// Terminal failure marker. Render failures return the job to
    /// `Finalized` instead, so the core never assigns this status.
    Failed,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Collecting => "collecting",
            JobStatus::Finalized => "finalized",
            JobStatus::Rendering => "rendering",
            JobStatus::Rendered => "rendered",
            JobStatus::Failed => "failed",
        }
    }

    /// Check whether a transition from `self` to `next` is legal.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Collecting, Finalized)
                | (Finalized, Rendering)
                | (Rendered, Rendering)
                | (Rendering, Rendered)
                | (Rendering, Finalized)
        )
    }

    /// Whether a render may be started from this status.
    pub fn can_start_render(&self) -> bool {
        self.can_transition_to(JobStatus::Rendering)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(JobStatus::Collecting.can_transition_to(JobStatus::Finalized));
        assert!(JobStatus::Finalized.can_transition_to(JobStatus::Rendering));
        assert!(JobStatus::Rendering.can_transition_to(JobStatus::Rendered));
        assert!(JobStatus::Rendered.can_transition_to(JobStatus::Rendering));
    }

    #[test]
    fn test_failed_render_returns_to_finalized() {
        assert!(JobStatus::Rendering.can_transition_to(JobStatus::Finalized));
        assert!(!JobStatus::Rendering.can_transition_to(JobStatus::Collecting));
        assert!(!JobStatus::Rendering.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn test_collecting_only_moves_to_finalized() {
        for next in [
            JobStatus::Rendering,
            JobStatus::Rendered,
            JobStatus::Failed,
            JobStatus::Collecting,
        ] {
            assert!(!JobStatus::Collecting.can_transition_to(next), "{next}");
        }
    }

    #[test]
    fn test_render_start_rules() {
        assert!(!JobStatus::Collecting.can_start_render());
        assert!(JobStatus::Finalized.can_start_render());
        assert!(!JobStatus::Rendering.can_start_render());
        assert!(JobStatus::Rendered.can_start_render());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&JobStatus::Rendering).unwrap();
        assert_eq!(json, "\"rendering\"");
        let parsed: JobStatus = serde_json::from_str("\"finalized\"").unwrap();
        assert_eq!(parsed, JobStatus::Finalized);
    }
}
