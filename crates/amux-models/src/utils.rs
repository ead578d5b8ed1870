//! Validation helpers for caller-supplied identifiers.

use thiserror::Error;

/// Maximum accepted length of a job id.
pub const MAX_JOB_ID_LEN: usize = 128;

/// Result type for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors produced when caller input does not meet the model's rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("job id must not be empty")]
    EmptyJobId,

    #[error("job id exceeds {MAX_JOB_ID_LEN} characters")]
    JobIdTooLong,

    #[error("job id contains invalid characters: {0}")]
    InvalidJobId(String),

    #[error("chunk index must be a non-negative integer, got {0}")]
    InvalidIndex(String),

    #[error("unsupported preset: {0}")]
    UnsupportedPreset(String),
}

/// Validate a job id.
///
/// Job ids are used verbatim inside blob keys, so they are restricted to
/// `[A-Za-z0-9_.-]` and must not be `.` or `..`.
pub fn validate_job_id(raw: &str) -> ValidationResult<()> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyJobId);
    }
    if raw.len() > MAX_JOB_ID_LEN {
        return Err(ValidationError::JobIdTooLong);
    }
    if raw == "." || raw == ".." {
        return Err(ValidationError::InvalidJobId(raw.to_string()));
    }
    let ok = raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !ok {
        return Err(ValidationError::InvalidJobId(raw.to_string()));
    }
    Ok(())
}

/// Validate a signed chunk index and convert it to its unsigned form.
pub fn validate_chunk_index(index: i64) -> ValidationResult<u64> {
    u64::try_from(index).map_err(|_| ValidationError::InvalidIndex(index.to_string()))
}

/// Check whether indices form an unbroken ascending run.
///
/// The input order does not matter; the check is made after a numeric sort.
/// Empty and singleton inputs are continuous. Duplicate indices break the run.
pub fn is_continuous(indices: &[u64]) -> bool {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted
        .windows(2)
        .all(|pair| pair[0].checked_add(1) == Some(pair[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_continuous() {
        assert!(is_continuous(&[0, 1, 2]));
        assert!(!is_continuous(&[0, 2, 3]));
        assert!(is_continuous(&[5]));
        assert!(is_continuous(&[]));
    }

    #[test]
    fn test_is_continuous_unsorted_input() {
        assert!(is_continuous(&[3, 1, 2]));
        assert!(!is_continuous(&[10, 2, 1]));
        assert!(!is_continuous(&[1, 1, 2]));
    }

    #[test]
    fn test_validate_job_id() {
        assert!(validate_job_id("j1").is_ok());
        assert!(validate_job_id("job_2024-01.final").is_ok());
        assert_eq!(validate_job_id(""), Err(ValidationError::EmptyJobId));
        assert!(validate_job_id("..").is_err());
        assert!(validate_job_id("a/b").is_err());
        assert!(validate_job_id("has space").is_err());
        assert_eq!(
            validate_job_id(&"x".repeat(MAX_JOB_ID_LEN + 1)),
            Err(ValidationError::JobIdTooLong)
        );
    }

    #[test]
    fn test_chunk_index_validation() {
        assert_eq!(validate_chunk_index(0), Ok(0));
        assert_eq!(validate_chunk_index(42), Ok(42));
        assert!(validate_chunk_index(-1).is_err());
        assert!(validate_chunk_index(i64::MIN).is_err());
    }
}
