//! Chunk references and continuity reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::is_continuous;

/// Maximum number of missing indices listed in a [`Continuity`] report.
pub const MAX_REPORTED_GAPS: usize = 1000;

/// Reference to one uploaded chunk held in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    /// Position of the chunk in the job
    pub index: u64,
    /// Blob store key holding the chunk bytes
    pub storage_key: String,
    /// Size of the chunk in bytes
    pub size_bytes: u64,
    /// MIME type supplied by the producer
    pub content_type: String,
    /// When the chunk was registered
    pub uploaded_at: DateTime<Utc>,
}

/// Continuity report for a set of chunk indices.
///
/// Continuity is advisory: finalize and render accept gapped sets and
/// surface the gaps here instead of skipping them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Continuity {
    /// Number of chunks
    pub chunk_count: usize,
    /// Whether the indices form an unbroken ascending run
    pub is_continuous: bool,
    /// Lowest index, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_index: Option<u64>,
    /// Highest index, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_index: Option<u64>,
    /// Total number of indices missing between first and last
    pub missing_count: u64,
    /// Missing indices, truncated to [`MAX_REPORTED_GAPS`] entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_indices: Vec<u64>,
}

impl Continuity {
    /// Build a report from indices in any order.
    pub fn from_indices(indices: &[u64]) -> Self {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let (first, last) = match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Self {
                    is_continuous: true,
                    ..Default::default()
                }
            }
        };

        let span = last - first + 1;
        let missing_count = span - sorted.len() as u64;

        let mut missing_indices = Vec::new();
        for pair in sorted.windows(2) {
            let mut next = pair[0] + 1;
            while next < pair[1] && missing_indices.len() < MAX_REPORTED_GAPS {
                missing_indices.push(next);
                next += 1;
            }
            if missing_indices.len() >= MAX_REPORTED_GAPS {
                break;
            }
        }

        Self {
            chunk_count: indices.len(),
            is_continuous: is_continuous(indices),
            first_index: Some(first),
            last_index: Some(last),
            missing_count,
            missing_indices,
        }
    }

    /// Build a report from chunk references.
    pub fn from_chunks(chunks: &[ChunkRef]) -> Self {
        let indices: Vec<u64> = chunks.iter().map(|c| c.index).collect();
        Self::from_indices(&indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuous_report() {
        let report = Continuity::from_indices(&[2, 0, 1]);
        assert!(report.is_continuous);
        assert_eq!(report.chunk_count, 3);
        assert_eq!(report.first_index, Some(0));
        assert_eq!(report.last_index, Some(2));
        assert_eq!(report.missing_count, 0);
        assert!(report.missing_indices.is_empty());
    }

    #[test]
    fn test_gapped_report() {
        let report = Continuity::from_indices(&[0, 3, 5]);
        assert!(!report.is_continuous);
        assert_eq!(report.missing_count, 3);
        assert_eq!(report.missing_indices, vec![1, 2, 4]);
    }

    #[test]
    fn test_empty_report() {
        let report = Continuity::from_indices(&[]);
        assert!(report.is_continuous);
        assert_eq!(report.chunk_count, 0);
        assert_eq!(report.first_index, None);
    }

    #[test]
    fn test_huge_gap_is_truncated() {
        let report = Continuity::from_indices(&[0, 1_000_000]);
        assert_eq!(report.missing_count, 999_999);
        assert_eq!(report.missing_indices.len(), MAX_REPORTED_GAPS);
        assert_eq!(report.missing_indices[0], 1);
    }
}
