//! Division of the experience buffer's index space into one contiguous
//! range per worker.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QraceError, Result};

/// End-exclusive index range `[start, end)` owned by one worker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionRange {
    pub start: usize,
    pub end: usize,
}

impl PartitionRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        PartitionRange { start, end }
    }

    /// Number of indices in the range; an inverted range is empty
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// Equal-sized contiguous ranges, one per worker.
///
/// Ranges cover `[0, chunk * workers)` where `chunk = num_samples / workers`.
/// The `num_samples % workers` trailing samples belong to no range and are
/// never visited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionPlan {
    ranges: Vec<PartitionRange>,
    num_samples: usize,
}

impl PartitionPlan {
    /// Partition `num_samples` across `worker_count` workers.
    ///
    /// Fails when there are no workers, fewer samples than workers, or fewer
    /// than `worker_count * min_batch` samples.
    pub fn new(num_samples: usize, worker_count: usize, min_batch: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(QraceError::invalid_parameter(
                "worker_count",
                "must be greater than 0",
            ));
        }

        let required = worker_count.saturating_mul(min_batch.max(1));
        if num_samples < required {
            return Err(QraceError::InsufficientData {
                samples: num_samples,
                required,
            });
        }

        let chunk = num_samples / worker_count;
        let ranges: Vec<PartitionRange> = (0..worker_count)
            .map(|w| PartitionRange::new(w * chunk, (w + 1) * chunk))
            .collect();

        let plan = PartitionPlan { ranges, num_samples };
        if plan.dropped() > 0 {
            debug!(
                dropped = plan.dropped(),
                covered = plan.covered(),
                "trailing samples do not divide evenly across workers and are skipped"
            );
        }
        Ok(plan)
    }

    pub fn ranges(&self) -> &[PartitionRange] {
        &self.ranges
    }

    pub fn worker_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Length of every range
    pub fn chunk_len(&self) -> usize {
        self.ranges.first().map(PartitionRange::len).unwrap_or(0)
    }

    /// Number of samples assigned to some worker
    pub fn covered(&self) -> usize {
        self.chunk_len() * self.ranges.len()
    }

    /// Number of trailing samples assigned to no worker
    pub fn dropped(&self) -> usize {
        self.num_samples - self.covered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousand_samples_sixteen_workers() {
        let plan = PartitionPlan::new(1000, 16, 1).unwrap();

        assert_eq!(plan.worker_count(), 16);
        assert_eq!(plan.chunk_len(), 62);
        assert_eq!(plan.covered(), 992);
        assert_eq!(plan.dropped(), 8);

        let mut expected_start = 0;
        for range in plan.ranges() {
            assert_eq!(range.start, expected_start);
            assert_eq!(range.len(), 62);
            expected_start = range.end;
        }
        assert_eq!(expected_start, 992);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let range = PartitionRange { start: 9, end: 4 };
        assert_eq!(range.len(), 0);
        assert!(range.is_empty());
        assert!(!range.contains(5));
    }

    #[test]
    fn test_even_division_covers_everything() {
        let plan = PartitionPlan::new(64, 4, 1).unwrap();
        assert_eq!(plan.dropped(), 0);
        assert_eq!(plan.ranges()[3], PartitionRange::new(48, 64));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(
            PartitionPlan::new(100, 0, 1),
            Err(QraceError::InvalidParameter { .. })
        ));
        assert!(matches!(
            PartitionPlan::new(3, 4, 1),
            Err(QraceError::InsufficientData { samples: 3, required: 4 })
        ));
        assert!(matches!(
            PartitionPlan::new(7999, 16, 500),
            Err(QraceError::InsufficientData { required: 8000, .. })
        ));
        assert!(PartitionPlan::new(8000, 16, 500).is_ok());
    }
}
