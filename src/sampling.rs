//! Visit orders over a worker's partition range.
//!
//! A policy turns `(range, episodes)` into a lazy sequence of buffer indices
//! of length `episodes * range.len()`. Every index it yields lies inside the
//! range it was given.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QraceError;
use crate::partition::PartitionRange;
use crate::rng::RandomSource;

/// Default interleave width for strided sampling
pub const DEFAULT_STRIDE: usize = 4;

/// Sampling policy names as accepted in configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum SamplingKind {
    #[default]
    Sequential,
    Random,
    Stride,
}

impl FromStr for SamplingKind {
    type Err = QraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SEQUENTIAL" | "SEQ" => Ok(SamplingKind::Sequential),
            "RANDOM" | "RAND" => Ok(SamplingKind::Random),
            "STRIDE" | "STRIDED" => Ok(SamplingKind::Stride),
            _ => Err(QraceError::unknown_variant("sampling policy", s)),
        }
    }
}

impl TryFrom<String> for SamplingKind {
    type Error = QraceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for SamplingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingKind::Sequential => write!(f, "SEQUENTIAL"),
            SamplingKind::Random => write!(f, "RANDOM"),
            SamplingKind::Stride => write!(f, "STRIDE"),
        }
    }
}

/// Order in which a worker visits its range during one episode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingPolicy {
    /// `start, start+1, ..., end-1`
    Sequential,
    /// `|range|` uniform draws from the range, with replacement
    Random,
    /// Lane `k` visits `start+k, start+k+stride, ...`; lanes in ascending order
    Strided { stride: usize },
}

impl SamplingPolicy {
    pub fn from_kind(kind: SamplingKind, stride: usize) -> Self {
        match kind {
            SamplingKind::Sequential => SamplingPolicy::Sequential,
            SamplingKind::Random => SamplingPolicy::Random,
            SamplingKind::Stride => SamplingPolicy::Strided { stride },
        }
    }

    pub fn kind(&self) -> SamplingKind {
        match self {
            SamplingPolicy::Sequential => SamplingKind::Sequential,
            SamplingPolicy::Random => SamplingKind::Random,
            SamplingPolicy::Strided { .. } => SamplingKind::Stride,
        }
    }

    /// Indices for `episodes` consecutive passes over `range`.
    ///
    /// Only `Random` draws from `rng`. Calling this again with the same
    /// arguments restarts the sequence.
    pub fn visits<'r>(
        &self,
        range: PartitionRange,
        episodes: usize,
        rng: &'r mut RandomSource,
    ) -> Visits<'r> {
        Visits {
            policy: *self,
            range,
            rng,
            episodes_left: if range.is_empty() { 0 } else { episodes },
            pos: 0,
            lane: 0,
            next: range.start,
        }
    }

    /// Indices for a single pass over `range`
    pub fn episode<'r>(&self, range: PartitionRange, rng: &'r mut RandomSource) -> Visits<'r> {
        self.visits(range, 1, rng)
    }
}

impl fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingPolicy::Strided { stride } => write!(f, "STRIDE({})", stride),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// Lazy index sequence produced by [`SamplingPolicy::visits`]
#[derive(Debug)]
pub struct Visits<'r> {
    policy: SamplingPolicy,
    range: PartitionRange,
    rng: &'r mut RandomSource,
    episodes_left: usize,
    /// Indices already produced in the current episode
    pos: usize,
    lane: usize,
    next: usize,
}

impl<'r> Visits<'r> {
    fn start_episode(&mut self) {
        self.pos = 0;
        self.lane = 0;
        self.next = self.range.start;
    }
}

impl<'r> Iterator for Visits<'r> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.episodes_left == 0 {
            return None;
        }
        if self.pos == self.range.len() {
            self.episodes_left -= 1;
            if self.episodes_left == 0 {
                return None;
            }
            self.start_episode();
        }

        let index = match self.policy {
            SamplingPolicy::Sequential => self.range.start + self.pos,
            SamplingPolicy::Random => self.range.start + self.rng.index_below(self.range.len()),
            SamplingPolicy::Strided { stride } => {
                let index = self.next;
                self.next += stride.max(1);
                if self.next >= self.range.end {
                    self.lane += 1;
                    self.next = self.range.start + self.lane;
                }
                index
            }
        };

        self.pos += 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.episodes_left == 0 {
            0
        } else {
            (self.episodes_left - 1) * self.range.len() + (self.range.len() - self.pos)
        };
        (remaining, Some(remaining))
    }
}

impl<'r> ExactSizeIterator for Visits<'r> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngKind, Stream};

    fn lcg() -> RandomSource {
        RandomSource::for_worker(RngKind::Lcg, 42, 0, Stream::Sampling)
    }

    #[test]
    fn test_strided_order() {
        let mut rng = lcg();
        let order: Vec<usize> = SamplingPolicy::Strided { stride: 4 }
            .episode(PartitionRange::new(0, 16), &mut rng)
            .collect();
        assert_eq!(
            order,
            vec![0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15]
        );
    }

    #[test]
    fn test_strided_uneven_range() {
        let mut rng = lcg();
        let order: Vec<usize> = SamplingPolicy::Strided { stride: 4 }
            .episode(PartitionRange::new(10, 20), &mut rng)
            .collect();
        assert_eq!(order, vec![10, 14, 18, 11, 15, 19, 12, 16, 13, 17]);
    }

    #[test]
    fn test_stride_wider_than_range() {
        let mut rng = lcg();
        let order: Vec<usize> = SamplingPolicy::Strided { stride: 8 }
            .episode(PartitionRange::new(5, 8), &mut rng)
            .collect();
        assert_eq!(order, vec![5, 6, 7]);
    }

    #[test]
    fn test_sequential_repeats_per_episode() {
        let mut rng = lcg();
        let visits: Vec<usize> = SamplingPolicy::Sequential
            .visits(PartitionRange::new(3, 6), 3, &mut rng)
            .collect();
        assert_eq!(visits, vec![3, 4, 5, 3, 4, 5, 3, 4, 5]);
    }

    #[test]
    fn test_random_stays_in_range() {
        let mut rng = lcg();
        let range = PartitionRange::new(100, 150);
        let visits = SamplingPolicy::Random.visits(range, 10, &mut rng);
        assert_eq!(visits.len(), 500);
        assert!(visits.into_iter().all(|i| range.contains(i)));
    }

    #[test]
    fn test_exact_size() {
        let mut rng = lcg();
        let mut visits = SamplingPolicy::Sequential.visits(PartitionRange::new(0, 4), 2, &mut rng);
        assert_eq!(visits.len(), 8);
        visits.next();
        visits.next();
        visits.next();
        visits.next();
        visits.next();
        assert_eq!(visits.len(), 3);
    }

    #[test]
    fn test_empty_inputs() {
        let mut rng = lcg();
        assert_eq!(
            SamplingPolicy::Random
                .visits(PartitionRange::new(4, 4), 10, &mut rng)
                .count(),
            0
        );
        assert_eq!(
            SamplingPolicy::Sequential
                .visits(PartitionRange::new(0, 4), 0, &mut rng)
                .count(),
            0
        );
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("SEQUENTIAL".parse::<SamplingKind>().unwrap(), SamplingKind::Sequential);
        assert_eq!("random".parse::<SamplingKind>().unwrap(), SamplingKind::Random);
        assert_eq!("STRIDE".parse::<SamplingKind>().unwrap(), SamplingKind::Stride);
        assert!(matches!(
            "ZIGZAG".parse::<SamplingKind>(),
            Err(QraceError::UnknownVariant { .. })
        ));
    }
}
