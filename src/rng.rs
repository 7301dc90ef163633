//! Per-worker random streams.
//!
//! Every worker owns its sources outright; nothing here is shared between
//! threads. Two generators are available: the deterministic 32-bit linear
//! congruential generator used throughout this benchmark family, and the
//! platform generator from `rand` seeded from OS entropy.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QraceError;

const LCG_A: u32 = 1_664_525;
const LCG_C: u32 = 1_013_904_223;

/// Base seed every worker stream is derived from unless configured otherwise
pub const DEFAULT_SEED: u64 = 42;

/// `x <- x * 1664525 + 1013904223 (mod 2^32)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Lcg { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_A).wrapping_add(LCG_C);
        self.state
    }
}

/// Which generator backs a worker's streams
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RngKind {
    #[default]
    Lcg,
    Platform,
}

impl FromStr for RngKind {
    type Err = QraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lcg" => Ok(RngKind::Lcg),
            "platform" | "std" => Ok(RngKind::Platform),
            _ => Err(QraceError::unknown_variant("random source", s)),
        }
    }
}

impl TryFrom<String> for RngKind {
    type Error = QraceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for RngKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RngKind::Lcg => write!(f, "lcg"),
            RngKind::Platform => write!(f, "platform"),
        }
    }
}

/// Purpose of a stream within one worker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Sampling = 0,
    Exploration = 1,
}

/// Explicit random source handed to sampling and action selection
#[derive(Clone, Debug)]
pub enum RandomSource {
    Lcg(Lcg),
    Platform(StdRng),
}

impl RandomSource {
    /// Build the stream `stream` of worker `worker`.
    ///
    /// LCG streams are a pure function of `(seed, worker, stream)`; platform
    /// streams ignore the seed.
    pub fn for_worker(kind: RngKind, seed: u64, worker: usize, stream: Stream) -> Self {
        match kind {
            RngKind::Lcg => {
                RandomSource::Lcg(Lcg::new(derive_seed(seed, worker, stream) as u32))
            }
            RngKind::Platform => RandomSource::Platform(StdRng::from_entropy()),
        }
    }

    /// Uniform index in `[0, n)`. `n` must be non-zero.
    ///
    /// LCG draws are scaled from the high bits; the low bits of a
    /// power-of-two modulus LCG cycle with a short period.
    pub fn index_below(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        match self {
            RandomSource::Lcg(lcg) => ((u64::from(lcg.next_u32()) * n as u64) >> 32) as usize,
            RandomSource::Platform(rng) => rng.gen_range(0..n),
        }
    }

    /// Uniform draw in `[0, 1)`
    pub fn unit(&mut self) -> f64 {
        match self {
            RandomSource::Lcg(lcg) => lcg.next_u32() as f64 / 4_294_967_296.0,
            RandomSource::Platform(rng) => rng.gen::<f64>(),
        }
    }
}

/// Mix a base seed with a worker index and stream id (splitmix64 finaliser).
fn derive_seed(seed: u64, worker: usize, stream: Stream) -> u64 {
    let mut z = seed
        .wrapping_add((worker as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((stream as u64 + 1).wrapping_mul(0xD1B5_4A32_D192_ED03));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_sequence() {
        let mut lcg = Lcg::new(42);
        // 42 * 1664525 + 1013904223 = 1083814273
        assert_eq!(lcg.next_u32(), 1_083_814_273);
        let second = 1_083_814_273u32.wrapping_mul(LCG_A).wrapping_add(LCG_C);
        assert_eq!(lcg.next_u32(), second);
    }

    #[test]
    fn test_lcg_streams_are_reproducible() {
        let mut a = RandomSource::for_worker(RngKind::Lcg, 7, 3, Stream::Sampling);
        let mut b = RandomSource::for_worker(RngKind::Lcg, 7, 3, Stream::Sampling);
        for _ in 0..100 {
            assert_eq!(a.index_below(1000), b.index_below(1000));
        }
    }

    #[test]
    fn test_streams_differ_between_workers() {
        assert_ne!(
            derive_seed(42, 0, Stream::Sampling),
            derive_seed(42, 1, Stream::Sampling)
        );
        assert_ne!(
            derive_seed(42, 0, Stream::Sampling),
            derive_seed(42, 0, Stream::Exploration)
        );
    }

    #[test]
    fn test_draw_ranges() {
        for kind in [RngKind::Lcg, RngKind::Platform] {
            let mut source = RandomSource::for_worker(kind, 1, 0, Stream::Exploration);
            for _ in 0..1000 {
                let u = source.unit();
                assert!((0.0..1.0).contains(&u));
                assert!(source.index_below(5) < 5);
            }
        }
    }

    #[test]
    fn test_lcg_index_uses_every_value_on_alternate_draws() {
        // Every other draw: the pattern an exploring epsilon-greedy step produces
        for worker in 0..4 {
            let mut source = RandomSource::for_worker(RngKind::Lcg, 42, worker, Stream::Exploration);
            let mut counts = [0usize; 4];
            for _ in 0..4000 {
                source.unit();
                counts[source.index_below(4)] += 1;
            }
            for count in counts {
                assert!(count > 800 && count < 1200, "worker {} counts = {:?}", worker, counts);
            }
        }
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("LCG".parse::<RngKind>().unwrap(), RngKind::Lcg);
        assert_eq!("platform".parse::<RngKind>().unwrap(), RngKind::Platform);
        assert!("mersenne".parse::<RngKind>().is_err());
    }
}
