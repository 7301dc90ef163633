use crate::algorithms::{LearningParams, UpdateKind, UpdateRule};
use crate::error::{QraceError, Result};
use crate::rng::{RngKind, DEFAULT_SEED};
use crate::sampling::{SamplingKind, SamplingPolicy, DEFAULT_STRIDE};
use crate::scheduler::Scheduler;
use crate::table::{Consistency, MergeStrategy, TableMode};

/// Default number of worker threads
pub const DEFAULT_WORKERS: usize = 16;

/// Default number of passes each worker makes over its range
pub const DEFAULT_EPISODES: usize = 2000;

/// Default minimum number of samples per worker
pub const DEFAULT_MIN_BATCH: usize = 500;

/// Builder for [`Scheduler`]
#[derive(Clone, Debug)]
pub struct SchedulerBuilder {
    num_states: Option<usize>,
    num_actions: Option<usize>,
    worker_count: usize,
    episodes: usize,
    min_batch: usize,
    sampling: SamplingKind,
    stride: usize,
    update: UpdateKind,
    params: LearningParams,
    table_mode: TableMode,
    consistency: Consistency,
    merge: MergeStrategy,
    rng: RngKind,
    seed: u64,
}

impl SchedulerBuilder {
    /// Create a new scheduler builder with the default run settings
    pub fn new() -> Self {
        SchedulerBuilder {
            num_states: None,
            num_actions: None,
            worker_count: DEFAULT_WORKERS,
            episodes: DEFAULT_EPISODES,
            min_batch: DEFAULT_MIN_BATCH,
            sampling: SamplingKind::default(),
            stride: DEFAULT_STRIDE,
            update: UpdateKind::default(),
            params: LearningParams::default(),
            table_mode: TableMode::default(),
            consistency: Consistency::default(),
            merge: MergeStrategy::default(),
            rng: RngKind::default(),
            seed: DEFAULT_SEED,
        }
    }

    /// Set the table dimensions
    pub fn dimensions(mut self, num_states: usize, num_actions: usize) -> Self {
        self.num_states = Some(num_states);
        self.num_actions = Some(num_actions);
        self
    }

    pub fn workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    /// Minimum samples per worker; smaller datasets are rejected
    pub fn min_batch(mut self, min_batch: usize) -> Self {
        self.min_batch = min_batch;
        self
    }

    pub fn sampling(mut self, sampling: SamplingKind) -> Self {
        self.sampling = sampling;
        self
    }

    /// Interleave width for strided sampling
    pub fn stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn update_rule(mut self, update: UpdateKind) -> Self {
        self.update = update;
        self
    }

    pub fn params(mut self, params: LearningParams) -> Self {
        self.params = params;
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.params.alpha = alpha;
        self
    }

    pub fn gamma(mut self, gamma: f64) -> Self {
        self.params.gamma = gamma;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.params.epsilon = epsilon;
        self
    }

    /// One shared table with the given consistency
    pub fn shared(mut self, consistency: Consistency) -> Self {
        self.table_mode = TableMode::Shared;
        self.consistency = consistency;
        self
    }

    /// One private table per worker, combined afterwards by `merge`
    pub fn replicated(mut self, merge: MergeStrategy) -> Self {
        self.table_mode = TableMode::Replicated;
        self.merge = merge;
        self
    }

    pub fn table_mode(mut self, table_mode: TableMode) -> Self {
        self.table_mode = table_mode;
        self
    }

    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn merge(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }

    pub fn rng(mut self, rng: RngKind) -> Self {
        self.rng = rng;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the scheduler
    pub fn build(self) -> Result<Scheduler> {
        let num_states = self.num_states.ok_or_else(|| {
            QraceError::invalid_parameter("num_states", "Table dimensions not specified")
        })?;
        let num_actions = self.num_actions.ok_or_else(|| {
            QraceError::invalid_parameter("num_actions", "Table dimensions not specified")
        })?;

        let positive = [
            ("num_states", num_states),
            ("num_actions", num_actions),
            ("worker_count", self.worker_count),
            ("episode_count", self.episodes),
            ("stride", self.stride),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(QraceError::invalid_parameter(name, "must be greater than 0"));
            }
        }
        self.params.validate()?;

        Ok(Scheduler {
            num_states,
            num_actions,
            worker_count: self.worker_count,
            episodes: self.episodes,
            min_batch: self.min_batch,
            sampling: SamplingPolicy::from_kind(self.sampling, self.stride),
            rule: UpdateRule::new(self.update, self.params),
            table_mode: self.table_mode,
            consistency: self.consistency,
            merge: self.merge,
            rng: self.rng,
            seed: self.seed,
        })
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let scheduler = SchedulerBuilder::new().dimensions(16, 4).build().unwrap();
        assert_eq!(scheduler.worker_count(), 16);
        assert_eq!(scheduler.episodes(), 2000);
        assert_eq!(scheduler.sampling(), SamplingPolicy::Sequential);
        assert_eq!(scheduler.rule().kind(), UpdateKind::QLearn);
        assert_eq!(scheduler.table_mode(), TableMode::Shared);
    }

    #[test]
    fn test_strided_sampling_carries_stride() {
        let scheduler = SchedulerBuilder::new()
            .dimensions(16, 4)
            .sampling(SamplingKind::Stride)
            .stride(8)
            .build()
            .unwrap();
        assert_eq!(scheduler.sampling(), SamplingPolicy::Strided { stride: 8 });
    }

    #[test]
    fn test_builder_errors() {
        // No dimensions
        assert!(SchedulerBuilder::new().build().is_err());

        // Zero workers / episodes
        assert!(SchedulerBuilder::new().dimensions(4, 2).workers(0).build().is_err());
        assert!(SchedulerBuilder::new().dimensions(4, 2).episodes(0).build().is_err());

        // Out-of-range hyperparameters
        assert!(SchedulerBuilder::new().dimensions(4, 2).gamma(1.0).build().is_err());
        assert!(SchedulerBuilder::new().dimensions(4, 2).alpha(0.0).build().is_err());
        assert!(SchedulerBuilder::new().dimensions(4, 2).epsilon(1.5).build().is_err());
    }
}
