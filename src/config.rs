//! Run configuration.
//!
//! A [`RunConfig`] can be read from a JSON file; every field has a default
//! except the data source and table dimensions. The binary layers its
//! command-line flags on top of whatever the file provides.

use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use std::fs;
use std::path::{Path, PathBuf};

use crate::algorithms::{LearningParams, UpdateKind, DEFAULT_ALPHA, DEFAULT_GAMMA};
use crate::builders::{SchedulerBuilder, DEFAULT_EPISODES, DEFAULT_MIN_BATCH, DEFAULT_WORKERS};
use crate::error::{QraceError, Result};
use crate::policy::DEFAULT_EPSILON;
use crate::rng::{RngKind, DEFAULT_SEED};
use crate::sampling::{SamplingKind, DEFAULT_STRIDE};
use crate::scheduler::Scheduler;
use crate::table::{Consistency, MergeStrategy, TableMode};

/// Result rendering format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Experience trace to load
    pub data_source: PathBuf,
    pub num_states: usize,
    pub num_actions: usize,
    /// Maximum number of records to load; `None` reads the whole source
    pub num_samples: Option<usize>,
    pub sampling_policy: SamplingKind,
    pub update_rule: UpdateKind,
    pub worker_count: usize,
    pub episode_count: usize,
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub stride: usize,
    pub min_batch: usize,
    pub table_mode: TableMode,
    pub consistency: Consistency,
    pub merge: MergeStrategy,
    pub rng: RngKind,
    pub seed: u64,
    pub output: OutputFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            data_source: PathBuf::new(),
            num_states: 0,
            num_actions: 0,
            num_samples: None,
            sampling_policy: SamplingKind::default(),
            update_rule: UpdateKind::default(),
            worker_count: DEFAULT_WORKERS,
            episode_count: DEFAULT_EPISODES,
            alpha: DEFAULT_ALPHA,
            gamma: DEFAULT_GAMMA,
            epsilon: DEFAULT_EPSILON,
            stride: DEFAULT_STRIDE,
            min_batch: DEFAULT_MIN_BATCH,
            table_mode: TableMode::default(),
            consistency: Consistency::default(),
            merge: MergeStrategy::default(),
            rng: RngKind::default(),
            seed: DEFAULT_SEED,
            output: OutputFormat::default(),
        }
    }
}

impl RunConfig {
    /// Read a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a JSON configuration. Strategy names are matched
    /// case-insensitively; an unknown name or a mistyped field is an
    /// [`QraceError::InvalidConfig`], malformed JSON a serialization error.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| match err.classify() {
            Category::Data => QraceError::InvalidConfig {
                line: err.line(),
                column: err.column(),
                reason: err.to_string(),
            },
            _ => QraceError::Serialization(err),
        })
    }

    pub fn params(&self) -> LearningParams {
        LearningParams::new(self.alpha, self.gamma, self.epsilon)
    }

    /// Check every field that does not depend on the loaded data
    pub fn validate(&self) -> Result<()> {
        if self.data_source.as_os_str().is_empty() {
            return Err(QraceError::invalid_parameter(
                "data_source",
                "no experience source given",
            ));
        }
        if self.num_samples == Some(0) {
            return Err(QraceError::invalid_parameter(
                "num_samples",
                "must be greater than 0",
            ));
        }
        self.scheduler_builder().build().map(|_| ())
    }

    pub fn scheduler_builder(&self) -> SchedulerBuilder {
        SchedulerBuilder::new()
            .dimensions(self.num_states, self.num_actions)
            .workers(self.worker_count)
            .episodes(self.episode_count)
            .min_batch(self.min_batch)
            .sampling(self.sampling_policy)
            .stride(self.stride)
            .update_rule(self.update_rule)
            .params(self.params())
            .table_mode(self.table_mode)
            .consistency(self.consistency)
            .merge(self.merge)
            .rng(self.rng)
            .seed(self.seed)
    }

    /// Validate and build the worker pool this configuration describes
    pub fn scheduler(&self) -> Result<Scheduler> {
        self.validate()?;
        self.scheduler_builder().build()
    }
}
