// qrace command-line front end
// Loads an experience trace, runs the worker pool, prints the learned tables.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use qrace::algorithms::UpdateKind;
use qrace::config::{OutputFormat, RunConfig};
use qrace::metrics::{check_numerical_issues, divergence_bound, TableStatistics};
use qrace::report::{write_json, write_text, RunReport};
use qrace::rng::RngKind;
use qrace::sampling::SamplingKind;
use qrace::table::{Consistency, MergeStrategy, TableMode};
use qrace::trace::load_experiences;

#[derive(Parser, Debug)]
#[command(name = "qrace")]
#[command(about = "Concurrent tabular Q-learning / SARSA benchmark over a fixed experience trace", version)]
struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Experience trace (whitespace-separated `state action reward next_state`)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Number of states in the value table
    #[arg(long)]
    states: Option<usize>,

    /// Number of actions in the value table
    #[arg(long)]
    actions: Option<usize>,

    /// Maximum number of records to load
    #[arg(long)]
    samples: Option<usize>,

    /// SEQUENTIAL, RANDOM or STRIDE
    #[arg(long)]
    sampling: Option<SamplingKind>,

    /// QLEARN or SARSA
    #[arg(long)]
    algorithm: Option<UpdateKind>,

    /// Number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Passes each worker makes over its range
    #[arg(short, long)]
    episodes: Option<usize>,

    #[arg(long)]
    alpha: Option<f64>,

    #[arg(long)]
    gamma: Option<f64>,

    #[arg(long)]
    epsilon: Option<f64>,

    /// Interleave width for STRIDE sampling
    #[arg(long)]
    stride: Option<usize>,

    /// Minimum samples per worker
    #[arg(long)]
    min_batch: Option<usize>,

    /// shared or replicated
    #[arg(long)]
    table_mode: Option<TableMode>,

    /// racy, locked or atomic (shared mode only)
    #[arg(long)]
    consistency: Option<Consistency>,

    /// none or average (replicated mode only)
    #[arg(long)]
    merge: Option<MergeStrategy>,

    /// lcg or platform
    #[arg(long)]
    rng: Option<RngKind>,

    #[arg(long)]
    seed: Option<u64>,

    /// Emit a JSON report instead of the text listing
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)
                .with_context(|| format!("reading configuration {}", path.display()))?,
            None => RunConfig::default(),
        };

        if let Some(data) = self.data {
            config.data_source = data;
        }
        config.num_states = self.states.unwrap_or(config.num_states);
        config.num_actions = self.actions.unwrap_or(config.num_actions);
        config.sampling_policy = self.sampling.unwrap_or(config.sampling_policy);
        config.update_rule = self.algorithm.unwrap_or(config.update_rule);
        config.worker_count = self.workers.unwrap_or(config.worker_count);
        config.episode_count = self.episodes.unwrap_or(config.episode_count);
        config.alpha = self.alpha.unwrap_or(config.alpha);
        config.gamma = self.gamma.unwrap_or(config.gamma);
        config.epsilon = self.epsilon.unwrap_or(config.epsilon);
        config.stride = self.stride.unwrap_or(config.stride);
        config.min_batch = self.min_batch.unwrap_or(config.min_batch);
        config.table_mode = self.table_mode.unwrap_or(config.table_mode);
        config.consistency = self.consistency.unwrap_or(config.consistency);
        config.merge = self.merge.unwrap_or(config.merge);
        config.rng = self.rng.unwrap_or(config.rng);
        config.seed = self.seed.unwrap_or(config.seed);
        if self.samples.is_some() {
            config.num_samples = self.samples;
        }
        if self.json {
            config.output = OutputFormat::Json;
        }
        Ok(config)
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = cli.into_config()?;
    let scheduler = config.scheduler().context("invalid configuration")?;

    let buffer = load_experiences(&config.data_source, config.num_samples)
        .with_context(|| format!("loading experiences from {}", config.data_source.display()))?;

    let outcome = scheduler.run(&buffer).context("scheduling failed")?;

    let bound = divergence_bound(buffer.max_abs_reward(), config.gamma);
    for (i, table) in outcome.tables.all().into_iter().enumerate() {
        let (has_issue, nan, inf) = check_numerical_issues(table.view());
        if has_issue {
            warn!(table = i, nan, inf, "table holds non-finite values");
        }
        let stats = TableStatistics::from_table(table);
        if !stats.within_bound(bound) {
            warn!(table = i, max_abs = stats.max_abs, bound, "table exceeds the discounted reward bound");
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match config.output {
        OutputFormat::Text => write_text(&mut out, &outcome)?,
        OutputFormat::Json => write_json(&mut out, &RunReport::new(&config, &outcome))?,
    }
    out.flush()?;
    Ok(())
}
