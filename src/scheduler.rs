//! Worker pool driving the update loop.
//!
//! One OS thread per partition range, all spawned before any is joined. Each
//! worker runs `episodes` passes over its range in the order given by the
//! sampling policy and applies the update rule to every visited transition.
//! The caller blocks until every worker has finished; there is no timeout and
//! no early cancellation.

use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, debug_span, info, warn};

use crate::algorithms::UpdateRule;
use crate::error::{QraceError, Result};
use crate::experience::ExperienceBuffer;
use crate::partition::{PartitionPlan, PartitionRange};
use crate::rng::{RandomSource, RngKind, Stream};
use crate::sampling::SamplingPolicy;
use crate::table::{
    merge_tables, Consistency, MergeStrategy, QValues, SharedValueTable, TableMode, ValueTable,
};

/// Per-worker bookkeeping returned after a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub worker: usize,
    pub range: PartitionRange,
    /// Transitions applied, always `episodes * range.len()`
    pub updates: u64,
}

/// Tables produced by a run
#[derive(Clone, Debug)]
pub enum LearnedTables {
    /// The single table every worker wrote to
    Shared(ValueTable),
    /// One table per worker, plus the merged table when a merge was requested
    Replicated {
        workers: Vec<ValueTable>,
        merged: Option<ValueTable>,
    },
}

impl LearnedTables {
    /// The table a caller would normally inspect: the shared table, the
    /// merged table, or failing both the first worker's table.
    pub fn primary(&self) -> Option<&ValueTable> {
        match self {
            LearnedTables::Shared(table) => Some(table),
            LearnedTables::Replicated { workers, merged } => merged.as_ref().or(workers.first()),
        }
    }

    /// Every table held, in worker order (merged table last)
    pub fn all(&self) -> Vec<&ValueTable> {
        match self {
            LearnedTables::Shared(table) => vec![table],
            LearnedTables::Replicated { workers, merged } => {
                workers.iter().chain(merged.iter()).collect()
            }
        }
    }
}

/// Result of [`Scheduler::run`]
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub tables: LearnedTables,
    pub workers: Vec<WorkerStats>,
    /// Wall-clock time from first spawn to last join
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn total_updates(&self) -> u64 {
        self.workers.iter().map(|w| w.updates).sum()
    }
}

/// Fully configured worker pool. Build one with
/// [`SchedulerBuilder`](crate::builders::SchedulerBuilder).
#[derive(Clone, Debug)]
pub struct Scheduler {
    pub(crate) num_states: usize,
    pub(crate) num_actions: usize,
    pub(crate) worker_count: usize,
    pub(crate) episodes: usize,
    pub(crate) min_batch: usize,
    pub(crate) sampling: SamplingPolicy,
    pub(crate) rule: UpdateRule,
    pub(crate) table_mode: TableMode,
    pub(crate) consistency: Consistency,
    pub(crate) merge: MergeStrategy,
    pub(crate) rng: RngKind,
    pub(crate) seed: u64,
}

impl Scheduler {
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn episodes(&self) -> usize {
        self.episodes
    }

    pub fn sampling(&self) -> SamplingPolicy {
        self.sampling
    }

    pub fn rule(&self) -> UpdateRule {
        self.rule
    }

    pub fn table_mode(&self) -> TableMode {
        self.table_mode
    }

    /// Partition `buffer` for this pool
    pub fn plan(&self, buffer: &ExperienceBuffer) -> Result<PartitionPlan> {
        PartitionPlan::new(buffer.len(), self.worker_count, self.min_batch)
    }

    /// Run every worker to completion on freshly zeroed tables
    pub fn run(&self, buffer: &ExperienceBuffer) -> Result<RunOutcome> {
        buffer.validate(self.num_states, self.num_actions)?;
        let plan = self.plan(buffer)?;

        info!(
            workers = plan.worker_count(),
            samples = plan.covered(),
            episodes = self.episodes,
            sampling = %self.sampling,
            rule = %self.rule.kind(),
            mode = %self.table_mode,
            consistency = %self.consistency,
            "starting workers"
        );

        let start = Instant::now();
        let (tables, workers) = match self.table_mode {
            TableMode::Shared => {
                let table =
                    SharedValueTable::new(self.num_states, self.num_actions, self.consistency);
                let workers = self.drive_shared(&table, buffer, &plan)?;
                (LearnedTables::Shared(table.snapshot()), workers)
            }
            TableMode::Replicated => {
                let results = self.spawn_all(&plan, |worker, range| {
                    let mut table = ValueTable::new(self.num_states, self.num_actions);
                    let stats = self.drive(&mut table, buffer, worker, range);
                    (stats, table)
                })?;
                let (workers, tables): (Vec<_>, Vec<_>) = results.into_iter().unzip();
                let merged = merge_tables(&tables, self.merge);
                (
                    LearnedTables::Replicated {
                        workers: tables,
                        merged,
                    },
                    workers,
                )
            }
        };
        let elapsed = start.elapsed();

        info!(
            elapsed_secs = elapsed.as_secs_f64(),
            updates = workers.iter().map(|w| w.updates).sum::<u64>(),
            "all workers joined"
        );

        Ok(RunOutcome {
            tables,
            workers,
            elapsed,
        })
    }

    /// Run every worker against a caller-owned shared table.
    ///
    /// The table is not reset first, so repeated calls keep learning into
    /// the same table. Its own consistency mode applies, not the one this
    /// scheduler was built with.
    pub fn run_on_shared(
        &self,
        table: &SharedValueTable,
        buffer: &ExperienceBuffer,
    ) -> Result<Vec<WorkerStats>> {
        buffer.validate(self.num_states, self.num_actions)?;
        let plan = self.plan(buffer)?;
        self.drive_shared(table, buffer, &plan)
    }

    fn drive_shared(
        &self,
        table: &SharedValueTable,
        buffer: &ExperienceBuffer,
        plan: &PartitionPlan,
    ) -> Result<Vec<WorkerStats>> {
        self.spawn_all(plan, |worker, range| {
            let mut handle = table.handle();
            self.drive(&mut handle, buffer, worker, range)
        })
    }

    /// Spawn one named thread per range, then join them all in order.
    ///
    /// A panicking worker does not stop the others; the first failure is
    /// reported once everyone has been joined.
    fn spawn_all<R, F>(&self, plan: &PartitionPlan, body: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(usize, PartitionRange) -> R + Sync,
    {
        let body = &body;
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(plan.worker_count());
            for (worker, &range) in plan.ranges().iter().enumerate() {
                let handle = thread::Builder::new()
                    .name(format!("qrace-worker-{}", worker))
                    .spawn_scoped(scope, move || body(worker, range))?;
                handles.push(handle);
            }

            let mut results = Vec::with_capacity(handles.len());
            let mut failed = None;
            for (worker, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(result) => results.push(result),
                    Err(_) => {
                        warn!(worker, "worker panicked");
                        failed.get_or_insert(worker);
                    }
                }
            }

            match failed {
                Some(worker) => Err(QraceError::WorkerPanicked { worker }),
                None => Ok(results),
            }
        })
    }

    /// The body of one worker: `episodes` passes over `range`
    fn drive<T: QValues>(
        &self,
        table: &mut T,
        buffer: &ExperienceBuffer,
        worker: usize,
        range: PartitionRange,
    ) -> WorkerStats {
        let _span = debug_span!("worker", worker).entered();
        let mut sampling_rng = RandomSource::for_worker(self.rng, self.seed, worker, Stream::Sampling);
        let mut exploration_rng =
            RandomSource::for_worker(self.rng, self.seed, worker, Stream::Exploration);

        let mut updates = 0u64;
        for index in self.sampling.visits(range, self.episodes, &mut sampling_rng) {
            self.rule.apply(table, &buffer[index], &mut exploration_rng);
            updates += 1;
        }

        debug!(start = range.start, end = range.end, updates, "worker finished");
        WorkerStats {
            worker,
            range,
            updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::SchedulerBuilder;

    #[test]
    fn test_worker_panic_is_reported_after_join() {
        let scheduler = SchedulerBuilder::new()
            .dimensions(4, 2)
            .workers(3)
            .min_batch(1)
            .build()
            .unwrap();
        let plan = PartitionPlan::new(30, 3, 1).unwrap();

        let result = scheduler.spawn_all(&plan, |worker, range| {
            if worker == 1 {
                panic!("worker {} failed", worker);
            }
            range.len()
        });

        assert!(matches!(result, Err(QraceError::WorkerPanicked { worker: 1 })));
    }

    #[test]
    fn test_results_come_back_in_worker_order() {
        let scheduler = SchedulerBuilder::new()
            .dimensions(4, 2)
            .workers(4)
            .build()
            .unwrap();
        let plan = PartitionPlan::new(40, 4, 1).unwrap();

        let names = scheduler
            .spawn_all(&plan, |worker, _| {
                (worker, thread::current().name().map(str::to_string))
            })
            .unwrap();

        for (i, (worker, name)) in names.into_iter().enumerate() {
            assert_eq!(worker, i);
            assert_eq!(name.as_deref(), Some(format!("qrace-worker-{}", i).as_str()));
        }
    }
}
