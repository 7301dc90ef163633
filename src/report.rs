//! Rendering of run results.

use serde::Serialize;
use std::io::{self, Write};

use crate::config::RunConfig;
use crate::error::Result;
use crate::metrics::TableStatistics;
use crate::scheduler::{LearnedTables, RunOutcome, WorkerStats};
use crate::table::ValueTable;

/// Serializable summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub config: RunConfig,
    /// Scheduling phase only; loading is excluded
    pub elapsed_secs: f64,
    pub total_updates: u64,
    pub workers: Vec<WorkerStats>,
    pub tables: ReportTables,
    /// Statistics of the primary table
    pub statistics: Option<TableStatistics>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ReportTables {
    Shared {
        table: Vec<Vec<f64>>,
    },
    Replicated {
        workers: Vec<Vec<Vec<f64>>>,
        merged: Option<Vec<Vec<f64>>>,
    },
}

impl RunReport {
    pub fn new(config: &RunConfig, outcome: &RunOutcome) -> Self {
        let tables = match &outcome.tables {
            LearnedTables::Shared(table) => ReportTables::Shared {
                table: table.to_rows(),
            },
            LearnedTables::Replicated { workers, merged } => ReportTables::Replicated {
                workers: workers.iter().map(ValueTable::to_rows).collect(),
                merged: merged.as_ref().map(ValueTable::to_rows),
            },
        };

        RunReport {
            config: config.clone(),
            elapsed_secs: outcome.elapsed.as_secs_f64(),
            total_updates: outcome.total_updates(),
            workers: outcome.workers.clone(),
            tables,
            statistics: outcome.tables.primary().map(TableStatistics::from_table),
        }
    }
}

/// One `Q(s, a) = v` line per cell
pub fn write_table<W: Write>(out: &mut W, table: &ValueTable) -> io::Result<()> {
    let (num_states, num_actions) = table.dim();
    for state in 0..num_states {
        for action in 0..num_actions {
            writeln!(out, "Q({}, {}) = {:.6}", state, action, table.get(state, action))?;
        }
    }
    Ok(())
}

/// Plain-text listing of the learned table(s) followed by the timing line
pub fn write_text<W: Write>(out: &mut W, outcome: &RunOutcome) -> io::Result<()> {
    match &outcome.tables {
        LearnedTables::Shared(table) => {
            writeln!(out, "Learned Q-table:")?;
            write_table(out, table)?;
        }
        LearnedTables::Replicated { workers, merged } => {
            for (worker, table) in workers.iter().enumerate() {
                writeln!(out, "Q-table for worker {}:", worker)?;
                write_table(out, table)?;
                writeln!(out)?;
            }
            if let Some(table) = merged {
                writeln!(out, "Averaged Q-table:")?;
                write_table(out, table)?;
            }
        }
    }
    writeln!(
        out,
        "Total time taken for Q-learning updates: {:.6} seconds",
        outcome.elapsed.as_secs_f64()
    )
}

/// Pretty-printed JSON of a [`RunReport`]
pub fn write_json<W: Write>(out: &mut W, report: &RunReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
