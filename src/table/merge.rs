use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValueTable;
use crate::error::QraceError;

/// How per-worker tables are combined after a replicated run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum MergeStrategy {
    /// Keep each worker's table as learned
    #[default]
    None,
    /// Element-wise mean over all workers
    Average,
}

impl FromStr for MergeStrategy {
    type Err = QraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(MergeStrategy::None),
            "average" | "mean" => Ok(MergeStrategy::Average),
            _ => Err(QraceError::unknown_variant("merge strategy", s)),
        }
    }
}

impl TryFrom<String> for MergeStrategy {
    type Error = QraceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::None => write!(f, "none"),
            MergeStrategy::Average => write!(f, "average"),
        }
    }
}

/// Combine per-worker tables. Returns `None` for [`MergeStrategy::None`] or
/// when there is nothing to merge.
pub fn merge_tables(tables: &[ValueTable], strategy: MergeStrategy) -> Option<ValueTable> {
    match strategy {
        MergeStrategy::None => None,
        MergeStrategy::Average => {
            let first = tables.first()?;
            let mut sum = Array2::<f64>::zeros(first.dim());
            for table in tables {
                Zip::from(&mut sum)
                    .and(table.view())
                    .par_for_each(|acc, &value| *acc += value);
            }
            let count = tables.len() as f64;
            sum.mapv_inplace(|v| v / count);
            Some(ValueTable::from_array(sum))
        }
    }
}
