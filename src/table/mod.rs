//! # Value Tables
//!
//! Dense `num_states x num_actions` tables of `f64` action values, zero
//! initialised, in the two ownership modes the engine supports:
//!
//! - **Shared**: one [`SharedValueTable`] referenced by every worker through a
//!   [`SharedHandle`]. How concurrent updates interact is chosen by
//!   [`Consistency`]; the default, `Racy`, applies no synchronisation at all.
//! - **Replicated**: every worker owns a private [`ValueTable`]. Tables are
//!   returned individually and, if asked, combined by a [`MergeStrategy`].
//!
//! Update rules are written once against the [`QValues`] trait and run
//! unchanged on either kind of table.

mod merge;
mod owned;
mod shared;

pub use merge::{merge_tables, MergeStrategy};
pub use owned::ValueTable;
pub use shared::{SharedHandle, SharedValueTable};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QraceError;

/// Read/modify access to a table of action values
pub trait QValues {
    fn num_states(&self) -> usize;

    fn num_actions(&self) -> usize;

    /// Current value of `Q(state, action)`
    fn value(&self, state: usize, action: usize) -> f64;

    /// Replace `Q(state, action)` with `f(Q(state, action))`.
    ///
    /// `f` may be evaluated more than once when the table retries the write.
    /// Tables that serialise whole updates only do so inside
    /// [`transaction`](QValues::transaction).
    fn update_cell<F: Fn(f64) -> f64>(&mut self, state: usize, action: usize, f: F);

    /// Run `f` as a single update step.
    ///
    /// Tables that serialise whole updates hold their lock for the duration
    /// of `f`; everything else just calls it.
    fn transaction<R, F: FnOnce(&mut Self) -> R>(&mut self, f: F) -> R
    where
        Self: Sized,
    {
        f(self)
    }
}

/// Whether workers share one table or each learn their own
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TableMode {
    #[default]
    Shared,
    Replicated,
}

impl FromStr for TableMode {
    type Err = QraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shared" => Ok(TableMode::Shared),
            "replicated" | "private" => Ok(TableMode::Replicated),
            _ => Err(QraceError::unknown_variant("table mode", s)),
        }
    }
}

impl TryFrom<String> for TableMode {
    type Error = QraceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for TableMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableMode::Shared => write!(f, "shared"),
            TableMode::Replicated => write!(f, "replicated"),
        }
    }
}

/// Synchronisation discipline for a shared table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Consistency {
    /// Relaxed load, compute, relaxed store. Concurrent updates to the same
    /// cell may overwrite each other.
    #[default]
    Racy,
    /// One table-wide mutex held across each whole update
    Locked,
    /// Compare-and-swap retry on the updated cell; the bootstrap read is
    /// still unsynchronised
    Atomic,
}

impl FromStr for Consistency {
    type Err = QraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "racy" | "none" | "unsynchronized" => Ok(Consistency::Racy),
            "locked" | "mutex" => Ok(Consistency::Locked),
            "atomic" | "cas" => Ok(Consistency::Atomic),
            _ => Err(QraceError::unknown_variant("consistency mode", s)),
        }
    }
}

impl TryFrom<String> for Consistency {
    type Error = QraceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consistency::Racy => write!(f, "racy"),
            Consistency::Locked => write!(f, "locked"),
            Consistency::Atomic => write!(f, "atomic"),
        }
    }
}
