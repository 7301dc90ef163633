//! # Tabular TD Update Rules
//!
//! Both rules move one cell `Q(s, a)` toward a bootstrap target:
//!
//! ```text
//! Q(s, a) <- Q(s, a) + alpha * (r + gamma * bootstrap - Q(s, a))
//! ```
//!
//! - **Q-learning** (off-policy): `bootstrap = max(0, max_a' Q(s', a'))`. The
//!   running maximum starts at `0.0`, so an all-negative next row bootstraps
//!   from zero rather than from its largest entry.
//! - **SARSA** (on-policy): `bootstrap = Q(s', a')` where `a'` is chosen at
//!   `s'` by an epsilon-greedy policy drawing from the worker's own random
//!   stream.
//!
//! A rule touches exactly one table cell per transition and performs no IO.
//! The rule is picked once per run; workers dispatch on the enum.

mod q_learning;
mod sarsa;

pub use q_learning::{max_bootstrap, q_learning_update};
pub use sarsa::sarsa_update;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{QraceError, Result};
use crate::experience::Transition;
use crate::policy::{EpsilonGreedy, DEFAULT_EPSILON};
use crate::rng::RandomSource;
use crate::table::QValues;

/// Default learning rate
pub const DEFAULT_ALPHA: f64 = 0.1;

/// Default discount factor
pub const DEFAULT_GAMMA: f64 = 0.95;

/// Update rule names as accepted in configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum UpdateKind {
    #[default]
    #[serde(rename = "QLEARN")]
    QLearn,
    #[serde(rename = "SARSA")]
    Sarsa,
}

impl FromStr for UpdateKind {
    type Err = QraceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "QLEARN" | "Q-LEARNING" | "QLEARNING" => Ok(UpdateKind::QLearn),
            "SARSA" => Ok(UpdateKind::Sarsa),
            _ => Err(QraceError::unknown_variant("update rule", s)),
        }
    }
}

impl TryFrom<String> for UpdateKind {
    type Error = QraceError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateKind::QLearn => write!(f, "QLEARN"),
            UpdateKind::Sarsa => write!(f, "SARSA"),
        }
    }
}

/// Hyperparameters shared by both update rules
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Exploration rate (SARSA only)
    pub epsilon: f64,
}

impl LearningParams {
    pub fn new(alpha: f64, gamma: f64, epsilon: f64) -> Self {
        LearningParams { alpha, gamma, epsilon }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(QraceError::invalid_parameter(
                "alpha",
                "must be in (0, 1]",
            ));
        }
        if !(self.gamma >= 0.0 && self.gamma < 1.0) {
            return Err(QraceError::invalid_parameter(
                "gamma",
                "must be in [0, 1)",
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(QraceError::invalid_parameter(
                "epsilon",
                "must be in [0, 1]",
            ));
        }
        Ok(())
    }
}

impl Default for LearningParams {
    fn default() -> Self {
        LearningParams::new(DEFAULT_ALPHA, DEFAULT_GAMMA, DEFAULT_EPSILON)
    }
}

/// Update rule selected for a run
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UpdateRule {
    QLearning {
        alpha: f64,
        gamma: f64,
    },
    Sarsa {
        alpha: f64,
        gamma: f64,
        policy: EpsilonGreedy,
    },
}

impl UpdateRule {
    pub fn new(kind: UpdateKind, params: LearningParams) -> Self {
        match kind {
            UpdateKind::QLearn => UpdateRule::QLearning {
                alpha: params.alpha,
                gamma: params.gamma,
            },
            UpdateKind::Sarsa => UpdateRule::Sarsa {
                alpha: params.alpha,
                gamma: params.gamma,
                policy: EpsilonGreedy::new(params.epsilon),
            },
        }
    }

    pub fn kind(&self) -> UpdateKind {
        match self {
            UpdateRule::QLearning { .. } => UpdateKind::QLearn,
            UpdateRule::Sarsa { .. } => UpdateKind::Sarsa,
        }
    }

    /// Apply the rule for one transition as a single table transaction.
    ///
    /// `rng` is the worker's exploration stream; Q-learning never draws
    /// from it.
    pub fn apply<T: QValues>(&self, table: &mut T, transition: &Transition, rng: &mut RandomSource) {
        match *self {
            UpdateRule::QLearning { alpha, gamma } => {
                table.transaction(|t| q_learning_update(t, transition, alpha, gamma))
            }
            UpdateRule::Sarsa { alpha, gamma, policy } => {
                table.transaction(|t| sarsa_update(t, transition, alpha, gamma, &policy, rng))
            }
        }
    }
}

/// `Q(s, a) += alpha * (r + gamma * bootstrap - Q(s, a))`
pub(crate) fn td_update<T: QValues>(
    table: &mut T,
    transition: &Transition,
    alpha: f64,
    gamma: f64,
    bootstrap: f64,
) {
    let target = transition.reward + gamma * bootstrap;
    table.update_cell(transition.state, transition.action, |q| {
        q + alpha * (target - q)
    });
}
