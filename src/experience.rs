use serde::{Deserialize, Serialize};
use std::ops::Index;
use std::sync::Arc;

use crate::error::{QraceError, Result};
use crate::partition::PartitionRange;

/// One recorded `(state, action, reward, next_state)` tuple
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: usize,
    pub action: usize,
    pub reward: f64,
    pub next_state: usize,
}

impl Transition {
    pub fn new(state: usize, action: usize, reward: f64, next_state: usize) -> Self {
        Transition {
            state,
            action,
            reward,
            next_state,
        }
    }
}

/// Immutable, pre-loaded sequence of transitions.
///
/// Cloning is cheap; every clone shares the same backing storage, so the
/// buffer can be handed to any number of worker threads without copying.
#[derive(Clone, Debug)]
pub struct ExperienceBuffer {
    transitions: Arc<[Transition]>,
}

impl ExperienceBuffer {
    pub fn new(transitions: Vec<Transition>) -> Self {
        ExperienceBuffer {
            transitions: transitions.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Transition> {
        self.transitions.get(index)
    }

    pub fn as_slice(&self) -> &[Transition] {
        &self.transitions
    }

    /// Slice of the buffer covered by one worker's range
    pub fn range(&self, range: PartitionRange) -> &[Transition] {
        if range.is_empty() {
            return &[];
        }
        &self.transitions[range.start..range.end]
    }

    /// Largest absolute reward in the buffer (0.0 when empty)
    pub fn max_abs_reward(&self) -> f64 {
        self.transitions
            .iter()
            .fold(0.0_f64, |max, t| max.max(t.reward.abs()))
    }

    /// Check every transition against the table dimensions.
    ///
    /// Workers index the value table directly with the recorded state and
    /// action, so an out-of-range record is rejected here, before any thread
    /// is spawned, instead of failing mid-run.
    pub fn validate(&self, num_states: usize, num_actions: usize) -> Result<()> {
        for (index, t) in self.transitions.iter().enumerate() {
            let checks = [
                ("state", t.state, num_states),
                ("next_state", t.next_state, num_states),
                ("action", t.action, num_actions),
            ];
            for (field, value, limit) in checks {
                if value >= limit {
                    return Err(QraceError::OutOfBounds {
                        index,
                        field,
                        value,
                        limit,
                    });
                }
            }
            if !t.reward.is_finite() {
                return Err(QraceError::invalid_parameter(
                    format!("transitions[{}].reward", index),
                    "reward must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Index<usize> for ExperienceBuffer {
    type Output = Transition;

    fn index(&self, index: usize) -> &Transition {
        &self.transitions[index]
    }
}

impl From<Vec<Transition>> for ExperienceBuffer {
    fn from(transitions: Vec<Transition>) -> Self {
        ExperienceBuffer::new(transitions)
    }
}

impl FromIterator<Transition> for ExperienceBuffer {
    fn from_iter<I: IntoIterator<Item = Transition>>(iter: I) -> Self {
        ExperienceBuffer::new(iter.into_iter().collect())
    }
}
