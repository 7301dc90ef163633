use crate::rng::RandomSource;
use crate::table::QValues;

/// Default exploration rate
pub const DEFAULT_EPSILON: f64 = 0.1;

/// Epsilon-greedy action selection over a value table
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpsilonGreedy {
    pub epsilon: f64,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f64) -> Self {
        EpsilonGreedy { epsilon }
    }

    /// With probability `epsilon` a uniformly random action, otherwise the
    /// greedy action for `state`. The random source is only consulted for the
    /// exploration coin and, when exploring, the action draw.
    pub fn select<T: QValues>(&self, table: &T, state: usize, rng: &mut RandomSource) -> usize {
        if rng.unit() < self.epsilon {
            rng.index_below(table.num_actions())
        } else {
            greedy_action(table, state)
        }
    }
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        EpsilonGreedy::new(DEFAULT_EPSILON)
    }
}

/// Highest-valued action for `state`; ties go to the lowest index
pub fn greedy_action<T: QValues>(table: &T, state: usize) -> usize {
    let mut best_action = 0;
    let mut best_value = table.value(state, 0);
    for action in 1..table.num_actions() {
        let value = table.value(state, action);
        if value > best_value {
            best_value = value;
            best_action = action;
        }
    }
    best_action
}
