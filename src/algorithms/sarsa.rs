use super::td_update;
use crate::experience::Transition;
use crate::policy::EpsilonGreedy;
use crate::rng::RandomSource;
use crate::table::QValues;

/// On-policy update of `Q(s, a)`, bootstrapping from `Q(s', a')` with `a'`
/// drawn from `policy` at `s'`
pub fn sarsa_update<T: QValues>(
    table: &mut T,
    transition: &Transition,
    alpha: f64,
    gamma: f64,
    policy: &EpsilonGreedy,
    rng: &mut RandomSource,
) {
    let next_action = policy.select(&*table, transition.next_state, rng);
    let next_q = table.value(transition.next_state, next_action);
    td_update(table, transition, alpha, gamma, next_q);
}
