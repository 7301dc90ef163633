use super::td_update;
use crate::experience::Transition;
use crate::table::QValues;

/// `max(0, max_a Q(state, a))`: the running maximum starts at zero, not at
/// negative infinity.
pub fn max_bootstrap<T: QValues>(table: &T, state: usize) -> f64 {
    let mut max_q = 0.0;
    for action in 0..table.num_actions() {
        let q = table.value(state, action);
        if q > max_q {
            max_q = q;
        }
    }
    max_q
}

/// Off-policy update of `Q(s, a)` from one transition
pub fn q_learning_update<T: QValues>(table: &mut T, transition: &Transition, alpha: f64, gamma: f64) {
    let max_next_q = max_bootstrap(&*table, transition.next_state);
    td_update(table, transition, alpha, gamma, max_next_q);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ValueTable;

    #[test]
    fn test_bootstrap_floor_at_zero() {
        let mut table = ValueTable::new(2, 3);
        table.set(1, 0, -0.5);
        table.set(1, 1, -0.1);
        table.set(1, 2, -2.0);
        assert_eq!(max_bootstrap(&table, 1), 0.0);

        table.set(1, 2, 0.3);
        assert_eq!(max_bootstrap(&table, 1), 0.3);
    }

    #[test]
    fn test_single_update() {
        let mut table = ValueTable::new(2, 2);
        table.set(1, 1, 2.0);
        let t = Transition::new(0, 1, 1.0, 1);

        q_learning_update(&mut table, &t, 0.1, 0.95);

        // 0 + 0.1 * (1 + 0.95 * 2 - 0) = 0.29
        assert!((table.get(0, 1) - 0.29).abs() < 1e-12);
    }

    #[test]
    fn test_negative_next_row_ignored() {
        let mut table = ValueTable::new(2, 2);
        table.set(1, 0, -10.0);
        table.set(1, 1, -20.0);
        let t = Transition::new(0, 0, -1.0, 1);

        q_learning_update(&mut table, &t, 0.5, 0.9);

        // bootstrap stays at 0: 0 + 0.5 * (-1 + 0 - 0)
        assert_eq!(table.get(0, 0), -0.5);
    }
}
