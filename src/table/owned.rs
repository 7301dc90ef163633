use ndarray::{Array2, ArrayView1, ArrayView2};

use super::QValues;

/// Value table exclusively owned by one worker (or by the caller after a run)
#[derive(Clone, Debug, PartialEq)]
pub struct ValueTable {
    values: Array2<f64>,
}

impl ValueTable {
    /// Zero-initialised table
    pub fn new(num_states: usize, num_actions: usize) -> Self {
        ValueTable {
            values: Array2::zeros((num_states, num_actions)),
        }
    }

    pub fn from_array(values: Array2<f64>) -> Self {
        ValueTable { values }
    }

    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.values[[state, action]]
    }

    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        self.values[[state, action]] = value;
    }

    /// Action values of one state
    pub fn row(&self, state: usize) -> ArrayView1<'_, f64> {
        self.values.row(state)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn into_array(self) -> Array2<f64> {
        self.values
    }

    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Row-major nested vectors, one per state
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.outer_iter().map(|row| row.to_vec()).collect()
    }

    /// Largest absolute difference to another table of the same shape
    pub fn max_abs_diff(&self, other: &ValueTable) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .fold(0.0_f64, |max, (a, b)| max.max((a - b).abs()))
    }
}

impl QValues for ValueTable {
    fn num_states(&self) -> usize {
        self.values.nrows()
    }

    fn num_actions(&self) -> usize {
        self.values.ncols()
    }

    fn value(&self, state: usize, action: usize) -> f64 {
        self.values[[state, action]]
    }

    fn update_cell<F: Fn(f64) -> f64>(&mut self, state: usize, action: usize, f: F) {
        let cell = &mut self.values[[state, action]];
        *cell = f(*cell);
    }
}
