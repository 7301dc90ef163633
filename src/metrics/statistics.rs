use ndarray::ArrayView2;
use serde::Serialize;

use crate::table::ValueTable;

/// Summary of the values held in a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStatistics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Largest absolute value
    pub max_abs: f64,
    /// Cells that moved away from their initial zero
    pub nonzero: usize,
    pub count: usize,
}

impl TableStatistics {
    /// Compute statistics over every cell of `values`
    pub fn from_array(values: ArrayView2<'_, f64>) -> Self {
        let count = values.len();
        if count == 0 {
            return TableStatistics {
                mean: 0.0,
                std: 0.0,
                min: 0.0,
                max: 0.0,
                max_abs: 0.0,
                nonzero: 0,
                count: 0,
            };
        }

        let mean = values.sum() / count as f64;
        let variance = values
            .iter()
            .map(|&x| (x - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        TableStatistics {
            mean,
            std: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            max_abs: linf_norm(values),
            nonzero: values.iter().filter(|&&x| x != 0.0).count(),
            count,
        }
    }

    pub fn from_table(table: &ValueTable) -> Self {
        Self::from_array(table.view())
    }

    /// Whether every value lies within `[-bound, bound]`
    pub fn within_bound(&self, bound: f64) -> bool {
        self.max_abs <= bound
    }
}

/// Largest magnitude a discounted value can reach with rewards bounded by
/// `r_max`: `r_max / (1 - gamma)`
pub fn divergence_bound(r_max: f64, gamma: f64) -> f64 {
    r_max.abs() / (1.0 - gamma)
}

/// Count NaN and infinite cells: `(has_issue, nan_count, inf_count)`
pub fn check_numerical_issues(values: ArrayView2<'_, f64>) -> (bool, usize, usize) {
    let nan_count = values.iter().filter(|v| v.is_nan()).count();
    let inf_count = values.iter().filter(|v| v.is_infinite()).count();
    (nan_count + inf_count > 0, nan_count, inf_count)
}

/// Compute the L-infinity norm of a matrix
pub fn linf_norm(values: ArrayView2<'_, f64>) -> f64 {
    values.iter().map(|&x| x.abs()).fold(0.0f64, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_table_statistics() {
        let values = array![[0.0, 1.0], [-3.0, 2.0]];
        let stats = TableStatistics::from_array(values.view());

        assert_eq!(stats.count, 4);
        assert_eq!(stats.nonzero, 3);
        assert_eq!(stats.min, -3.0);
        assert_eq!(stats.max, 2.0);
        assert_eq!(stats.max_abs, 3.0);
        assert_eq!(stats.mean, 0.0);
        assert!(stats.within_bound(3.0));
        assert!(!stats.within_bound(2.5));
    }

    #[test]
    fn test_divergence_bound() {
        assert!((divergence_bound(1.0, 0.95) - 20.0).abs() < 1e-9);
        assert_eq!(divergence_bound(-2.0, 0.5), 4.0);
    }

    #[test]
    fn test_numerical_issues() {
        let values = array![[f64::NAN, 1.0], [f64::INFINITY, 0.0]];
        assert_eq!(check_numerical_issues(values.view()), (true, 1, 1));
        let clean = array![[0.0, 1.0]];
        assert_eq!(check_numerical_issues(clean.view()), (false, 0, 0));
    }
}
