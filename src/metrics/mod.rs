pub mod statistics;

pub use statistics::{check_numerical_issues, divergence_bound, linf_norm, TableStatistics};
