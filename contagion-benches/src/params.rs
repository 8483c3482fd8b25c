//! Benchmark parameter types.
//!
//! Display impls produce the Criterion parameter labels.

use std::fmt;

/// Parameters for a rollout benchmark run.
#[derive(Clone, Debug)]
pub struct RolloutBenchParams {
    /// Number of nodes in the graph.
    pub node_count: usize,
    /// Independent trials per run.
    pub trials: usize,
}

impl fmt::Display for RolloutBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},k={}", self.node_count, self.trials)
    }
}

/// Parameters for a greedy selection benchmark run.
#[derive(Clone, Debug)]
pub struct GreedyBenchParams {
    /// Number of nodes in the graph.
    pub node_count: usize,
    /// Vaccination budget.
    pub budget: usize,
    /// Short label of the estimator.
    pub estimator: &'static str,
}

impl fmt::Display for GreedyBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={},b={},{}",
            self.node_count, self.budget, self.estimator
        )
    }
}
