//! Seeded graph fixtures.

use contagion_core::{Graph, NodeId, SeedStrategy, choose_seeds};
use contagion_providers_synthetic::barabasi_albert;
use rand::{SeedableRng, rngs::SmallRng};

use crate::error::BenchSetupError;

/// Preferential-attachment edges per new node.
pub const ATTACHMENT: usize = 3;

/// A graph together with the seeds chosen for it.
#[derive(Clone, Debug)]
pub struct SeededGraph {
    /// Graph with every node susceptible.
    pub graph: Graph,
    /// Initially infected nodes.
    pub seeds: Vec<NodeId>,
}

impl SeededGraph {
    /// A copy of the graph with the seeds infected.
    ///
    /// # Errors
    /// Returns [`BenchSetupError::Graph`] if a seed is out of range.
    pub fn infected(&self) -> Result<Graph, BenchSetupError> {
        let mut graph = self.graph.clone();
        graph.apply_infection(&self.seeds)?;
        Ok(graph)
    }
}

/// Builds a Barabási–Albert graph on `node_count` nodes and picks
/// `infected` random seeds, all from `seed`.
///
/// # Errors
/// Returns [`BenchSetupError`] when the generator rejects the size or
/// `infected` exceeds the node count.
pub fn seeded_barabasi_albert(
    node_count: usize,
    infected: usize,
    seed: u64,
) -> Result<SeededGraph, BenchSetupError> {
    let graph = barabasi_albert(node_count, ATTACHMENT, seed)?;
    let mut rng = SmallRng::seed_from_u64(seed);
    let seeds = choose_seeds(&graph, infected, SeedStrategy::Random, &mut rng)?;
    Ok(SeededGraph { graph, seeds })
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    fn fixtures_are_reproducible() -> Result<(), BenchSetupError> {
        let first = seeded_barabasi_albert(50, 4, 7)?;
        let second = seeded_barabasi_albert(50, 4, 7)?;
        assert_eq!(first.seeds, second.seeds);
        assert_eq!(first.infected()?.counts().infected, 4);
        Ok(())
    }

    #[rstest]
    fn oversized_seed_sets_fail() {
        assert!(matches!(
            seeded_barabasi_albert(10, 11, 1),
            Err(BenchSetupError::Core(_))
        ));
    }
}
