//! Seeded random graph generators for contagion experiments.
//!
//! Every generator is deterministic for a given seed and returns a
//! [`Graph`] whose nodes are all susceptible.

use std::collections::BTreeSet;

use contagion_core::{Graph, GraphError, NodeId};
use rand::{Rng, SeedableRng, rngs::SmallRng, seq::SliceRandom};
use thiserror::Error;
use tracing::debug;

/// Errors raised by the generators.
#[derive(Debug, Error)]
pub enum SyntheticError {
    /// Preferential attachment needs `1 <= m < n`.
    #[error("attachment count {m} must satisfy 1 <= m < n (n = {n})")]
    InvalidAttachment {
        /// Edges added per new node.
        m: usize,
        /// Requested node count.
        n: usize,
    },
    /// Edge probabilities must lie in `[0, 1]`.
    #[error("edge probability must lie in [0, 1], got {got}")]
    InvalidProbability {
        /// Rejected probability.
        got: f64,
    },
    /// Graph assembly failed.
    #[error("graph construction failed: {0}")]
    Graph(#[from] GraphError),
}

/// Barabási–Albert preferential-attachment graph on `n` nodes.
///
/// Growth starts from a star on `m + 1` nodes. Each later node attaches to
/// `m` distinct existing nodes chosen with probability proportional to
/// degree, so the result has `m * (n - m)` edges.
///
/// # Errors
/// Returns [`SyntheticError::InvalidAttachment`] unless `1 <= m < n`.
///
/// # Examples
/// ```
/// use contagion_providers_synthetic::barabasi_albert;
///
/// let graph = barabasi_albert(50, 2, 10)?;
/// assert_eq!(graph.node_count(), 50);
/// assert_eq!(graph.edge_count(), 2 * 48);
/// # Ok::<(), contagion_providers_synthetic::SyntheticError>(())
/// ```
pub fn barabasi_albert(n: usize, m: usize, seed: u64) -> Result<Graph, SyntheticError> {
    if m == 0 || m >= n {
        return Err(SyntheticError::InvalidAttachment { m, n });
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut edges: Vec<(NodeId, NodeId)> = (1..=m).map(|leaf| (0, leaf)).collect();
    // Each node appears once per incident edge.
    let mut repeated: Vec<NodeId> = edges.iter().flat_map(|&(a, b)| [a, b]).collect();

    for source in (m + 1)..n {
        let mut targets = BTreeSet::new();
        while targets.len() < m {
            if let Some(&target) = repeated.choose(&mut rng) {
                targets.insert(target);
            }
        }
        for &target in &targets {
            edges.push((source, target));
            repeated.push(target);
            repeated.push(source);
        }
    }
    let graph = Graph::from_edges(n, edges)?;
    debug!(n, m, seed, edges = graph.edge_count(), "generated barabasi-albert graph");
    Ok(graph)
}

/// Erdős–Rényi `G(n, p)` graph: every unordered pair is joined
/// independently with probability `p`.
///
/// # Errors
/// Returns [`SyntheticError::InvalidProbability`] when `p` is outside
/// `[0, 1]` or not finite.
pub fn erdos_renyi(n: usize, p: f64, seed: u64) -> Result<Graph, SyntheticError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(SyntheticError::InvalidProbability { got: p });
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut edges = Vec::new();
    for left in 0..n {
        for right in (left + 1)..n {
            if rng.gen_bool(p) {
                edges.push((left, right));
            }
        }
    }
    let graph = Graph::from_edges(n, edges)?;
    debug!(n, p, seed, edges = graph.edge_count(), "generated erdos-renyi graph");
    Ok(graph)
}

/// Complete graph `K_n`.
///
/// # Errors
/// Propagates [`GraphError`] from graph assembly; never fails for valid
/// node counts.
pub fn complete(n: usize) -> Result<Graph, SyntheticError> {
    let edges = (0..n).flat_map(|left| ((left + 1)..n).map(move |right| (left, right)));
    Ok(Graph::from_edges(n, edges)?)
}
