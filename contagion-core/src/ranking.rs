//! Node rankings and the immunizers that consume them.
//!
//! The centrality rankings score every node from the topology alone, while
//! [`ExposureRanking`] also reads the current infected set. [`immunize`]
//! scores once and vaccinates the best-scoring susceptible nodes, ordering by
//! score descending with ties broken by ascending node id.
//! [`immunize_by_exposure`] re-scores after every pick.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::{
    Result,
    error::check_probability,
    graph::{Graph, NodeId},
    state::NodeState,
};

/// Damping factor used by [`PageRankRanking::default`].
pub const DEFAULT_PAGERANK_DAMPING: f64 = 0.85;
/// Per-node L1 convergence tolerance used by [`PageRankRanking::default`].
pub const DEFAULT_PAGERANK_TOLERANCE: f64 = 1.0e-6;
/// Iteration cap used by [`PageRankRanking::default`].
pub const DEFAULT_PAGERANK_MAX_ITERATIONS: usize = 100;

/// Produces one score per node; larger scores are vaccinated first.
pub trait NodeRanking {
    /// Short, stable name used in reports.
    fn name(&self) -> &'static str;

    /// Scores indexed by node id. The result has `graph.node_count()` entries.
    fn scores(&self, graph: &Graph) -> Vec<f64>;
}

/// Ranks nodes by number of neighbours.
#[derive(Clone, Copy, Debug, Default)]
pub struct DegreeRanking;

impl NodeRanking for DegreeRanking {
    fn name(&self) -> &'static str {
        "degree"
    }

    fn scores(&self, graph: &Graph) -> Vec<f64> {
        (0..graph.node_count())
            .map(|node| graph.degree(node) as f64)
            .collect()
    }
}

/// Ranks nodes by PageRank on the undirected graph, computed by power
/// iteration. Mass held by isolated nodes is spread uniformly.
#[derive(Clone, Copy, Debug)]
pub struct PageRankRanking {
    damping: f64,
    tolerance: f64,
    max_iterations: usize,
}

impl Default for PageRankRanking {
    fn default() -> Self {
        Self {
            damping: DEFAULT_PAGERANK_DAMPING,
            tolerance: DEFAULT_PAGERANK_TOLERANCE,
            max_iterations: DEFAULT_PAGERANK_MAX_ITERATIONS,
        }
    }
}

impl PageRankRanking {
    /// Overrides the damping factor.
    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Overrides the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl NodeRanking for PageRankRanking {
    fn name(&self) -> &'static str {
        "pagerank"
    }

    fn scores(&self, graph: &Graph) -> Vec<f64> {
        let count = graph.node_count();
        if count == 0 {
            return Vec::new();
        }
        let uniform = 1.0 / count as f64;
        let mut rank = vec![uniform; count];
        for iteration in 0..self.max_iterations {
            let dangling: f64 = (0..count)
                .filter(|&node| graph.degree(node) == 0)
                .map(|node| rank[node])
                .sum();
            let base = (self.damping * dangling + 1.0 - self.damping) * uniform;
            let mut next = vec![base; count];
            for (node, &mass) in rank.iter().enumerate() {
                let neighbours = graph.neighbours(node);
                if neighbours.is_empty() {
                    continue;
                }
                let share = self.damping * mass / neighbours.len() as f64;
                for &neighbour in neighbours {
                    next[neighbour] += share;
                }
            }
            let delta: f64 = next
                .iter()
                .zip(&rank)
                .map(|(new, old)| (new - old).abs())
                .sum();
            rank = next;
            if delta < count as f64 * self.tolerance {
                debug!(iterations = iteration + 1, "pagerank converged");
                return rank;
            }
        }
        warn!(
            max_iterations = self.max_iterations,
            "pagerank did not converge; using the last iterate"
        );
        rank
    }
}

/// Ranks nodes by shortest-path betweenness (Brandes), counting each
/// unordered pair once.
#[derive(Clone, Copy, Debug, Default)]
pub struct BetweennessRanking;

impl NodeRanking for BetweennessRanking {
    fn name(&self) -> &'static str {
        "betweenness"
    }

    fn scores(&self, graph: &Graph) -> Vec<f64> {
        let count = graph.node_count();
        let mut centrality = vec![0.0; count];
        let mut order = Vec::with_capacity(count);
        let mut predecessors: Vec<Vec<NodeId>> = vec![Vec::new(); count];
        let mut paths = vec![0.0_f64; count];
        let mut distance: Vec<Option<usize>> = vec![None; count];
        let mut dependency = vec![0.0_f64; count];
        let mut queue = VecDeque::new();

        for source in 0..count {
            order.clear();
            for list in &mut predecessors {
                list.clear();
            }
            paths.fill(0.0);
            distance.fill(None);
            dependency.fill(0.0);

            paths[source] = 1.0;
            distance[source] = Some(0);
            queue.push_back(source);
            while let Some(node) = queue.pop_front() {
                order.push(node);
                let Some(depth) = distance[node] else {
                    continue;
                };
                for &next in graph.neighbours(node) {
                    if distance[next].is_none() {
                        distance[next] = Some(depth + 1);
                        queue.push_back(next);
                    }
                    if distance[next] == Some(depth + 1) {
                        paths[next] += paths[node];
                        predecessors[next].push(node);
                    }
                }
            }

            while let Some(node) = order.pop() {
                for &previous in &predecessors[node] {
                    dependency[previous] +=
                        paths[previous] / paths[node] * (1.0 + dependency[node]);
                }
                if node != source {
                    centrality[node] += dependency[node];
                }
            }
        }

        // Each unordered pair was counted from both endpoints.
        centrality.iter_mut().for_each(|score| *score /= 2.0);
        centrality
    }
}

/// Scores a node by `beta` times its number of infected neighbours: the
/// expected number of infectious contacts it receives next tick.
///
/// # Examples
/// ```
/// use contagion_core::{ExposureRanking, Graph, NodeRanking};
///
/// let mut graph = Graph::from_edges(3, [(0, 1), (1, 2)])?;
/// graph.apply_infection(&[0, 2])?;
/// let scores = ExposureRanking::new(0.25)?.scores(&graph);
/// assert_eq!(scores, vec![0.0, 0.5, 0.0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExposureRanking {
    beta: f64,
}

impl ExposureRanking {
    /// Creates a ranking for transmission probability `beta`.
    ///
    /// # Errors
    /// Returns [`crate::ContagionError::InvalidProbability`] when `beta` is
    /// outside `[0, 1]` or not finite.
    pub fn new(beta: f64) -> Result<Self> {
        Ok(Self {
            beta: check_probability("beta", beta)?,
        })
    }

    fn exposure(&self, graph: &Graph, node: NodeId) -> f64 {
        let infected = graph
            .neighbours(node)
            .iter()
            .filter(|&&neighbour| graph.state(neighbour) == Some(NodeState::Infected))
            .count();
        self.beta * infected as f64
    }
}

impl NodeRanking for ExposureRanking {
    fn name(&self) -> &'static str {
        "exposure"
    }

    fn scores(&self, graph: &Graph) -> Vec<f64> {
        (0..graph.node_count())
            .map(|node| self.exposure(graph, node))
            .collect()
    }
}

/// Returns up to `n` susceptible nodes with the highest `scores`, ordered by
/// score descending then node id ascending.
///
/// # Examples
/// ```
/// use contagion_core::{Graph, top_n_by_score};
///
/// let graph = Graph::from_edges(4, [(0, 1)])?;
/// assert_eq!(top_n_by_score(&graph, &[1.0, 3.0, 3.0, 0.5], 2), vec![1, 2]);
/// # Ok::<(), contagion_core::GraphError>(())
/// ```
#[must_use]
pub fn top_n_by_score(graph: &Graph, scores: &[f64], n: usize) -> Vec<NodeId> {
    let mut ranked: Vec<(NodeId, f64)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|&(node, _)| graph.state(node) == Some(NodeState::Susceptible))
        .collect();
    ranked.sort_by(|left, right| right.1.total_cmp(&left.1).then(left.0.cmp(&right.0)));
    ranked.into_iter().take(n).map(|(node, _)| node).collect()
}

/// Vaccinates the top `n` susceptible nodes of `graph` under `ranking` and
/// returns them in rank order.
///
/// Fewer than `n` nodes are returned when fewer are susceptible.
///
/// # Errors
/// Returns [`crate::ContagionError::Graph`] if the ranking yields an
/// identifier outside the graph.
///
/// # Examples
/// ```
/// use contagion_core::{DegreeRanking, Graph, NodeState, immunize};
///
/// let mut graph = Graph::from_edges(4, [(0, 1), (0, 2), (0, 3)])?;
/// let chosen = immunize(&mut graph, &DegreeRanking, 1)?;
/// assert_eq!(chosen, vec![0]);
/// assert_eq!(graph.state(0), Some(NodeState::Vaccinated));
/// # Ok::<(), contagion_core::ContagionError>(())
/// ```
pub fn immunize<K>(graph: &mut Graph, ranking: &K, n: usize) -> Result<Vec<NodeId>>
where
    K: NodeRanking + ?Sized,
{
    let scores = ranking.scores(graph);
    let chosen = top_n_by_score(graph, &scores, n);
    graph.apply_vaccination(&chosen)?;
    debug!(ranking = ranking.name(), chosen = chosen.len(), "immunized by ranking");
    Ok(chosen)
}

/// Vaccinates up to `n` susceptible nodes one at a time, each time choosing
/// the node with the highest exposure under the current states. Ties go to
/// the lowest id. Returns the picks in order.
///
/// # Errors
/// Returns [`crate::ContagionError::Graph`] if a pick cannot be applied.
///
/// # Examples
/// ```
/// use contagion_core::{ExposureRanking, Graph, NodeState, immunize_by_exposure};
///
/// // Hub 0 has three leaves; the outbreak sits on the path 4-5-6.
/// let mut graph = Graph::from_edges(7, [(0, 1), (0, 2), (0, 3), (4, 5), (5, 6)])?;
/// graph.apply_infection(&[4])?;
/// let chosen = immunize_by_exposure(&mut graph, &ExposureRanking::new(0.5)?, 1)?;
/// assert_eq!(chosen, vec![5]);
/// assert_eq!(graph.state(5), Some(NodeState::Vaccinated));
/// # Ok::<(), contagion_core::ContagionError>(())
/// ```
pub fn immunize_by_exposure(
    graph: &mut Graph,
    ranking: &ExposureRanking,
    n: usize,
) -> Result<Vec<NodeId>> {
    let mut chosen = Vec::with_capacity(n);
    while chosen.len() < n {
        let mut best: Option<(NodeId, f64)> = None;
        for node in graph.nodes_in(NodeState::Susceptible) {
            let score = ranking.exposure(graph, node);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((node, score));
            }
        }
        let Some((node, _)) = best else {
            break;
        };
        graph.apply_vaccination(&[node])?;
        chosen.push(node);
    }
    debug!(ranking = ranking.name(), chosen = chosen.len(), "immunized by exposure");
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn path(len: usize) -> Graph {
        Graph::from_edges(len, (1..len).map(|node| (node - 1, node))).expect("path must build")
    }

    fn star(leaves: usize) -> Graph {
        Graph::from_edges(leaves + 1, (1..=leaves).map(|leaf| (0, leaf))).expect("star must build")
    }

    #[rstest]
    fn betweenness_of_a_path_counts_pairs_through_each_node() {
        // On 0-1-2-3-4 node 2 lies on the 4 pairs that straddle it.
        let scores = BetweennessRanking.scores(&path(5));
        assert_eq!(scores, vec![0.0, 3.0, 4.0, 3.0, 0.0]);
    }

    #[rstest]
    fn betweenness_splits_equal_paths() {
        // 4-cycle: each node carries half of the opposite pair.
        let cycle = Graph::from_edges(4, [(0, 1), (1, 2), (2, 3), (3, 0)]).expect("cycle builds");
        assert_eq!(BetweennessRanking.scores(&cycle), vec![0.5; 4]);
    }

    #[rstest]
    fn pagerank_sums_to_one_and_favours_hubs() {
        // Node 5 is isolated and exercises the dangling redistribution.
        let graph = Graph::from_edges(6, (1..=4).map(|leaf| (0, leaf))).expect("graph must build");
        let scores = PageRankRanking::default().scores(&graph);
        let total: f64 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1.0e-9, "total = {total}");
        assert_eq!(top_n_by_score(&graph, &scores, 1), vec![0]);
        assert!(scores[5] < scores[1]);
    }

    #[rstest]
    #[case::degree(Box::new(DegreeRanking))]
    #[case::pagerank(Box::new(PageRankRanking::default()))]
    #[case::betweenness(Box::new(BetweennessRanking))]
    fn immunize_picks_the_hub(#[case] ranking: Box<dyn NodeRanking>) {
        let mut graph = star(5);
        let chosen = immunize(&mut graph, ranking.as_ref(), 2).expect("ranking is in bounds");
        assert_eq!(chosen, vec![0, 1]);
        assert_eq!(graph.counts().vaccinated, 2);
    }

    fn exposure(beta: f64) -> ExposureRanking {
        ExposureRanking::new(beta).expect("beta is valid")
    }

    #[rstest]
    fn exposure_counts_infected_neighbours_only() {
        let mut graph = star(4);
        graph.apply_infection(&[1, 2]).expect("nodes exist");
        graph.apply_vaccination(&[3]).expect("node exists");
        assert_eq!(exposure(0.5).scores(&graph), vec![1.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(ExposureRanking::new(1.5).is_err());
    }

    #[rstest]
    fn exposure_immunizer_prefers_the_contact_then_lowest_ids() {
        // Path 0-1-2-3-4-5 with node 2 infected: 1 and 3 tie, 1 wins, then 3,
        // then the unexposed nodes in id order.
        let mut graph = path(6);
        graph.apply_infection(&[2]).expect("node exists");
        let chosen = immunize_by_exposure(&mut graph, &exposure(0.3), 3).expect("picks apply");
        assert_eq!(chosen, vec![1, 3, 0]);
        assert_eq!(graph.counts().vaccinated, 3);
        assert_eq!(graph.state(2), Some(NodeState::Infected));
    }

    #[rstest]
    fn exposure_immunizer_stops_when_nobody_is_susceptible() {
        let mut graph = star(2);
        graph.apply_infection(&[0]).expect("node exists");
        let chosen = immunize_by_exposure(&mut graph, &exposure(1.0), 5).expect("picks apply");
        assert_eq!(chosen, vec![1, 2]);
        assert!(immunize_by_exposure(&mut graph, &exposure(1.0), 1)
            .expect("nothing to apply")
            .is_empty());
    }

    #[rstest]
    fn ranking_skips_infected_and_vaccinated_nodes() {
        let mut graph = star(3);
        graph.apply_infection(&[0]).expect("node exists");
        graph.apply_vaccination(&[1]).expect("node exists");
        let chosen = immunize(&mut graph, &DegreeRanking, 5).expect("ranking is in bounds");
        assert_eq!(chosen, vec![2, 3]);
        assert_eq!(graph.state(0), Some(NodeState::Infected));
    }
}
