//! Selection of the initial infected set.

use std::collections::VecDeque;

use rand::{Rng, seq::index};
use tracing::instrument;

use crate::{
    Result,
    error::ContagionError,
    graph::{Graph, NodeId},
    state::NodeState,
};

/// How the initial infected nodes are placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedStrategy {
    /// Uniform sample without replacement among susceptible nodes.
    #[default]
    Random,
    /// One breadth-first cluster grown from a random susceptible node. When
    /// the reachable susceptible region runs out, growth restarts from
    /// another random unvisited susceptible node.
    Cluster,
}

/// Chooses `count` distinct susceptible nodes of `graph` to infect.
///
/// The graph is not modified; apply the result with
/// [`Graph::apply_infection`].
///
/// # Errors
/// Returns [`ContagionError::BudgetExceedsNodes`] when fewer than `count`
/// nodes are susceptible.
///
/// # Examples
/// ```
/// use contagion_core::{Graph, SeedStrategy, SeededSource, choose_seeds};
///
/// let graph = Graph::from_edges(6, [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)])?;
/// let mut rng = SeededSource::from_seed(5);
/// let seeds = choose_seeds(&graph, 3, SeedStrategy::Cluster, rng.rng_mut())?;
/// assert_eq!(seeds.len(), 3);
/// # Ok::<(), contagion_core::ContagionError>(())
/// ```
#[instrument(
    name = "core.choose_seeds",
    err,
    skip(graph, rng),
    fields(nodes = graph.node_count()),
)]
pub fn choose_seeds<R>(
    graph: &Graph,
    count: usize,
    strategy: SeedStrategy,
    rng: &mut R,
) -> Result<Vec<NodeId>>
where
    R: Rng + ?Sized,
{
    let pool = graph.nodes_in(NodeState::Susceptible);
    if count > pool.len() {
        return Err(ContagionError::BudgetExceedsNodes {
            infected: count,
            vaccinated: 0,
            nodes: pool.len(),
        });
    }
    Ok(match strategy {
        SeedStrategy::Random => index::sample(rng, pool.len(), count)
            .into_iter()
            .map(|slot| pool[slot])
            .collect(),
        SeedStrategy::Cluster => grow_cluster(graph, &pool, count, rng),
    })
}

fn grow_cluster<R>(graph: &Graph, pool: &[NodeId], count: usize, rng: &mut R) -> Vec<NodeId>
where
    R: Rng + ?Sized,
{
    let mut visited = vec![false; graph.node_count()];
    let mut seeds = Vec::with_capacity(count);
    let mut queue = VecDeque::new();

    while seeds.len() < count {
        if queue.is_empty() {
            let fresh: Vec<NodeId> = pool.iter().copied().filter(|&node| !visited[node]).collect();
            let start = fresh[rng.gen_range(0..fresh.len())];
            visited[start] = true;
            queue.push_back(start);
        }
        let Some(node) = queue.pop_front() else {
            continue;
        };
        seeds.push(node);
        for &next in graph.neighbours(node) {
            if !visited[next] && graph.state(next) == Some(NodeState::Susceptible) {
                visited[next] = true;
                queue.push_back(next);
            }
        }
    }
    seeds
}
