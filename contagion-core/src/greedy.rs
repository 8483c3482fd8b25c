//! Greedy, simulation-driven selection of vaccination targets.
//!
//! Every iteration estimates the damage of the current working graph, probes
//! each remaining candidate by pinning it to vaccinated, and commits the
//! candidate with the largest estimated reduction. The probe loop is the
//! dominant cost of the crate, so candidates may be restricted to a hop
//! radius around the seeds or the whole computation moved onto the induced
//! neighbourhood subgraph.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use crate::{
    Result,
    error::ContagionError,
    estimator::DamageEstimator,
    execution::{Backend, ExecutionStrategy, collect_indexed_with},
    graph::{Graph, NodeId},
    rng::{SeededSource, mix_seed, resolve_seed},
    state::NodeState,
};

/// Limits the nodes considered by [`GreedySelector::select`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CandidateScope {
    /// Every susceptible node of the full graph is a candidate.
    #[default]
    Full,
    /// Only susceptible nodes within `radius` hops of a seed are candidates.
    /// Damage is still estimated on the full graph.
    Radius(usize),
    /// The neighbourhood within `radius` hops of the seeds is extracted and
    /// both candidates and damage estimates are confined to it.
    Subgraph(usize),
}

/// Outcome of a greedy run.
#[derive(Clone, Debug)]
pub struct GreedySelection {
    graph: Graph,
    selected: Vec<NodeId>,
    gains: Vec<f64>,
    requested: usize,
}

impl GreedySelection {
    /// The working graph: seeds infected and every selected node vaccinated.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Consumes the selection, returning the working graph.
    #[must_use]
    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Chosen nodes in selection order.
    #[must_use]
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    /// Estimated damage reduction of each pick, aligned with
    /// [`Self::selected`].
    #[must_use]
    pub fn gains(&self) -> &[f64] {
        &self.gains
    }

    /// The budget the selector was asked to fill.
    #[must_use]
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// How many picks were missing because the candidate pool ran dry.
    #[must_use]
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.selected.len())
    }

    /// Returns whether the whole budget was spent.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.shortfall() == 0
    }
}

/// Picks up to `budget` nodes whose vaccination most reduces estimated damage.
///
/// Candidates are the nodes that are susceptible once the seeds have been
/// infected, visited in ascending identifier order. Ties go to the first
/// candidate visited. Within one iteration the baseline and every probe
/// replay the same random stream, so gains compare configurations rather than
/// sampling noise.
///
/// # Examples
/// ```
/// use contagion_core::{
///     DamageEstimator, EstimatorKind, Graph, GreedySelector, SisEngine, SisParams,
/// };
///
/// // Star centred on 0; infecting a leaf threatens the rest through the centre.
/// let graph = Graph::from_edges(5, [(0, 1), (0, 2), (0, 3), (0, 4)])?;
/// let estimator = DamageEstimator::new(
///     SisEngine::new(SisParams::new(1.0, 0.0)?),
///     EstimatorKind::FastTwoStep,
/// );
/// let selection = GreedySelector::new(estimator, 1).with_seed(3).select(&graph, &[1])?;
/// assert_eq!(selection.selected(), &[0]);
/// assert!(selection.is_complete());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct GreedySelector {
    estimator: DamageEstimator,
    budget: usize,
    scope: CandidateScope,
    seed: Option<u64>,
    strategy: ExecutionStrategy,
}

impl GreedySelector {
    /// Creates a selector spending `budget` vaccinations over the full graph.
    #[must_use]
    pub fn new(estimator: DamageEstimator, budget: usize) -> Self {
        Self {
            estimator,
            budget,
            scope: CandidateScope::Full,
            seed: None,
            strategy: ExecutionStrategy::Auto,
        }
    }

    /// Restricts the candidate pool.
    #[must_use]
    pub fn with_scope(mut self, scope: CandidateScope) -> Self {
        self.scope = scope;
        self
    }

    /// Fixes the base seed so selections are reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Selects how candidate probes are scheduled.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Number of vaccinations requested.
    #[must_use]
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Candidate restriction in effect.
    #[must_use]
    pub fn scope(&self) -> CandidateScope {
        self.scope
    }

    /// Infects `seeds` on a copy of `graph` and greedily vaccinates up to
    /// `budget` candidates.
    ///
    /// Running out of candidates is not an error; inspect
    /// [`GreedySelection::shortfall`].
    ///
    /// # Errors
    /// - [`ContagionError::Graph`] when a seed does not exist.
    /// - [`ContagionError::DuplicateNode`] when a seed repeats.
    /// - [`ContagionError::BudgetExceedsNodes`] when seeds plus budget exceed
    ///   the node count.
    /// - [`ContagionError::BackendUnavailable`] when the execution strategy is
    ///   not compiled in.
    #[instrument(
        name = "core.greedy_select",
        err,
        skip(self, graph, seeds),
        fields(
            nodes = graph.node_count(),
            seeds = seeds.len(),
            budget = self.budget,
            scope = ?self.scope,
            candidates = tracing::field::Empty
        ),
    )]
    pub fn select(&self, graph: &Graph, seeds: &[NodeId]) -> Result<GreedySelection> {
        graph.check_nodes(seeds)?;
        ensure_distinct(seeds)?;
        if seeds.len() + self.budget > graph.node_count() {
            return Err(ContagionError::BudgetExceedsNodes {
                infected: seeds.len(),
                vaccinated: self.budget,
                nodes: graph.node_count(),
            });
        }
        let backend = self.strategy.backend()?;
        let base_seed = resolve_seed(self.seed);

        let mut working = graph.clone();
        working.apply_infection(seeds)?;

        let (selected, gains) = match self.scope {
            CandidateScope::Full => {
                let pool = working.nodes_in(NodeState::Susceptible);
                self.run_loop(&mut working, pool, backend, base_seed)?
            }
            CandidateScope::Radius(radius) => {
                let pool = working
                    .within_radius(seeds, radius)
                    .into_iter()
                    .filter(|&node| working.state(node) == Some(NodeState::Susceptible))
                    .collect();
                self.run_loop(&mut working, pool, backend, base_seed)?
            }
            CandidateScope::Subgraph(radius) => {
                let sub = working.neighbourhood(seeds, radius)?;
                let mut local = sub.graph().clone();
                let pool = local.nodes_in(NodeState::Susceptible);
                let (picked, gains) = self.run_loop(&mut local, pool, backend, base_seed)?;
                let picked: Vec<NodeId> = picked
                    .into_iter()
                    .map(|node| sub.members()[node])
                    .collect();
                working.apply_vaccination(&picked)?;
                (picked, gains)
            }
        };

        if selected.len() < self.budget {
            warn!(
                requested = self.budget,
                selected = selected.len(),
                "candidate pool exhausted before the budget was spent"
            );
        }
        info!(selected = selected.len(), "greedy selection completed");
        Ok(GreedySelection {
            graph: working,
            selected,
            gains,
            requested: self.budget,
        })
    }

    fn run_loop(
        &self,
        working: &mut Graph,
        mut pool: Vec<NodeId>,
        backend: Backend,
        base_seed: u64,
    ) -> Result<(Vec<NodeId>, Vec<f64>)> {
        tracing::Span::current().record("candidates", pool.len());
        let mut selected = Vec::with_capacity(self.budget.min(pool.len()));
        let mut gains = Vec::with_capacity(selected.capacity());

        for iteration in 0..self.budget {
            if pool.is_empty() {
                break;
            }
            let seed = mix_seed(base_seed, iteration);
            let baseline = self
                .estimator
                .estimate(working, &mut SeededSource::from_seed(seed));
            let snapshot: &Graph = &*working;
            let probed = collect_indexed_with(
                backend,
                pool.len(),
                || snapshot.clone(),
                |scratch: &mut Graph, index| {
                    self.estimator.estimate_with_probe(
                        scratch,
                        pool[index],
                        &mut SeededSource::from_seed(seed),
                    )
                },
            );
            #[cfg(feature = "metrics")]
            metrics::counter!("contagion_greedy_probes_total").increment(pool.len() as u64);

            let mut best: Option<(usize, f64)> = None;
            for (index, damage) in probed.into_iter().enumerate() {
                let gain = baseline - damage?;
                if best.is_none_or(|(_, top)| gain > top) {
                    best = Some((index, gain));
                }
            }
            let Some((index, gain)) = best else {
                break;
            };
            let node = pool.remove(index);
            working.set_state(node, NodeState::Vaccinated)?;
            #[cfg(feature = "metrics")]
            metrics::counter!("contagion_greedy_selections_total").increment(1);
            debug!(iteration, node, baseline, gain, "vaccination selected");
            selected.push(node);
            gains.push(gain);
        }
        Ok((selected, gains))
    }
}

fn ensure_distinct(nodes: &[NodeId]) -> Result<()> {
    let mut seen = HashSet::with_capacity(nodes.len());
    match nodes.iter().find(|&&node| !seen.insert(node)) {
        Some(&node) => Err(ContagionError::DuplicateNode { node }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::{
        engine::{SisEngine, SisParams},
        error::ContagionErrorCode,
        estimator::EstimatorKind,
    };

    fn path(len: usize) -> Graph {
        Graph::from_edges(len, (1..len).map(|node| (node - 1, node))).expect("path must build")
    }

    fn certain(kind: EstimatorKind) -> DamageEstimator {
        let params = SisParams::new(1.0, 0.0).expect("parameters are valid");
        DamageEstimator::new(SisEngine::new(params), kind)
    }

    #[rstest]
    fn cuts_both_sides_of_a_path_seed() {
        let selection = GreedySelector::new(certain(EstimatorKind::Rollout { horizon: 4 }), 2)
            .with_seed(1)
            .select(&path(5), &[2])
            .expect("selection must succeed");
        assert_eq!(selection.selected(), &[1, 3]);
        assert_eq!(selection.gains(), &[2.0, 2.0]);
        assert_eq!(selection.graph().state(2), Some(NodeState::Infected));
        assert_eq!(selection.graph().counts().vaccinated, 2);
    }

    #[rstest]
    fn zero_budget_selects_nothing() {
        let graph = path(4);
        let selection = GreedySelector::new(certain(EstimatorKind::FastTwoStep), 0)
            .select(&graph, &[0])
            .expect("selection must succeed");
        assert!(selection.selected().is_empty());
        assert!(selection.is_complete());
        assert_eq!(selection.graph().counts().vaccinated, 0);
        assert_eq!(selection.graph().counts().infected, 1);
    }

    #[rstest]
    fn radius_limited_pool_reports_shortfall() {
        let selection = GreedySelector::new(certain(EstimatorKind::FastTwoStep), 2)
            .with_scope(CandidateScope::Radius(1))
            .with_seed(4)
            .select(&path(5), &[0])
            .expect("selection must succeed");
        assert_eq!(selection.selected(), &[1]);
        assert_eq!(selection.shortfall(), 1);
        assert!(!selection.is_complete());
    }

    #[rstest]
    fn prevaccinated_nodes_are_not_candidates() {
        let mut graph = path(4);
        graph.apply_vaccination(&[1, 2]).expect("nodes exist");
        let selection = GreedySelector::new(certain(EstimatorKind::FastTwoStep), 1)
            .select(&graph, &[0])
            .expect("selection must succeed");
        assert_eq!(selection.selected(), &[3]);
    }

    #[rstest]
    fn subgraph_scope_maps_back_to_parent_ids() {
        let selection = GreedySelector::new(certain(EstimatorKind::Rollout { horizon: 3 }), 1)
            .with_scope(CandidateScope::Subgraph(1))
            .with_seed(0)
            .select(&path(7), &[3])
            .expect("selection must succeed");
        assert_eq!(selection.selected(), &[2]);
        assert_eq!(selection.graph().node_count(), 7);
        assert_eq!(selection.graph().state(2), Some(NodeState::Vaccinated));
    }

    #[rstest]
    #[case::duplicate(&[1, 1], 1, ContagionErrorCode::DuplicateNode)]
    #[case::over_budget(&[0, 1], 3, ContagionErrorCode::BudgetExceedsNodes)]
    #[case::unknown(&[9], 1, ContagionErrorCode::GraphFailure)]
    fn rejects_invalid_requests(
        #[case] seeds: &[NodeId],
        #[case] budget: usize,
        #[case] code: ContagionErrorCode,
    ) {
        let err = GreedySelector::new(certain(EstimatorKind::FastTwoStep), budget)
            .select(&path(4), seeds)
            .expect_err("request must be rejected");
        assert_eq!(err.code(), code);
    }

    #[cfg(feature = "parallel")]
    #[rstest]
    fn parallel_matches_sequential() {
        let graph = Graph::from_edges(
            16,
            (0..16).flat_map(|node| [(node, (node + 1) % 16), (node, (node + 5) % 16)]),
        )
        .expect("graph must build");
        let params = SisParams::new(0.5, 0.3).expect("parameters are valid");
        let estimator = DamageEstimator::new(SisEngine::new(params), EstimatorKind::FastTwoStep);
        let base = GreedySelector::new(estimator, 3).with_seed(21);
        let sequential = base
            .clone()
            .with_execution_strategy(ExecutionStrategy::Sequential)
            .select(&graph, &[0, 8])
            .expect("sequential is available");
        let parallel = base
            .with_execution_strategy(ExecutionStrategy::Parallel)
            .select(&graph, &[0, 8])
            .expect("parallel is available");
        assert_eq!(sequential.selected(), parallel.selected());
        assert_eq!(sequential.gains(), parallel.gains());
    }
}
