//! Comparison of vaccination strategies under a shared outbreak.
//!
//! One seed set is drawn per run and every strategy is applied to the same
//! seeded graph. Each variant is then advanced by the rollout runner with the
//! same per-trial seeds, so differences between the series come from the
//! vaccinations rather than from sampling.

use std::{fmt, num::NonZeroUsize};

use tracing::{info, instrument};

use crate::{
    Result,
    engine::{SisEngine, SisParams},
    error::ContagionError,
    estimator::{DamageEstimator, EstimatorKind},
    execution::ExecutionStrategy,
    graph::{Graph, NodeId},
    greedy::{CandidateScope, GreedySelector},
    ranking::{
        BetweennessRanking, DegreeRanking, ExposureRanking, NodeRanking, PageRankRanking,
        immunize, immunize_by_exposure,
    },
    rng::{SeededSource, mix_seed, resolve_seed},
    rollout::{MeanTrajectory, RolloutRunner},
    seeding::{SeedStrategy, choose_seeds},
};

const SEEDING_STREAM: usize = 0;
const ROLLOUT_STREAM: usize = 1;
const GREEDY_STREAM: usize = 2;

/// A way of spending the vaccination budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// No vaccination.
    Baseline,
    /// Highest degree first.
    Degree,
    /// Highest PageRank first.
    PageRank,
    /// Highest betweenness first.
    Betweenness,
    /// Most infected contacts first, re-scored after every pick.
    Exposure,
    /// Simulation-driven greedy selection.
    Greedy,
}

impl Strategy {
    /// Every strategy, in report order.
    pub const ALL: [Self; 6] = [
        Self::Baseline,
        Self::Degree,
        Self::PageRank,
        Self::Betweenness,
        Self::Exposure,
        Self::Greedy,
    ];

    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Degree => "degree",
            Self::PageRank => "pagerank",
            Self::Betweenness => "betweenness",
            Self::Exposure => "exposure",
            Self::Greedy => "greedy",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one strategy within an [`ExperimentReport`].
#[derive(Clone, Debug)]
pub struct StrategyOutcome {
    strategy: Strategy,
    vaccinated: Vec<NodeId>,
    shortfall: usize,
    mean: MeanTrajectory,
}

impl StrategyOutcome {
    /// Strategy that produced this outcome.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Nodes vaccinated by the strategy, in the order chosen.
    #[must_use]
    pub fn vaccinated(&self) -> &[NodeId] {
        &self.vaccinated
    }

    /// Unspent vaccinations.
    #[must_use]
    pub fn shortfall(&self) -> usize {
        self.shortfall
    }

    /// Mean infected trajectory of the vaccinated variant.
    #[must_use]
    pub fn mean(&self) -> &MeanTrajectory {
        &self.mean
    }
}

/// Everything produced by [`Experiment::run`].
#[derive(Clone, Debug)]
pub struct ExperimentReport {
    node_count: usize,
    seeds: Vec<NodeId>,
    outcomes: Vec<StrategyOutcome>,
}

impl ExperimentReport {
    /// Population size, the denominator of infected rates.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Initial infected set shared by every strategy.
    #[must_use]
    pub fn seeds(&self) -> &[NodeId] {
        &self.seeds
    }

    /// Outcomes in the order the strategies were requested.
    #[must_use]
    pub fn outcomes(&self) -> &[StrategyOutcome] {
        &self.outcomes
    }

    /// Outcome of `strategy`, if it was run.
    #[must_use]
    pub fn outcome(&self, strategy: Strategy) -> Option<&StrategyOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.strategy == strategy)
    }
}

/// A validated experiment configuration. Construct with
/// [`crate::ExperimentBuilder`].
///
/// # Examples
/// ```
/// use contagion_core::{ExperimentBuilder, Graph, Strategy};
///
/// let graph = Graph::from_edges(6, [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)])?;
/// let experiment = ExperimentBuilder::new()
///     .with_infected(1)
///     .with_vaccinated(2)
///     .with_horizon(4)
///     .with_trials(3)
///     .with_seed(7)
///     .build()?;
/// let report = experiment.run(&graph, &Strategy::ALL)?;
/// assert_eq!(report.outcomes().len(), 6);
/// assert_eq!(report.outcome(Strategy::Baseline).map(|o| o.mean().len()), Some(5));
/// # Ok::<(), contagion_core::ContagionError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Experiment {
    pub(crate) params: SisParams,
    pub(crate) horizon: usize,
    pub(crate) infected: usize,
    pub(crate) vaccinated: usize,
    pub(crate) trials: NonZeroUsize,
    pub(crate) estimator_rollouts: NonZeroUsize,
    pub(crate) estimator: EstimatorKind,
    pub(crate) scope: CandidateScope,
    pub(crate) seeding: SeedStrategy,
    pub(crate) seed: Option<u64>,
    pub(crate) execution_strategy: ExecutionStrategy,
}

impl Experiment {
    /// Contagion parameters.
    #[must_use]
    pub fn params(&self) -> SisParams {
        self.params
    }

    /// Rollout trials averaged per strategy.
    #[must_use]
    pub fn trials(&self) -> NonZeroUsize {
        self.trials
    }

    /// Vaccination budget per strategy.
    #[must_use]
    pub fn vaccinated(&self) -> usize {
        self.vaccinated
    }

    /// Seeds an outbreak on `graph`, applies each of `strategies`, and
    /// averages the resulting epidemics.
    ///
    /// # Errors
    /// Returns [`ContagionError::BudgetExceedsNodes`] when the infection and
    /// vaccination budgets do not fit in the graph and
    /// [`ContagionError::BackendUnavailable`] when the execution strategy is
    /// not compiled in.
    #[instrument(
        name = "core.experiment_run",
        err,
        skip(self, graph, strategies),
        fields(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            strategies = strategies.len(),
            infected = self.infected,
            vaccinated = self.vaccinated
        ),
    )]
    pub fn run(&self, graph: &Graph, strategies: &[Strategy]) -> Result<ExperimentReport> {
        let susceptible = graph.counts().susceptible;
        if self.infected + self.vaccinated > susceptible {
            return Err(ContagionError::BudgetExceedsNodes {
                infected: self.infected,
                vaccinated: self.vaccinated,
                nodes: susceptible,
            });
        }
        self.execution_strategy.backend()?;
        let base_seed = resolve_seed(self.seed);

        let mut seeding_rng = SeededSource::from_seed(mix_seed(base_seed, SEEDING_STREAM));
        let seeds = choose_seeds(graph, self.infected, self.seeding, seeding_rng.rng_mut())?;
        let mut seeded = graph.clone();
        seeded.apply_infection(&seeds)?;

        let engine = SisEngine::new(self.params);
        let runner = RolloutRunner::new(engine, self.horizon)
            .with_trials(self.trials)
            .with_seed(mix_seed(base_seed, ROLLOUT_STREAM))
            .with_execution_strategy(self.execution_strategy);

        let mut outcomes = Vec::with_capacity(strategies.len());
        for &strategy in strategies {
            let (variant, vaccinated, shortfall) =
                self.vaccinate(strategy, graph, &seeded, &seeds, engine, base_seed)?;
            let mean = runner.run(&variant)?;
            info!(
                %strategy,
                vaccinated = vaccinated.len(),
                final_infected = mean.infected().last().copied().unwrap_or_default(),
                "strategy evaluated"
            );
            outcomes.push(StrategyOutcome {
                strategy,
                vaccinated,
                shortfall,
                mean,
            });
        }

        Ok(ExperimentReport {
            node_count: graph.node_count(),
            seeds,
            outcomes,
        })
    }

    fn vaccinate(
        &self,
        strategy: Strategy,
        graph: &Graph,
        seeded: &Graph,
        seeds: &[NodeId],
        engine: SisEngine,
        base_seed: u64,
    ) -> Result<(Graph, Vec<NodeId>, usize)> {
        let pagerank = PageRankRanking::default();
        let ranking: &dyn NodeRanking = match strategy {
            Strategy::Baseline => return Ok((seeded.clone(), Vec::new(), 0)),
            Strategy::Greedy => {
                let estimator = DamageEstimator::new(engine, self.estimator)
                    .with_rollouts(self.estimator_rollouts);
                let selection = GreedySelector::new(estimator, self.vaccinated)
                    .with_scope(self.scope)
                    .with_seed(mix_seed(base_seed, GREEDY_STREAM))
                    .with_execution_strategy(self.execution_strategy)
                    .select(graph, seeds)?;
                let shortfall = selection.shortfall();
                let vaccinated = selection.selected().to_vec();
                return Ok((selection.into_graph(), vaccinated, shortfall));
            }
            Strategy::Exposure => {
                let mut variant = seeded.clone();
                let ranking = ExposureRanking::new(self.params.beta())?;
                let vaccinated = immunize_by_exposure(&mut variant, &ranking, self.vaccinated)?;
                let shortfall = self.vaccinated.saturating_sub(vaccinated.len());
                return Ok((variant, vaccinated, shortfall));
            }
            Strategy::Degree => &DegreeRanking,
            Strategy::PageRank => &pagerank,
            Strategy::Betweenness => &BetweennessRanking,
        };
        let mut variant = seeded.clone();
        let vaccinated = immunize(&mut variant, ranking, self.vaccinated)?;
        let shortfall = self.vaccinated.saturating_sub(vaccinated.len());
        Ok((variant, vaccinated, shortfall))
    }
}
