//! Rollout runner: repeated, independent advances of the transition engine.

use std::num::NonZeroUsize;

use tracing::{debug, instrument};

use crate::{
    Result,
    engine::{SisEngine, StepResult},
    execution::{ExecutionStrategy, collect_indexed},
    graph::Graph,
    rng::{SeededSource, UniformSource, mix_seed, resolve_seed},
};

/// Step results of one rollout, from `t = 0` to the horizon inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trajectory {
    steps: Vec<StepResult>,
}

impl Trajectory {
    /// Snapshots in time order.
    #[must_use]
    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    /// Infected count at every tick.
    #[must_use]
    pub fn infected_counts(&self) -> Vec<usize> {
        self.steps.iter().map(|step| step.infected).collect()
    }

    /// The last snapshot.
    #[must_use]
    pub fn last(&self) -> Option<&StepResult> {
        self.steps.last()
    }

    /// Number of snapshots (`horizon + 1`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns whether the trajectory holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Step-wise mean infected count across independent trials.
#[derive(Clone, Debug, PartialEq)]
pub struct MeanTrajectory {
    infected: Vec<f64>,
    trials: usize,
}

impl MeanTrajectory {
    fn from_trials(trials: &[Trajectory]) -> Self {
        let len = trials.first().map_or(0, Trajectory::len);
        let mut sums = vec![0_usize; len];
        for trial in trials {
            for (sum, step) in sums.iter_mut().zip(trial.steps()) {
                *sum += step.infected;
            }
        }
        let count = trials.len().max(1) as f64;
        Self {
            infected: sums.into_iter().map(|sum| sum as f64 / count).collect(),
            trials: trials.len(),
        }
    }

    /// Mean infected count at every tick.
    #[must_use]
    pub fn infected(&self) -> &[f64] {
        &self.infected
    }

    /// Mean infected fraction of a population of `node_count` nodes.
    #[must_use]
    pub fn infected_rate(&self, node_count: usize) -> Vec<f64> {
        let denominator = node_count.max(1) as f64;
        self.infected.iter().map(|mean| mean / denominator).collect()
    }

    /// Number of trials averaged.
    #[must_use]
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Number of ticks covered, including `t = 0`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.infected.len()
    }

    /// Returns whether no ticks were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infected.is_empty()
    }
}

/// Advances copies of a graph through a fixed horizon.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
///
/// use contagion_core::{Graph, RolloutRunner, SisEngine, SisParams};
///
/// let mut graph = Graph::from_edges(5, [(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)])?;
/// graph.apply_infection(&[0])?;
/// let runner = RolloutRunner::new(SisEngine::new(SisParams::new(1.0, 0.0)?), 2)
///     .with_trials(NonZeroUsize::new(4).expect("non-zero"))
///     .with_seed(11);
/// let mean = runner.run(&graph)?;
/// assert_eq!(mean.infected(), &[1.0, 3.0, 5.0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct RolloutRunner {
    engine: SisEngine,
    horizon: usize,
    trials: NonZeroUsize,
    seed: Option<u64>,
    strategy: ExecutionStrategy,
}

impl RolloutRunner {
    /// Creates a single-trial runner over `horizon` ticks.
    #[must_use]
    pub fn new(engine: SisEngine, horizon: usize) -> Self {
        Self {
            engine,
            horizon,
            trials: NonZeroUsize::MIN,
            seed: None,
            strategy: ExecutionStrategy::Auto,
        }
    }

    /// Sets the number of independent trials averaged by [`Self::run`].
    #[must_use]
    pub fn with_trials(mut self, trials: NonZeroUsize) -> Self {
        self.trials = trials;
        self
    }

    /// Fixes the base seed so runs are reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Selects how trials are scheduled.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Number of ticks simulated per trial.
    #[must_use]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Number of trials averaged per run.
    #[must_use]
    pub fn trials(&self) -> NonZeroUsize {
        self.trials
    }

    /// Runs one trial on a private copy of `graph`, drawing from `rng`.
    pub fn run_once<S>(&self, graph: &Graph, rng: &mut S) -> Trajectory
    where
        S: UniformSource + ?Sized,
    {
        let mut working = graph.clone();
        let mut steps = Vec::with_capacity(self.horizon + 1);
        steps.push(StepResult::initial(&working));
        for time in 1..=self.horizon {
            steps.push(self.engine.step(&mut working, time, rng));
        }
        Trajectory { steps }
    }

    /// Runs every trial and returns their individual trajectories in trial
    /// order.
    ///
    /// Trial `i` draws from a stream derived from the base seed and `i`, so
    /// the outcome does not depend on scheduling.
    ///
    /// # Errors
    /// Returns [`crate::ContagionError::BackendUnavailable`] when the
    /// configured strategy is not compiled in.
    #[instrument(
        name = "core.rollout",
        err,
        skip(self, graph),
        fields(
            nodes = graph.node_count(),
            horizon = self.horizon,
            trials = self.trials.get(),
            strategy = ?self.strategy
        ),
    )]
    pub fn run_trials(&self, graph: &Graph) -> Result<Vec<Trajectory>> {
        let backend = self.strategy.backend()?;
        let base_seed = resolve_seed(self.seed);
        let trajectories = collect_indexed(backend, self.trials.get(), |trial| {
            let mut rng = SeededSource::from_seed(mix_seed(base_seed, trial));
            self.run_once(graph, &mut rng)
        });
        #[cfg(feature = "metrics")]
        metrics::counter!("contagion_rollout_trials_total").increment(self.trials.get() as u64);
        debug!(trials = trajectories.len(), "rollout trials completed");
        Ok(trajectories)
    }

    /// Runs every trial and averages infected counts tick by tick.
    ///
    /// # Errors
    /// Returns [`crate::ContagionError::BackendUnavailable`] when the
    /// configured strategy is not compiled in.
    pub fn run(&self, graph: &Graph) -> Result<MeanTrajectory> {
        let trajectories = self.run_trials(graph)?;
        Ok(MeanTrajectory::from_trials(&trajectories))
    }
}
