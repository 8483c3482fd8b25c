//! Builder utilities for configuring vaccination experiments.
//!
//! Collects the configuration surface of a comparison run and validates it
//! before constructing [`Experiment`] instances.

use std::num::NonZeroUsize;

use crate::{
    Result,
    engine::SisParams,
    error::ContagionError,
    estimator::EstimatorKind,
    execution::ExecutionStrategy,
    experiment::Experiment,
    greedy::CandidateScope,
    seeding::SeedStrategy,
};

/// Configures and constructs [`Experiment`] instances.
///
/// # Examples
/// ```
/// use contagion_core::{ExecutionStrategy, ExperimentBuilder};
///
/// let experiment = ExperimentBuilder::new()
///     .with_beta(0.3)
///     .with_trials(4)
///     .with_execution_strategy(ExecutionStrategy::Sequential)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(experiment.params().beta(), 0.3);
/// assert_eq!(experiment.trials().get(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct ExperimentBuilder {
    beta: f64,
    gamma: f64,
    horizon: usize,
    infected: usize,
    vaccinated: usize,
    trials: usize,
    estimator_rollouts: usize,
    estimator: EstimatorKind,
    scope: CandidateScope,
    seeding: SeedStrategy,
    seed: Option<u64>,
    execution_strategy: ExecutionStrategy,
}

impl Default for ExperimentBuilder {
    fn default() -> Self {
        Self {
            beta: 0.4,
            gamma: 0.4,
            horizon: 12,
            infected: 5,
            vaccinated: 5,
            trials: 10,
            estimator_rollouts: 10,
            estimator: EstimatorKind::FastTwoStep,
            scope: CandidateScope::Full,
            seeding: SeedStrategy::Random,
            seed: None,
            execution_strategy: ExecutionStrategy::Auto,
        }
    }
}

impl ExperimentBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use contagion_core::ExperimentBuilder;
    ///
    /// let builder = ExperimentBuilder::new();
    /// assert_eq!(builder.horizon(), 12);
    /// assert_eq!(builder.infected(), 5);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the per-contact transmission probability.
    #[must_use]
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Overrides the per-tick recovery probability.
    #[must_use]
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Overrides the number of ticks simulated per trial.
    #[must_use]
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Returns the configured horizon.
    #[must_use]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Overrides the size of the initial infected set.
    #[must_use]
    pub fn with_infected(mut self, infected: usize) -> Self {
        self.infected = infected;
        self
    }

    /// Returns the configured size of the initial infected set.
    #[must_use]
    pub fn infected(&self) -> usize {
        self.infected
    }

    /// Overrides the vaccination budget shared by every strategy.
    #[must_use]
    pub fn with_vaccinated(mut self, vaccinated: usize) -> Self {
        self.vaccinated = vaccinated;
        self
    }

    /// Overrides the number of rollout trials averaged per strategy.
    #[must_use]
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Overrides the number of samples averaged per damage estimate.
    #[must_use]
    pub fn with_estimator_rollouts(mut self, rollouts: usize) -> Self {
        self.estimator_rollouts = rollouts;
        self
    }

    /// Selects how the greedy selector samples damage.
    #[must_use]
    pub fn with_estimator(mut self, estimator: EstimatorKind) -> Self {
        self.estimator = estimator;
        self
    }

    /// Restricts the greedy selector's candidate pool.
    #[must_use]
    pub fn with_candidate_scope(mut self, scope: CandidateScope) -> Self {
        self.scope = scope;
        self
    }

    /// Selects how initial infections are placed.
    #[must_use]
    pub fn with_seeding(mut self, seeding: SeedStrategy) -> Self {
        self.seeding = seeding;
        self
    }

    /// Fixes the base seed so every stochastic stage is reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the execution strategy used for trials and probes.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.execution_strategy = strategy;
        self
    }

    /// Returns the currently configured execution strategy.
    #[must_use]
    pub fn execution_strategy(&self) -> ExecutionStrategy {
        self.execution_strategy
    }

    /// Validates the configuration and constructs an [`Experiment`].
    ///
    /// # Errors
    /// Returns [`ContagionError::InvalidProbability`] for `beta` or `gamma`
    /// outside `[0, 1]` and [`ContagionError::InvalidCount`] when `trials` or
    /// the estimator rollout count is zero.
    ///
    /// # Examples
    /// ```
    /// use contagion_core::{ContagionErrorCode, ExperimentBuilder};
    ///
    /// let err = ExperimentBuilder::new().with_trials(0).build().unwrap_err();
    /// assert_eq!(err.code(), ContagionErrorCode::InvalidCount);
    /// ```
    pub fn build(self) -> Result<Experiment> {
        let params = SisParams::new(self.beta, self.gamma)?;
        let trials = positive("trials", self.trials)?;
        let estimator_rollouts = positive("estimator_rollouts", self.estimator_rollouts)?;
        Ok(Experiment {
            params,
            horizon: self.horizon,
            infected: self.infected,
            vaccinated: self.vaccinated,
            trials,
            estimator_rollouts,
            estimator: self.estimator,
            scope: self.scope,
            seeding: self.seeding,
            seed: self.seed,
            execution_strategy: self.execution_strategy,
        })
    }
}

fn positive(parameter: &'static str, got: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(got).ok_or(ContagionError::InvalidCount { parameter, got })
}
