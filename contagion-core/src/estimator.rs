//! Monte-Carlo estimates of epidemic damage.

use std::num::NonZeroUsize;

use crate::{
    engine::SisEngine,
    error::GraphError,
    graph::{Graph, NodeId},
    probe::Probe,
    rng::UniformSource,
};

/// Default number of rollouts averaged per estimate.
pub const DEFAULT_ESTIMATOR_ROLLOUTS: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(value) => value,
    None => NonZeroUsize::MIN,
};

/// How a single damage sample is produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EstimatorKind {
    /// Full transitions over `horizon` ticks; the sample is the final infected
    /// count.
    Rollout {
        /// Ticks simulated per sample.
        horizon: usize,
    },
    /// [`SisEngine::fast_two_step`] from the infectious frontier; the sample
    /// is the net change in infected count.
    #[default]
    FastTwoStep,
}

/// Estimates the damage of a configuration as a mean over stochastic samples.
///
/// # Examples
/// ```
/// use contagion_core::{DamageEstimator, EstimatorKind, Graph, SeededSource, SisEngine, SisParams};
///
/// let mut graph = Graph::from_edges(3, [(0, 1), (1, 2)])?;
/// graph.apply_infection(&[0])?;
/// let estimator = DamageEstimator::new(
///     SisEngine::new(SisParams::new(1.0, 0.0)?),
///     EstimatorKind::Rollout { horizon: 2 },
/// );
/// let mut rng = SeededSource::from_seed(1);
/// assert_eq!(estimator.estimate(&graph, &mut rng), 3.0);
/// let probed = estimator.estimate_with_probe(&mut graph, 1, &mut rng)?;
/// assert_eq!(probed, 1.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageEstimator {
    engine: SisEngine,
    kind: EstimatorKind,
    rollouts: NonZeroUsize,
}

impl DamageEstimator {
    /// Creates an estimator averaging [`DEFAULT_ESTIMATOR_ROLLOUTS`] samples.
    #[must_use]
    pub fn new(engine: SisEngine, kind: EstimatorKind) -> Self {
        Self {
            engine,
            kind,
            rollouts: DEFAULT_ESTIMATOR_ROLLOUTS,
        }
    }

    /// Overrides the number of samples averaged per estimate.
    #[must_use]
    pub fn with_rollouts(mut self, rollouts: NonZeroUsize) -> Self {
        self.rollouts = rollouts;
        self
    }

    /// Sampling mode.
    #[must_use]
    pub fn kind(&self) -> EstimatorKind {
        self.kind
    }

    /// Samples averaged per estimate.
    #[must_use]
    pub fn rollouts(&self) -> NonZeroUsize {
        self.rollouts
    }

    /// Mean damage of `graph` as it stands. Every sample runs on a private
    /// copy, so `graph` is never modified.
    pub fn estimate<S>(&self, graph: &Graph, rng: &mut S) -> f64
    where
        S: UniformSource + ?Sized,
    {
        let total: f64 = (0..self.rollouts.get())
            .map(|_| self.sample(graph, rng))
            .sum();
        total / self.rollouts.get() as f64
    }

    /// Mean damage of `graph` with `candidate` additionally vaccinated.
    ///
    /// The candidate's previous state is restored before returning.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] for unknown candidates.
    pub fn estimate_with_probe<S>(
        &self,
        graph: &mut Graph,
        candidate: NodeId,
        rng: &mut S,
    ) -> Result<f64, GraphError>
    where
        S: UniformSource + ?Sized,
    {
        let probe = Probe::vaccinate(graph, candidate)?;
        Ok(self.estimate(&probe, rng))
    }

    fn sample<S>(&self, graph: &Graph, rng: &mut S) -> f64
    where
        S: UniformSource + ?Sized,
    {
        match self.kind {
            EstimatorKind::Rollout { horizon } => {
                let mut working = graph.clone();
                for time in 1..=horizon {
                    self.engine.step(&mut working, time, rng);
                }
                working.counts().infected as f64
            }
            EstimatorKind::FastTwoStep => self.engine.fast_two_step(graph, rng) as f64,
        }
    }
}
