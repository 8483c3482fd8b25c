//! Contagion core library: SIS epidemics on static graphs and
//! simulation-driven vaccination.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod engine;
mod error;
mod estimator;
mod execution;
mod experiment;
mod graph;
mod greedy;
mod probe;
mod ranking;
mod rng;
mod rollout;
mod seeding;
mod state;

pub use crate::{
    builder::ExperimentBuilder,
    engine::{FAST_LOOKAHEAD_STEPS, SisEngine, SisParams, StepResult},
    error::{ContagionError, ContagionErrorCode, GraphError, GraphErrorCode, Result},
    estimator::{DEFAULT_ESTIMATOR_ROLLOUTS, DamageEstimator, EstimatorKind},
    execution::ExecutionStrategy,
    experiment::{Experiment, ExperimentReport, Strategy, StrategyOutcome},
    graph::{Graph, NodeId, Subgraph},
    greedy::{CandidateScope, GreedySelection, GreedySelector},
    probe::Probe,
    ranking::{
        BetweennessRanking, DEFAULT_PAGERANK_DAMPING, DEFAULT_PAGERANK_MAX_ITERATIONS,
        DEFAULT_PAGERANK_TOLERANCE, DegreeRanking, ExposureRanking, NodeRanking, PageRankRanking,
        immunize, immunize_by_exposure, top_n_by_score,
    },
    rng::{RngSource, ScriptedSource, SeededSource, TickDraws, UniformSource},
    rollout::{MeanTrajectory, RolloutRunner, Trajectory},
    seeding::{SeedStrategy, choose_seeds},
    state::{NodeState, StateCounts},
};
