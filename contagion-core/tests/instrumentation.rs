//! Instrumentation contract of the public entry points.

mod common;

use std::num::NonZeroUsize;

use common::{cycle, path};
use contagion_core::{
    CandidateScope, DamageEstimator, EstimatorKind, ExecutionStrategy, ExperimentBuilder,
    GreedySelector, RolloutRunner, SeedStrategy, SeededSource, SisEngine, SisParams, Strategy,
    choose_seeds,
};
use contagion_test_support::tracing::RecordingLayer;
use rstest::rstest;
use tracing::Level;

fn engine() -> SisEngine {
    SisEngine::new(SisParams::new(1.0, 0.0).expect("parameters are valid"))
}

#[rstest]
fn rollout_span_records_sizes() {
    let mut graph = cycle(8);
    graph.apply_infection(&[0]).expect("node exists");
    let (result, layer) = RecordingLayer::capture(|| {
        RolloutRunner::new(engine(), 4)
            .with_trials(NonZeroUsize::new(3).expect("non-zero"))
            .with_seed(2)
            .with_execution_strategy(ExecutionStrategy::Sequential)
            .run(&graph)
    });
    result.expect("rollouts must run");
    let span = layer.span_named("core.rollout").expect("rollout span recorded");
    assert_eq!(span.field("nodes"), Some("8"));
    assert_eq!(span.field("horizon"), Some("4"));
    assert_eq!(span.field("trials"), Some("3"));
    assert_eq!(span.field("strategy"), Some("Sequential"));
}

#[rstest]
fn greedy_span_records_candidates_and_warns_on_shortfall() {
    let estimator = DamageEstimator::new(engine(), EstimatorKind::FastTwoStep);
    let (result, layer) = RecordingLayer::capture(|| {
        GreedySelector::new(estimator, 3)
            .with_scope(CandidateScope::Radius(1))
            .with_seed(5)
            .with_execution_strategy(ExecutionStrategy::Sequential)
            .select(&path(6), &[0])
    });
    let selection = result.expect("selection must succeed");
    assert_eq!(selection.shortfall(), 2);

    let span = layer.span_named("core.greedy_select").expect("greedy span recorded");
    assert_eq!(span.field("budget"), Some("3"));
    assert_eq!(span.field("candidates"), Some("1"));
    let warnings = layer.events_at(Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].message(),
        "candidate pool exhausted before the budget was spent"
    );
    assert_eq!(layer.events_at(Level::DEBUG).len(), 1);
}

#[rstest]
fn failing_entry_points_record_errors() {
    let (result, layer) = RecordingLayer::capture(|| {
        choose_seeds(
            &cycle(3),
            4,
            SeedStrategy::Random,
            SeededSource::from_seed(0).rng_mut(),
        )
    });
    assert!(result.is_err());
    assert!(layer.span_named("core.choose_seeds").is_some());
    let errors = layer.events_at(Level::ERROR);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].fields.contains_key("error"));
}

#[rstest]
fn experiment_span_wraps_every_stage() {
    let experiment = ExperimentBuilder::new()
        .with_infected(1)
        .with_vaccinated(1)
        .with_horizon(2)
        .with_trials(2)
        .with_seed(3)
        .with_execution_strategy(ExecutionStrategy::Sequential)
        .build()
        .expect("configuration is valid");
    let (result, layer) = RecordingLayer::capture(|| {
        experiment.run(&cycle(10), &[Strategy::Baseline, Strategy::Greedy])
    });
    result.expect("experiment must run");
    let names: Vec<String> = layer.spans().into_iter().map(|span| span.name).collect();
    for expected in [
        "core.choose_seeds",
        "core.greedy_select",
        "core.rollout",
        "core.experiment_run",
    ] {
        assert!(names.iter().any(|name| name == expected), "missing {expected}: {names:?}");
    }
    assert_eq!(names.last().map(String::as_str), Some("core.experiment_run"));
}
