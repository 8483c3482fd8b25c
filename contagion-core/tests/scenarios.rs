//! End-to-end scenarios with hand-checked outcomes.

mod common;

use std::num::NonZeroUsize;

use common::{cycle, path};
use contagion_core::{
    CandidateScope, DamageEstimator, DegreeRanking, EstimatorKind, ExecutionStrategy,
    ExposureRanking, Graph, GreedySelector, NodeState, RolloutRunner, ScriptedSource, SeededSource, SisEngine, SisParams,
    immunize, immunize_by_exposure,
};
use rstest::{fixture, rstest};

#[fixture]
fn certain() -> SisEngine {
    SisEngine::new(SisParams::new(1.0, 0.0).expect("parameters are valid"))
}

#[rstest]
fn five_cycle_saturates(certain: SisEngine) {
    let mut graph = cycle(5);
    graph.apply_infection(&[0]).expect("node exists");
    let mean = RolloutRunner::new(certain, 2)
        .with_trials(NonZeroUsize::new(3).expect("non-zero"))
        .with_seed(1)
        .run(&graph)
        .expect("rollouts must run");
    assert_eq!(mean.infected(), &[1.0, 3.0, 5.0]);
    assert_eq!(mean.infected_rate(5), vec![0.2, 0.6, 1.0]);
}

#[rstest]
fn zero_budget_leaves_dynamics_unchanged(certain: SisEngine) {
    let graph = cycle(6);
    let estimator = DamageEstimator::new(certain, EstimatorKind::FastTwoStep);
    let selection = GreedySelector::new(estimator, 0)
        .select(&graph, &[0])
        .expect("selection must succeed");
    assert!(selection.selected().is_empty());

    let mut seeded = graph.clone();
    seeded.apply_infection(&[0]).expect("node exists");
    let runner = RolloutRunner::new(certain, 3);
    let expected = runner.run_once(&seeded, &mut ScriptedSource::new(vec![0.5]));
    let actual = runner.run_once(selection.graph(), &mut ScriptedSource::new(vec![0.5]));
    assert_eq!(actual, expected);
}

#[rstest]
fn small_pool_caps_the_selection(certain: SisEngine) {
    // Star of four leaves; seeding three leaves and the hub leaves one candidate.
    let graph = Graph::from_edges(5, [(0, 1), (0, 2), (0, 3), (0, 4)]).expect("star builds");
    let estimator = DamageEstimator::new(certain, EstimatorKind::FastTwoStep);
    let selection = GreedySelector::new(estimator, 1)
        .select(&graph, &[0, 1, 2, 3])
        .expect("selection must succeed");
    assert_eq!(selection.selected(), &[4]);

    let limited = GreedySelector::new(estimator, 3)
        .with_scope(CandidateScope::Radius(1))
        .select(&path(6), &[0])
        .expect("selection must succeed");
    assert_eq!(limited.selected().len(), 1);
    assert_eq!(limited.shortfall(), 2);
}

#[rstest]
fn isolated_seeds_and_candidates_are_harmless(certain: SisEngine) {
    let graph = Graph::from_edges(4, [(1, 2)]).expect("graph builds");
    let estimator = DamageEstimator::new(certain, EstimatorKind::Rollout { horizon: 3 });
    let selection = GreedySelector::new(estimator, 2)
        .with_scope(CandidateScope::Subgraph(2))
        .select(&graph, &[0])
        .expect("selection must succeed");
    // The neighbourhood of an isolated seed is the seed alone.
    assert!(selection.selected().is_empty());
    assert_eq!(selection.shortfall(), 2);
    assert_eq!(selection.graph().state(0), Some(NodeState::Infected));
}

#[rstest]
fn greedy_beats_degree_on_a_decoy_hub(certain: SisEngine) {
    // Node 0 is a hub of isolated leaves; the outbreak lives on the path 6-7-8-9.
    let mut edges: Vec<_> = (1..=5).map(|leaf| (0, leaf)).collect();
    edges.extend([(6, 7), (7, 8), (8, 9)]);
    let graph = Graph::from_edges(10, edges).expect("graph builds");

    let mut by_degree = graph.clone();
    by_degree.apply_infection(&[6]).expect("node exists");
    assert_eq!(immunize(&mut by_degree, &DegreeRanking, 1).expect("in bounds"), vec![0]);

    let estimator = DamageEstimator::new(certain, EstimatorKind::Rollout { horizon: 3 });
    let greedy = GreedySelector::new(estimator, 1)
        .with_execution_strategy(ExecutionStrategy::Sequential)
        .select(&graph, &[6])
        .expect("selection must succeed");
    assert_eq!(greedy.selected(), &[7]);

    let runner = RolloutRunner::new(certain, 3);
    let degree_final = runner
        .run_once(&by_degree, &mut ScriptedSource::new(vec![0.5]))
        .last()
        .map(|step| step.infected);
    let greedy_final = runner
        .run_once(greedy.graph(), &mut ScriptedSource::new(vec![0.5]))
        .last()
        .map(|step| step.infected);
    assert_eq!(degree_final, Some(4));
    assert_eq!(greedy_final, Some(1));
}

#[rstest]
fn exposure_beats_degree_on_a_decoy_hub(certain: SisEngine) {
    // Same decoy as above: the hub is far from the outbreak on 6-7-8-9.
    let mut edges: Vec<_> = (1..=5).map(|leaf| (0, leaf)).collect();
    edges.extend([(6, 7), (7, 8), (8, 9)]);
    let mut seeded = Graph::from_edges(10, edges).expect("graph builds");
    seeded.apply_infection(&[6]).expect("node exists");

    let mut by_degree = seeded.clone();
    assert_eq!(immunize(&mut by_degree, &DegreeRanking, 1).expect("in bounds"), vec![0]);
    let mut by_exposure = seeded.clone();
    let ranking = ExposureRanking::new(certain.params().beta()).expect("beta is valid");
    assert_eq!(immunize_by_exposure(&mut by_exposure, &ranking, 1).expect("in bounds"), vec![7]);

    let runner = RolloutRunner::new(certain, 3);
    let final_infected = |graph: &Graph| {
        runner
            .run_once(graph, &mut ScriptedSource::new(vec![0.5]))
            .last()
            .map(|step| step.infected)
    };
    assert_eq!(final_infected(&by_degree), Some(4));
    assert_eq!(final_infected(&by_exposure), Some(1));
}

#[rstest]
fn shared_seeds_keep_si_vaccination_monotone() {
    // Circulant graph: every node links to its successor and to the node
    // seven places ahead.
    let nodes = 30;
    let edges = (0..nodes).flat_map(|node| [(node, (node + 1) % nodes), (node, (node + 7) % nodes)]);
    let mut base = Graph::from_edges(nodes, edges).expect("circulant builds");
    base.apply_infection(&[0]).expect("node exists");
    let runner = RolloutRunner::new(
        SisEngine::new(SisParams::new(0.3, 0.0).expect("parameters are valid")),
        10,
    );

    for seed in 0..50 {
        let open = runner.run_once(&base, &mut SeededSource::from_seed(seed));
        for extra in 1..nodes {
            let mut protected = base.clone();
            protected.apply_vaccination(&[extra]).expect("node exists");
            let closed = runner.run_once(&protected, &mut SeededSource::from_seed(seed));
            for (left, right) in open.steps().iter().zip(closed.steps()) {
                assert!(
                    right.infected <= left.infected,
                    "seed={seed} extra={extra} t={}: open={} protected={}",
                    left.time,
                    left.infected,
                    right.infected,
                );
            }
        }
    }
}
