//! Greedy vaccination benchmarks.
//!
//! Compares the two-step lookahead estimator with short rollouts. Every
//! greedy iteration probes each candidate, so cost grows with the node
//! count times the budget.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
#![expect(
    clippy::shadow_reuse,
    reason = "Criterion bench_with_input closures rebind parameter names"
)]
use std::num::NonZeroUsize;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use contagion_benches::{
    error::BenchSetupError, fixtures::seeded_barabasi_albert, params::GreedyBenchParams,
};
use contagion_core::{
    CandidateScope, DamageEstimator, EstimatorKind, GreedySelector, SisEngine, SisParams,
};

const SEED: u64 = 7;
const NODE_COUNTS: &[usize] = &[200, 1_000];
const BUDGET: usize = 5;
const INFECTED: usize = 5;
const ROLLOUTS: usize = 4;

fn greedy_select_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("greedy_select");
    group.sample_size(10);

    let rollouts =
        NonZeroUsize::new(ROLLOUTS).ok_or(BenchSetupError::ZeroValue { context: "rollouts" })?;
    let engine = SisEngine::new(SisParams::new(0.4, 0.4)?);
    let estimators = [
        ("fast", EstimatorKind::FastTwoStep),
        ("rollout", EstimatorKind::Rollout { horizon: 4 }),
    ];

    for &node_count in NODE_COUNTS {
        let fixture = seeded_barabasi_albert(node_count, INFECTED, SEED)?;
        for (estimator_label, kind) in estimators {
            let estimator = DamageEstimator::new(engine, kind).with_rollouts(rollouts);
            let bench_params = GreedyBenchParams {
                node_count,
                budget: BUDGET,
                estimator: estimator_label,
            };
            for (scope_label, scope) in [
                ("full", CandidateScope::Full),
                ("radius2", CandidateScope::Radius(2)),
            ] {
                let selector = GreedySelector::new(estimator, BUDGET)
                    .with_scope(scope)
                    .with_seed(SEED);
                group.bench_with_input(
                    BenchmarkId::new(scope_label, &bench_params),
                    &(selector, &fixture),
                    |b, (selector, fixture)| {
                        b.iter(|| selector.select(&fixture.graph, &fixture.seeds));
                    },
                );
            }
        }
    }

    group.finish();
    Ok(())
}

fn greedy_select(c: &mut Criterion) {
    if let Err(err) = greedy_select_impl(c) {
        panic!("greedy_select benchmark setup failed: {err}");
    }
}

criterion_group!(benches, greedy_select);
criterion_main!(benches);
