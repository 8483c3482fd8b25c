#![expect(clippy::expect_used, reason = "tests require contextual panics")]
//! Structural checks for the seeded generators.

use contagion_core::NodeState;
use contagion_providers_synthetic::{barabasi_albert, complete, erdos_renyi};
use rstest::rstest;

#[rstest]
#[case(10, 1)]
#[case(40, 3)]
#[case(100, 5)]
fn barabasi_albert_edge_count(#[case] n: usize, #[case] m: usize) {
    let graph = barabasi_albert(n, m, 10).expect("parameters are valid");
    assert_eq!(graph.node_count(), n);
    assert_eq!(graph.edge_count(), m * (n - m));
    // Every grown node keeps at least its m attachments.
    for node in (m + 1)..n {
        assert!(graph.degree(node) >= m);
    }
}

#[rstest]
fn barabasi_albert_is_deterministic_per_seed() {
    let first = barabasi_albert(60, 2, 7).expect("parameters are valid");
    let second = barabasi_albert(60, 2, 7).expect("parameters are valid");
    for node in 0..60 {
        assert_eq!(first.neighbours(node), second.neighbours(node));
    }
}

#[rstest]
#[case(0.0, 0)]
#[case(1.0, 15)]
fn erdos_renyi_extremes(#[case] p: f64, #[case] edges: usize) {
    let graph = erdos_renyi(6, p, 3).expect("probability is valid");
    assert_eq!(graph.edge_count(), edges);
}

#[rstest]
fn erdos_renyi_is_deterministic_per_seed() {
    let first = erdos_renyi(30, 0.2, 11).expect("probability is valid");
    let second = erdos_renyi(30, 0.2, 11).expect("probability is valid");
    assert_eq!(first.edge_count(), second.edge_count());
    for node in 0..30 {
        assert_eq!(first.neighbours(node), second.neighbours(node));
    }
}

#[rstest]
#[case(0, 0)]
#[case(1, 0)]
#[case(5, 10)]
fn complete_graph_joins_every_pair(#[case] n: usize, #[case] edges: usize) {
    let graph = complete(n).expect("complete graph builds");
    assert_eq!(graph.edge_count(), edges);
    assert!(graph.states().iter().all(|state| *state == NodeState::Susceptible));
    for node in 0..n {
        assert_eq!(graph.degree(node), n - 1);
    }
}
