#![allow(dead_code)]

use contagion_core::{Graph, NodeId, NodeState};
use contagion_test_support::profile::ProptestRunProfile;
use proptest::{prelude::*, test_runner::Config as ProptestConfig};

/// Builds a proptest configuration from the shared run profile.
#[must_use]
pub fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

#[must_use]
pub fn cycle(len: usize) -> Graph {
    Graph::from_edges(len, (0..len).map(|node| (node, (node + 1) % len))).expect("cycle must build")
}

#[must_use]
pub fn path(len: usize) -> Graph {
    Graph::from_edges(len, (1..len).map(|node| (node - 1, node))).expect("path must build")
}

/// A graph together with an initial state for every node.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub node_count: usize,
    pub edges: Vec<(NodeId, NodeId)>,
    pub states: Vec<NodeState>,
}

impl Scenario {
    #[must_use]
    pub fn graph(&self) -> Graph {
        let mut graph =
            Graph::from_edges(self.node_count, self.edges.iter().copied()).expect("edges in range");
        for (node, &state) in self.states.iter().enumerate() {
            graph.set_state(node, state).expect("node in range");
        }
        graph
    }
}

fn node_state() -> impl Strategy<Value = NodeState> {
    prop_oneof![
        3 => Just(NodeState::Susceptible),
        1 => Just(NodeState::Infected),
        1 => Just(NodeState::Vaccinated),
    ]
}

/// Random simple graphs of 2 to `max_nodes` nodes with arbitrary states.
pub fn scenario(max_nodes: usize) -> impl Strategy<Value = Scenario> {
    (2..=max_nodes).prop_flat_map(|node_count| {
        (
            prop::collection::vec((0..node_count, 0..node_count), 0..node_count * 3),
            prop::collection::vec(node_state(), node_count),
        )
            .prop_map(move |(edges, states)| Scenario {
                node_count,
                edges,
                states,
            })
    })
}
