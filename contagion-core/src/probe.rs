//! Scoped hypothetical vaccinations.

use std::ops::Deref;

use crate::{
    error::GraphError,
    graph::{Graph, NodeId},
    state::NodeState,
};

/// Pins one node of a graph to [`NodeState::Vaccinated`] for as long as the
/// guard lives, restoring the previous state when it is dropped.
///
/// Restoration runs on every exit path, including unwinding.
///
/// # Examples
/// ```
/// use contagion_core::{Graph, NodeState, Probe};
///
/// let mut graph = Graph::from_edges(2, [(0, 1)])?;
/// {
///     let probe = Probe::vaccinate(&mut graph, 1)?;
///     assert_eq!(probe.state(1), Some(NodeState::Vaccinated));
/// }
/// assert_eq!(graph.state(1), Some(NodeState::Susceptible));
/// # Ok::<(), contagion_core::GraphError>(())
/// ```
#[derive(Debug)]
pub struct Probe<'g> {
    graph: &'g mut Graph,
    node: NodeId,
    previous: NodeState,
}

impl<'g> Probe<'g> {
    /// Vaccinates `node` until the returned guard is dropped.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] for unknown nodes; the graph is
    /// left unchanged.
    pub fn vaccinate(graph: &'g mut Graph, node: NodeId) -> Result<Self, GraphError> {
        let previous = graph.set_state(node, NodeState::Vaccinated)?;
        Ok(Self {
            graph,
            node,
            previous,
        })
    }

    /// The node pinned by this probe.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Deref for Probe<'_> {
    type Target = Graph;

    fn deref(&self) -> &Graph {
        self.graph
    }
}

impl Drop for Probe<'_> {
    fn drop(&mut self) {
        // The node was validated on entry, so restoring cannot fail.
        let restored = self.graph.set_state(self.node, self.previous);
        debug_assert!(
            restored.is_ok(),
            "restoring node {} failed: {restored:?}",
            self.node
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::panic::{AssertUnwindSafe, catch_unwind};

    use rstest::rstest;

    #[rstest]
    #[case::susceptible(NodeState::Susceptible)]
    #[case::infected(NodeState::Infected)]
    #[case::vaccinated(NodeState::Vaccinated)]
    fn drop_restores_every_prior_state(#[case] prior: NodeState) {
        let mut graph = Graph::from_edges(3, [(0, 1), (1, 2)]).expect("graph must build");
        graph.set_state(2, prior).expect("node exists");
        {
            let guard = Probe::vaccinate(&mut graph, 2).expect("node exists");
            assert_eq!(guard.state(2), Some(NodeState::Vaccinated));
        }
        assert_eq!(graph.state(2), Some(prior));
        assert_eq!(graph.state(1), Some(NodeState::Susceptible));
    }

    #[test]
    fn restores_infected_state() {
        let mut graph = Graph::from_edges(2, [(0, 1)]).expect("graph must build");
        graph.apply_infection(&[0]).expect("node exists");
        drop(Probe::vaccinate(&mut graph, 0).expect("node exists"));
        assert_eq!(graph.state(0), Some(NodeState::Infected));
    }

    #[test]
    fn restores_on_unwind() {
        let mut graph = Graph::from_edges(2, [(0, 1)]).expect("graph must build");
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let probe = Probe::vaccinate(&mut graph, 1).expect("node exists");
            assert_eq!(probe.node(), 1);
            panic!("probe measurement failed");
        }));
        assert!(outcome.is_err());
        assert_eq!(graph.state(1), Some(NodeState::Susceptible));
    }

    #[test]
    fn rejects_unknown_nodes() {
        let mut graph = Graph::from_edges(1, []).expect("graph must build");
        let err = Probe::vaccinate(&mut graph, 3).expect_err("node 3 does not exist");
        assert!(matches!(err, GraphError::NodeOutOfBounds { node: 3, .. }));
    }
}
