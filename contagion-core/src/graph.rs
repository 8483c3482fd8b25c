//! Graph store shared by every simulation in the crate.
//!
//! A [`Graph`] pairs an immutable adjacency structure with a small mutable
//! state array. Cloning a graph copies only the state array; the topology is
//! reference counted, so independent rollouts and greedy probes can branch
//! from one graph without paying for an edge copy.

use std::{collections::VecDeque, sync::Arc};

use crate::{
    error::GraphError,
    state::{NodeState, StateCounts},
};

/// Dense node identifier in `0..node_count`.
pub type NodeId = usize;

/// Compressed adjacency lists. Neighbours of each node are sorted ascending.
#[derive(Debug)]
struct Topology {
    offsets: Vec<usize>,
    targets: Vec<NodeId>,
    edge_count: usize,
}

impl Topology {
    fn neighbours(&self, node: NodeId) -> &[NodeId] {
        match (self.offsets.get(node), self.offsets.get(node + 1)) {
            (Some(&start), Some(&end)) => &self.targets[start..end],
            _ => &[],
        }
    }
}

/// Undirected, unweighted, simple graph with one [`NodeState`] per node.
///
/// Edges never change after construction. Only node states are mutable.
///
/// # Examples
/// ```
/// use contagion_core::{Graph, NodeState};
///
/// let mut graph = Graph::from_edges(3, [(0, 1), (1, 2)])?;
/// assert_eq!(graph.neighbours(1), &[0, 2]);
///
/// let branch = graph.clone();
/// graph.set_state(0, NodeState::Infected)?;
/// assert_eq!(branch.state(0), Some(NodeState::Susceptible));
/// assert!(graph.shares_topology(&branch));
/// # Ok::<(), contagion_core::GraphError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Graph {
    topology: Arc<Topology>,
    states: Vec<NodeState>,
}

impl Graph {
    /// Builds a graph with `node_count` susceptible nodes and the given edges.
    ///
    /// Self-loops and repeated edges (in either orientation) are discarded so
    /// the result is always simple.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] when an edge endpoint is not
    /// below `node_count`.
    pub fn from_edges<I>(node_count: usize, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut pairs = Vec::new();
        for (left, right) in edges {
            for node in [left, right] {
                if node >= node_count {
                    return Err(GraphError::NodeOutOfBounds { node, node_count });
                }
            }
            if left != right {
                pairs.push((left.min(right), left.max(right)));
            }
        }
        pairs.sort_unstable();
        pairs.dedup();

        let mut degrees = vec![0_usize; node_count];
        for &(left, right) in &pairs {
            degrees[left] += 1;
            degrees[right] += 1;
        }
        let mut offsets = Vec::with_capacity(node_count + 1);
        offsets.push(0);
        let mut running = 0;
        for degree in &degrees {
            running += degree;
            offsets.push(running);
        }

        // Sorted pair order fills every list in ascending neighbour order.
        let mut cursor = offsets.clone();
        let mut targets = vec![0; running];
        for &(left, right) in &pairs {
            targets[cursor[left]] = right;
            cursor[left] += 1;
            targets[cursor[right]] = left;
            cursor[right] += 1;
        }

        Ok(Self {
            topology: Arc::new(Topology {
                offsets,
                targets,
                edge_count: pairs.len(),
            }),
            states: vec![NodeState::Susceptible; node_count],
        })
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.states.len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.topology.edge_count
    }

    /// Returns whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Neighbours of `node` in ascending order. Unknown nodes have none.
    #[must_use]
    pub fn neighbours(&self, node: NodeId) -> &[NodeId] {
        self.topology.neighbours(node)
    }

    /// Number of neighbours of `node`.
    #[must_use]
    pub fn degree(&self, node: NodeId) -> usize {
        self.neighbours(node).len()
    }

    /// State of `node`, or `None` when it does not exist.
    #[must_use]
    pub fn state(&self, node: NodeId) -> Option<NodeState> {
        self.states.get(node).copied()
    }

    /// States of every node indexed by identifier.
    #[must_use]
    pub fn states(&self) -> &[NodeState] {
        &self.states
    }

    /// Overwrites the state of `node` and returns the previous state.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] for unknown nodes.
    pub fn set_state(&mut self, node: NodeId, state: NodeState) -> Result<NodeState, GraphError> {
        let node_count = self.node_count();
        let slot = self
            .states
            .get_mut(node)
            .ok_or(GraphError::NodeOutOfBounds { node, node_count })?;
        Ok(std::mem::replace(slot, state))
    }

    /// Marks every node in `nodes` as infected.
    ///
    /// Nothing is modified unless every identifier is valid.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] for unknown nodes.
    pub fn apply_infection(&mut self, nodes: &[NodeId]) -> Result<(), GraphError> {
        self.apply_state(nodes, NodeState::Infected)
    }

    /// Marks every node in `nodes` as vaccinated, overriding prior states.
    ///
    /// Nothing is modified unless every identifier is valid.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] for unknown nodes.
    pub fn apply_vaccination(&mut self, nodes: &[NodeId]) -> Result<(), GraphError> {
        self.apply_state(nodes, NodeState::Vaccinated)
    }

    fn apply_state(&mut self, nodes: &[NodeId], state: NodeState) -> Result<(), GraphError> {
        self.check_nodes(nodes)?;
        for &node in nodes {
            self.states[node] = state;
        }
        Ok(())
    }

    /// Validates that every identifier in `nodes` exists.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] for the first unknown node.
    pub fn check_nodes(&self, nodes: &[NodeId]) -> Result<(), GraphError> {
        let node_count = self.node_count();
        match nodes.iter().find(|&&node| node >= node_count) {
            Some(&node) => Err(GraphError::NodeOutOfBounds { node, node_count }),
            None => Ok(()),
        }
    }

    /// Tallies the current compartments.
    #[must_use]
    pub fn counts(&self) -> StateCounts {
        StateCounts::tally(&self.states)
    }

    /// Identifiers of every node in `state`, ascending.
    #[must_use]
    pub fn nodes_in(&self, state: NodeState) -> Vec<NodeId> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, current)| **current == state)
            .map(|(node, _)| node)
            .collect()
    }

    /// Returns whether `self` and `other` were branched from the same graph.
    #[must_use]
    pub fn shares_topology(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.topology, &other.topology)
    }

    /// Nodes reachable from `sources` in at most `radius` hops, ascending.
    ///
    /// Sources are included. Unknown sources are ignored.
    #[must_use]
    pub fn within_radius(&self, sources: &[NodeId], radius: usize) -> Vec<NodeId> {
        let mut hops = vec![None; self.node_count()];
        let mut queue = VecDeque::new();
        for &source in sources {
            if let Some(slot) = hops.get_mut(source)
                && slot.is_none()
            {
                *slot = Some(0_usize);
                queue.push_back(source);
            }
        }
        while let Some(node) = queue.pop_front() {
            let Some(Some(depth)) = hops.get(node).copied() else {
                continue;
            };
            if depth == radius {
                continue;
            }
            for &next in self.neighbours(node) {
                if hops[next].is_none() {
                    hops[next] = Some(depth + 1);
                    queue.push_back(next);
                }
            }
        }
        hops.iter()
            .enumerate()
            .filter_map(|(node, depth)| depth.map(|_| node))
            .collect()
    }

    /// Extracts the subgraph induced by the nodes within `radius` hops of
    /// `sources`, carrying their current states.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] when a source does not exist.
    pub fn neighbourhood(&self, sources: &[NodeId], radius: usize) -> Result<Subgraph, GraphError> {
        self.check_nodes(sources)?;
        let members = self.within_radius(sources, radius);
        let mut local_of = vec![None; self.node_count()];
        for (local, &global) in members.iter().enumerate() {
            local_of[global] = Some(local);
        }
        let edges = members.iter().enumerate().flat_map(|(local, &global)| {
            let local_of = &local_of;
            self.neighbours(global)
                .iter()
                .filter_map(move |&next| local_of[next].map(|other| (local, other)))
        });
        let mut graph = Self::from_edges(members.len(), edges)?;
        for (local, &global) in members.iter().enumerate() {
            graph.states[local] = self.states[global];
        }
        Ok(Subgraph {
            graph,
            members,
            local_of,
        })
    }

    /// Replaces every state at once. `next` must cover every node.
    pub(crate) fn commit_states(&mut self, next: &[NodeState]) {
        debug_assert_eq!(next.len(), self.states.len());
        self.states.copy_from_slice(next);
    }
}

/// A radius-limited view of a larger [`Graph`] with its own dense labels.
///
/// # Examples
/// ```
/// use contagion_core::Graph;
///
/// let graph = Graph::from_edges(5, [(0, 1), (1, 2), (2, 3), (3, 4)])?;
/// let sub = graph.neighbourhood(&[2], 1)?;
/// assert_eq!(sub.members(), &[1, 2, 3]);
/// assert_eq!(sub.graph().edge_count(), 2);
/// assert_eq!(sub.to_local(3), Some(2));
/// # Ok::<(), contagion_core::GraphError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Subgraph {
    graph: Graph,
    members: Vec<NodeId>,
    local_of: Vec<Option<NodeId>>,
}

impl Subgraph {
    /// The extracted graph, labelled `0..members().len()`.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Parent identifiers of the extracted nodes, indexed by local id.
    #[must_use]
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Maps a local identifier back to the parent graph.
    #[must_use]
    pub fn to_parent(&self, local: NodeId) -> Option<NodeId> {
        self.members.get(local).copied()
    }

    /// Maps a parent identifier into the subgraph, if it was extracted.
    #[must_use]
    pub fn to_local(&self, parent: NodeId) -> Option<NodeId> {
        self.local_of.get(parent).copied().flatten()
    }
}
