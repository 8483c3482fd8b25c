//! Discrete-time SIS transition engine.
//!
//! One call to [`SisEngine::step`] advances every node by exactly one tick
//! with simultaneous-update semantics: all reads see the states as they were
//! at the start of the tick, and all writes are committed together.

use crate::{
    Result,
    error::check_probability,
    graph::Graph,
    rng::{TickDraws, UniformSource},
    state::NodeState,
};

/// Draw slot of an infected node's recovery trial. Transmission trials use
/// `1 + position` of the neighbour in the adjacency list.
const RECOVERY_SLOT: usize = 0;

/// Number of ticks simulated by [`SisEngine::fast_two_step`].
pub const FAST_LOOKAHEAD_STEPS: usize = 2;

/// Validated contagion parameters.
///
/// # Examples
/// ```
/// use contagion_core::SisParams;
///
/// let params = SisParams::new(0.4, 0.2)?;
/// assert_eq!(params.beta(), 0.4);
/// assert!(SisParams::new(1.5, 0.2).is_err());
/// # Ok::<(), contagion_core::ContagionError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SisParams {
    beta: f64,
    gamma: f64,
}

impl SisParams {
    /// Creates a parameter set.
    ///
    /// # Errors
    /// Returns [`crate::ContagionError::InvalidProbability`] when either value
    /// is outside `[0, 1]` or not finite.
    pub fn new(beta: f64, gamma: f64) -> Result<Self> {
        Ok(Self {
            beta: check_probability("beta", beta)?,
            gamma: check_probability("gamma", gamma)?,
        })
    }

    /// Per-tick transmission probability along one infectious contact.
    #[rustfmt::skip]
    #[must_use]
    pub fn beta(&self) -> f64 { self.beta }

    /// Per-tick recovery probability of an infected node.
    #[rustfmt::skip]
    #[must_use]
    pub fn gamma(&self) -> f64 { self.gamma }
}

/// Snapshot recorded after one tick (or at `time == 0`, before any tick).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepResult {
    /// Tick index; `0` is the seeded initial condition.
    pub time: usize,
    /// Infected nodes after the tick.
    pub infected: usize,
    /// Susceptible nodes after the tick.
    pub susceptible: usize,
    /// Vaccinated nodes after the tick. Constant across a rollout.
    pub vaccinated: usize,
    /// Nodes that moved from susceptible to infected during the tick.
    pub newly_infected: usize,
    /// Nodes that moved from infected to susceptible during the tick.
    pub newly_recovered: usize,
}

impl StepResult {
    /// Records the current condition of `graph` as the `t = 0` snapshot.
    #[must_use]
    pub fn initial(graph: &Graph) -> Self {
        Self::observe(graph, 0, 0, 0)
    }

    fn observe(graph: &Graph, time: usize, newly_infected: usize, newly_recovered: usize) -> Self {
        let counts = graph.counts();
        Self {
            time,
            infected: counts.infected,
            susceptible: counts.susceptible,
            vaccinated: counts.vaccinated,
            newly_infected,
            newly_recovered,
        }
    }
}

/// Applies stochastic SIS transitions to a [`Graph`].
///
/// # Examples
/// ```
/// use contagion_core::{Graph, ScriptedSource, SisEngine, SisParams};
///
/// let mut graph = Graph::from_edges(3, [(0, 1), (1, 2)])?;
/// graph.apply_infection(&[0])?;
/// let engine = SisEngine::new(SisParams::new(1.0, 0.0)?);
/// let result = engine.step(&mut graph, 1, &mut ScriptedSource::new(vec![0.5]));
/// assert_eq!(result.infected, 2);
/// assert_eq!(result.newly_infected, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SisEngine {
    params: SisParams,
}

impl SisEngine {
    /// Creates an engine for `params`.
    #[must_use]
    pub fn new(params: SisParams) -> Self {
        Self { params }
    }

    /// Parameters driving this engine.
    #[must_use]
    pub fn params(&self) -> SisParams {
        self.params
    }

    /// Advances `graph` by one tick and reports the resulting counts.
    ///
    /// The tick takes exactly one seed from `rng`; every trial inside it is
    /// keyed on that seed, the tick, the node and the trial's slot. An
    /// infected node draws once against `gamma`. A susceptible node draws
    /// once against `beta` per infected neighbour, in neighbour order, and
    /// stops at the first success. Vaccinated nodes draw nothing, and since
    /// draws are keyed rather than sequential, skipping them never shifts
    /// another node's coin.
    pub fn step<S>(&self, graph: &mut Graph, time: usize, rng: &mut S) -> StepResult
    where
        S: UniformSource + ?Sized,
    {
        let draws = TickDraws::from_source(rng).round(time);
        let current = graph.states();
        let mut next = current.to_vec();
        let mut newly_infected = 0;
        let mut newly_recovered = 0;

        for (node, state) in current.iter().enumerate() {
            match state {
                NodeState::Vaccinated => {}
                NodeState::Infected => {
                    if draws.draw(node, RECOVERY_SLOT) < self.params.gamma {
                        next[node] = NodeState::Susceptible;
                        newly_recovered += 1;
                    }
                }
                NodeState::Susceptible => {
                    let exposed = graph
                        .neighbours(node)
                        .iter()
                        .enumerate()
                        .filter(|&(_, &neighbour)| current[neighbour].is_infected())
                        .any(|(position, _)| {
                            draws.draw(node, RECOVERY_SLOT + 1 + position) < self.params.beta
                        });
                    if exposed {
                        next[node] = NodeState::Infected;
                        newly_infected += 1;
                    }
                }
            }
        }

        graph.commit_states(&next);
        StepResult::observe(graph, time, newly_infected, newly_recovered)
    }

    /// Estimates the net change in infected nodes over
    /// [`FAST_LOOKAHEAD_STEPS`] ticks, expanding only from the infectious
    /// frontier.
    ///
    /// Each round, every frontier node draws against `gamma` and then draws
    /// against `beta` for each neighbour that was susceptible at the start of
    /// the round and has not already been claimed in it. Newly infected nodes
    /// join the next frontier. One seed is taken from `rng` per call and each
    /// round's trials are keyed on it, the same way [`SisEngine::step`] keys a
    /// tick. `graph` is never modified.
    ///
    /// # Examples
    /// ```
    /// use contagion_core::{Graph, ScriptedSource, SisEngine, SisParams};
    ///
    /// let mut graph = Graph::from_edges(4, [(0, 1), (1, 2), (2, 3)])?;
    /// graph.apply_infection(&[0])?;
    /// let engine = SisEngine::new(SisParams::new(1.0, 0.0)?);
    /// let change = engine.fast_two_step(&graph, &mut ScriptedSource::new(vec![0.5]));
    /// assert_eq!(change, 2);
    /// assert_eq!(graph.counts().infected, 1);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn fast_two_step<S>(&self, graph: &Graph, rng: &mut S) -> i64
    where
        S: UniformSource + ?Sized,
    {
        let seed = TickDraws::from_source(rng);
        let mut states = graph.states().to_vec();
        let mut frontier = graph.nodes_in(NodeState::Infected);
        let mut change = 0_i64;

        for round in 0..FAST_LOOKAHEAD_STEPS {
            let draws = seed.round(round);
            let start = states.clone();
            let mut next_frontier = Vec::with_capacity(frontier.len());
            for &node in &frontier {
                if draws.draw(node, RECOVERY_SLOT) < self.params.gamma {
                    states[node] = NodeState::Susceptible;
                    change -= 1;
                } else {
                    next_frontier.push(node);
                }
                for (position, &neighbour) in graph.neighbours(node).iter().enumerate() {
                    if start[neighbour].is_susceptible()
                        && states[neighbour].is_susceptible()
                        && draws.draw(node, RECOVERY_SLOT + 1 + position) < self.params.beta
                    {
                        states[neighbour] = NodeState::Infected;
                        change += 1;
                        next_frontier.push(neighbour);
                    }
                }
            }
            frontier = next_frontier;
        }
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::{fixture, rstest};

    use crate::rng::ScriptedSource;

    #[fixture]
    fn star() -> Graph {
        Graph::from_edges(4, [(0, 1), (0, 2), (0, 3)]).expect("star must build")
    }

    fn engine(beta: f64, gamma: f64) -> SisEngine {
        SisEngine::new(SisParams::new(beta, gamma).expect("parameters are valid"))
    }

    #[rstest]
    #[case::negative_beta(-0.1, 0.5, "beta")]
    #[case::large_gamma(0.5, 1.01, "gamma")]
    #[case::nan_beta(f64::NAN, 0.5, "beta")]
    fn params_reject_out_of_range(#[case] beta: f64, #[case] gamma: f64, #[case] name: &str) {
        let err = SisParams::new(beta, gamma).expect_err("parameters must be rejected");
        assert!(matches!(
            err,
            crate::ContagionError::InvalidProbability { parameter, .. } if parameter == name
        ));
    }

    #[rstest]
    fn updates_are_simultaneous() {
        // Path 0-1-2: node 2 must not see node 1's infection in the same tick.
        let mut graph = Graph::from_edges(3, [(0, 1), (1, 2)]).expect("path must build");
        graph.apply_infection(&[0]).expect("node exists");
        let result = engine(1.0, 0.0).step(&mut graph, 1, &mut ScriptedSource::new(vec![0.0]));
        assert_eq!(graph.states()[2], NodeState::Susceptible);
        assert_eq!(result.infected, 2);
    }

    #[rstest]
    fn each_tick_takes_one_seed(mut star: Graph) {
        star.apply_infection(&[1, 2, 3]).expect("nodes exist");
        let mut source = ScriptedSource::new(vec![0.9, 0.1]);
        let engine = engine(0.5, 0.5);
        engine.step(&mut star, 1, &mut source);
        assert_eq!(source.draws(), 1);
        engine.step(&mut star, 2, &mut source);
        assert_eq!(source.draws(), 2);
    }

    #[rstest]
    #[case::tick_one(1, 0.3)]
    #[case::tick_two(2, 0.7)]
    #[case::late_tick(9, 0.55)]
    fn vaccinating_a_susceptible_node_leaves_other_outcomes_alone(
        #[case] time: usize,
        #[case] seed_draw: f64,
    ) {
        // Ring of eight with chords: node 5 is susceptible and gets vaccinated.
        let edges = (0..8).flat_map(|node| [(node, (node + 1) % 8), (node, (node + 3) % 8)]);
        let mut open = Graph::from_edges(8, edges).expect("ring must build");
        open.apply_infection(&[0, 2, 6]).expect("nodes exist");
        let mut blocked = open.clone();
        blocked.apply_vaccination(&[5]).expect("node exists");

        let engine = engine(0.5, 0.5);
        engine.step(&mut open, time, &mut ScriptedSource::new(vec![seed_draw]));
        engine.step(&mut blocked, time, &mut ScriptedSource::new(vec![seed_draw]));

        for node in (0..8).filter(|&node| node != 5) {
            assert_eq!(open.state(node), blocked.state(node), "node {node}");
        }
        assert_eq!(blocked.state(5), Some(NodeState::Vaccinated));
    }

    #[rstest]
    fn certain_recovery_clears_infection(mut star: Graph) {
        star.apply_infection(&[1]).expect("node exists");
        star.apply_vaccination(&[0]).expect("node exists");
        let result = engine(1.0, 1.0).step(&mut star, 1, &mut ScriptedSource::new(vec![0.2]));
        assert_eq!(result.newly_recovered, 1);
        assert_eq!(result.infected, 0);
        assert_eq!(result.vaccinated, 1);
    }

    #[rstest]
    fn vaccinated_nodes_block_transmission(mut star: Graph) {
        star.apply_infection(&[1]).expect("node exists");
        star.apply_vaccination(&[0]).expect("node exists");
        let result = engine(1.0, 0.0).step(&mut star, 1, &mut ScriptedSource::new(vec![0.0]));
        assert_eq!(result.newly_infected, 0);
        assert_eq!(star.counts().infected, 1);
        assert_eq!(star.state(0), Some(NodeState::Vaccinated));
    }

    #[rstest]
    fn fast_two_step_counts_each_infection_once(mut star: Graph) {
        // Two infected leaves both reach the centre; it is infected once.
        star.apply_infection(&[1, 2]).expect("nodes exist");
        let change = engine(1.0, 0.0).fast_two_step(&star, &mut ScriptedSource::new(vec![0.5]));
        // Round one infects the centre, round two the last leaf.
        assert_eq!(change, 2);
    }

    #[rstest]
    fn fast_two_step_tracks_recoveries(mut star: Graph) {
        star.apply_infection(&[0]).expect("node exists");
        let mut source = ScriptedSource::new(vec![0.5]);
        let change = engine(0.0, 1.0).fast_two_step(&star, &mut source);
        assert_eq!(change, -1);
        assert_eq!(source.draws(), 1);
        assert_eq!(star.counts().infected, 1);
    }
}
