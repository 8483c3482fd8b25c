//! Per-node compartment labels and aggregate counts.

/// Compartment occupied by a single node.
///
/// `Vaccinated` is absorbing: the transition engine never moves a node out of
/// it and vaccinated nodes neither transmit nor receive infection.
///
/// # Examples
/// ```
/// use contagion_core::NodeState;
///
/// assert_eq!(NodeState::default(), NodeState::Susceptible);
/// assert!(NodeState::Infected.is_infected());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// May become infected by an infected neighbour.
    #[default]
    Susceptible,
    /// Currently infectious; may recover back to susceptible.
    Infected,
    /// Immune to contagion in both directions.
    Vaccinated,
}

impl NodeState {
    /// Returns whether the node is susceptible.
    #[rustfmt::skip]
    #[must_use]
    pub const fn is_susceptible(self) -> bool { matches!(self, Self::Susceptible) }

    /// Returns whether the node is infected.
    #[rustfmt::skip]
    #[must_use]
    pub const fn is_infected(self) -> bool { matches!(self, Self::Infected) }

    /// Returns whether the node is vaccinated.
    #[rustfmt::skip]
    #[must_use]
    pub const fn is_vaccinated(self) -> bool { matches!(self, Self::Vaccinated) }
}

/// Number of nodes in each compartment at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateCounts {
    /// Susceptible nodes.
    pub susceptible: usize,
    /// Infected nodes.
    pub infected: usize,
    /// Vaccinated nodes.
    pub vaccinated: usize,
}

impl StateCounts {
    /// Tallies the compartments of `states`.
    ///
    /// # Examples
    /// ```
    /// use contagion_core::{NodeState, StateCounts};
    ///
    /// let counts = StateCounts::tally(&[
    ///     NodeState::Infected,
    ///     NodeState::Susceptible,
    ///     NodeState::Infected,
    /// ]);
    /// assert_eq!(counts.infected, 2);
    /// assert_eq!(counts.total(), 3);
    /// ```
    #[must_use]
    pub fn tally(states: &[NodeState]) -> Self {
        states.iter().fold(Self::default(), |mut counts, state| {
            match state {
                NodeState::Susceptible => counts.susceptible += 1,
                NodeState::Infected => counts.infected += 1,
                NodeState::Vaccinated => counts.vaccinated += 1,
            }
            counts
        })
    }

    /// Total number of nodes counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.susceptible + self.infected + self.vaccinated
    }
}
