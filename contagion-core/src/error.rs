//! Error types for the contagion core library.
//!
//! Structural and parameter violations are rejected at the API boundary.
//! Stochastic computation itself never fails.

use std::fmt;

use thiserror::Error;

use crate::execution::ExecutionStrategy;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by [`crate::Graph`] operations.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GraphError {
    /// A node identifier fell outside `0..node_count`.
    #[error("node {node} is out of bounds for a graph with {node_count} nodes")]
    NodeOutOfBounds {
        /// The offending node identifier.
        node: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// A node identifier fell outside `0..node_count`.
        NodeOutOfBounds => NodeOutOfBounds { .. } => "GRAPH_NODE_OUT_OF_BOUNDS",
    }
}

/// Error type produced when configuring or running simulations.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ContagionError {
    /// A probability parameter was outside `[0, 1]` or not finite.
    #[error("{parameter} must lie in [0, 1] (got {got})")]
    InvalidProbability {
        /// Name of the parameter, for example `beta`.
        parameter: &'static str,
        /// The rejected value.
        got: f64,
    },
    /// A count parameter that must be positive was zero.
    #[error("{parameter} must be at least 1 (got {got})")]
    InvalidCount {
        /// Name of the parameter, for example `trials`.
        parameter: &'static str,
        /// The rejected value.
        got: usize,
    },
    /// The infection and vaccination budgets do not fit in the graph.
    #[error(
        "{infected} infected plus {vaccinated} vaccinated nodes exceed the {nodes} available nodes"
    )]
    BudgetExceedsNodes {
        /// Requested number of seed infections.
        infected: usize,
        /// Requested number of vaccinations.
        vaccinated: usize,
        /// Nodes available to satisfy both budgets.
        nodes: usize,
    },
    /// A node set that must hold distinct identifiers repeated one.
    #[error("node {node} appears more than once")]
    DuplicateNode {
        /// The repeated node identifier.
        node: usize,
    },
    /// The requested execution strategy is unavailable in the current build.
    #[error("the requested execution strategy {requested:?} is not available in this build")]
    BackendUnavailable {
        /// Strategy that could not be satisfied by the current build.
        requested: ExecutionStrategy,
    },
    /// A [`crate::Graph`] operation failed.
    #[error("graph operation failed: {error}")]
    Graph {
        /// Underlying graph error.
        #[source]
        error: GraphError,
    },
}

define_error_codes! {
    /// Stable codes describing [`ContagionError`] variants.
    enum ContagionErrorCode for ContagionError {
        /// A probability parameter was outside `[0, 1]` or not finite.
        InvalidProbability => InvalidProbability { .. } => "CONTAGION_INVALID_PROBABILITY",
        /// A count parameter that must be positive was zero.
        InvalidCount => InvalidCount { .. } => "CONTAGION_INVALID_COUNT",
        /// The infection and vaccination budgets do not fit in the graph.
        BudgetExceedsNodes => BudgetExceedsNodes { .. } => "CONTAGION_BUDGET_EXCEEDS_NODES",
        /// A node set that must hold distinct identifiers repeated one.
        DuplicateNode => DuplicateNode { .. } => "CONTAGION_DUPLICATE_NODE",
        /// The requested execution strategy is unavailable in the current build.
        BackendUnavailable => BackendUnavailable { .. } => "CONTAGION_BACKEND_UNAVAILABLE",
        /// A [`crate::Graph`] operation failed.
        GraphFailure => Graph { .. } => "CONTAGION_GRAPH_FAILURE",
    }
}

impl ContagionError {
    /// Retrieve the inner [`GraphErrorCode`] when the error originated in a [`crate::Graph`].
    #[must_use]
    pub const fn graph_code(&self) -> Option<GraphErrorCode> {
        match self {
            Self::Graph { error } => Some(error.code()),
            _ => None,
        }
    }
}

impl From<GraphError> for ContagionError {
    fn from(error: GraphError) -> Self {
        Self::Graph { error }
    }
}

pub(crate) fn check_probability(parameter: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ContagionError::InvalidProbability {
            parameter,
            got: value,
        })
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, ContagionError>;
