//! Benchmark setup error type.
//!
//! Lets fixture builders propagate failures with `?` instead of `.expect()`.

use contagion_core::{ContagionError, GraphError};
use contagion_providers_synthetic::SyntheticError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Graph generation failed.
    #[error("synthetic graph generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// Core configuration or selection failed.
    #[error("contagion operation failed: {0}")]
    Core(#[from] ContagionError),
    /// A graph mutation failed.
    #[error("graph operation failed: {0}")]
    Graph(#[from] GraphError),
    /// A zero value was passed where a non-zero integer was required.
    #[error("expected a non-zero value for {context}")]
    ZeroValue {
        /// A description of the parameter that was unexpectedly zero.
        context: &'static str,
    },
}
