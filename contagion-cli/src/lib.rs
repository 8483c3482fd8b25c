//! Support library for the contagion CLI binary.
//!
//! Exposes the command pipeline and logging setup so doctests and
//! integration tests can drive experiments without spawning a subprocess.

pub mod cli;
pub mod logging;
