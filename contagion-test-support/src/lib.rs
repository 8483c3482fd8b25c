//! Shared test utilities used across contagion crates.

pub mod profile;
pub mod tracing;
