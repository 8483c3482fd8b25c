//! Benchmark support crate for contagion.
//!
//! Provides seeded graph fixtures and parameter types shared by the
//! Criterion benchmarks for rollouts and greedy selection.

pub mod error;
pub mod fixtures;
pub mod params;
