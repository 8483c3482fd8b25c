//! Command-line interface for vaccination experiments.
//!
//! The `run` command loads or generates a contact graph, compares the
//! requested vaccination strategies and reports the mean infected rate of
//! each over time.

mod commands;

pub use commands::{
    BarabasiAlbertArgs, Cli, CliError, Command, CompleteArgs, DelimiterArg, EdgeListArgs,
    ErdosRenyiArgs, EstimatorArg, ExecutionArg, ExecutionSummary, RunCommand, RunSource, ScopeArg,
    SeedingArg, StrategyArg, render_summary, run_cli,
};
