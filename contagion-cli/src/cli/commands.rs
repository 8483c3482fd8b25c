//! Command implementations and argument parsing for the contagion CLI.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use contagion_core::{
    CandidateScope, ContagionError, EstimatorKind, ExecutionStrategy, ExperimentBuilder,
    ExperimentReport, Graph, GraphErrorCode, NodeId, SeedStrategy, Strategy,
};
use contagion_providers_edgelist::{Delimiter, EdgeListError, EdgeListProvider};
use contagion_providers_synthetic::{SyntheticError, barabasi_albert, complete, erdos_renyi};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

const DEFAULT_BETA: f64 = 0.4;
const DEFAULT_GAMMA: f64 = 0.4;
const DEFAULT_T_MAX: usize = 12;
const DEFAULT_INFECTED: usize = 5;
const DEFAULT_VACCINATED: usize = 5;
const DEFAULT_TRIALS: usize = 10;
const DEFAULT_ROLLOUTS: usize = 10;
const DEFAULT_RADIUS: usize = 2;
const DEFAULT_ATTACHMENT: usize = 3;
const DEFAULT_GRAPH_SEED: u64 = 10;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "contagion",
    about = "Compare vaccination strategies against simulated SIS outbreaks."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a vaccination experiment and print the mean infected rates.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Per-contact infection probability.
    #[arg(long, default_value_t = DEFAULT_BETA)]
    pub beta: f64,

    /// Per-step recovery probability.
    #[arg(long, default_value_t = DEFAULT_GAMMA)]
    pub gamma: f64,

    /// Number of simulated time steps.
    #[arg(long = "t-max", default_value_t = DEFAULT_T_MAX)]
    pub t_max: usize,

    /// Number of initially infected nodes.
    #[arg(long = "n-inf", default_value_t = DEFAULT_INFECTED)]
    pub n_inf: usize,

    /// Vaccination budget per strategy.
    #[arg(long = "n-vac", default_value_t = DEFAULT_VACCINATED)]
    pub n_vac: usize,

    /// Independent trials averaged per strategy.
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    pub trials: usize,

    /// Samples averaged per greedy damage estimate.
    #[arg(long, default_value_t = DEFAULT_ROLLOUTS)]
    pub rollouts: usize,

    /// Damage estimator used by the greedy strategy.
    #[arg(long, value_enum, default_value_t = EstimatorArg::FastTwoStep)]
    pub estimator: EstimatorArg,

    /// Horizon of the rollout estimator (defaults to `--t-max`).
    #[arg(long = "estimator-horizon")]
    pub estimator_horizon: Option<usize>,

    /// Candidate pool of the greedy strategy.
    #[arg(long, value_enum, default_value_t = ScopeArg::Full)]
    pub scope: ScopeArg,

    /// Hop radius used by the `radius` and `subgraph` scopes.
    #[arg(long, default_value_t = DEFAULT_RADIUS)]
    pub radius: usize,

    /// Placement of the initial infections.
    #[arg(long, value_enum, default_value_t = SeedingArg::Random)]
    pub seeding: SeedingArg,

    /// Experiment seed; drawn from entropy when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Strategies to compare, comma separated (defaults to all).
    #[arg(long = "strategy", value_enum, value_delimiter = ',')]
    pub strategies: Vec<StrategyArg>,

    /// Execution strategy for trials and probes.
    #[arg(long, value_enum, default_value_t = ExecutionArg::Auto)]
    pub execution: ExecutionArg,

    /// Contact graph source.
    #[command(subcommand)]
    pub source: RunSource,
}

/// Contact graph sources.
#[derive(Debug, Subcommand, Clone)]
pub enum RunSource {
    /// Read an edge list, keeping its largest connected component.
    EdgeList(EdgeListArgs),
    /// Generate a Barabási–Albert preferential-attachment graph.
    BarabasiAlbert(BarabasiAlbertArgs),
    /// Generate an Erdős–Rényi random graph.
    ErdosRenyi(ErdosRenyiArgs),
    /// Generate a complete graph.
    Complete(CompleteArgs),
}

/// Edge-list ingestion arguments.
#[derive(Debug, Args, Clone)]
pub struct EdgeListArgs {
    /// Path to a file with two node labels per line.
    pub path: PathBuf,

    /// Column separator.
    #[arg(long, value_enum, default_value_t = DelimiterArg::Tab)]
    pub delimiter: DelimiterArg,

    /// Keep every connected component.
    #[arg(long = "all-components")]
    pub all_components: bool,
}

/// Barabási–Albert generator arguments.
#[derive(Debug, Args, Clone)]
pub struct BarabasiAlbertArgs {
    /// Number of nodes.
    #[arg(long)]
    pub nodes: usize,

    /// Edges attached per new node.
    #[arg(long, default_value_t = DEFAULT_ATTACHMENT)]
    pub attachment: usize,

    /// Generator seed.
    #[arg(long = "graph-seed", default_value_t = DEFAULT_GRAPH_SEED)]
    pub graph_seed: u64,
}

/// Erdős–Rényi generator arguments.
#[derive(Debug, Args, Clone)]
pub struct ErdosRenyiArgs {
    /// Number of nodes.
    #[arg(long)]
    pub nodes: usize,

    /// Probability of each possible edge.
    #[arg(long)]
    pub probability: f64,

    /// Generator seed.
    #[arg(long = "graph-seed", default_value_t = DEFAULT_GRAPH_SEED)]
    pub graph_seed: u64,
}

/// Complete graph arguments.
#[derive(Debug, Args, Clone)]
pub struct CompleteArgs {
    /// Number of nodes.
    #[arg(long)]
    pub nodes: usize,
}

/// Edge-list column separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DelimiterArg {
    /// A single tab.
    Tab,
    /// A single comma.
    Comma,
    /// Any run of whitespace.
    Whitespace,
}

impl From<DelimiterArg> for Delimiter {
    fn from(value: DelimiterArg) -> Self {
        match value {
            DelimiterArg::Tab => Self::Tab,
            DelimiterArg::Comma => Self::Comma,
            DelimiterArg::Whitespace => Self::Whitespace,
        }
    }
}

/// Damage estimators selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EstimatorArg {
    /// Two-step lookahead of the infected count change.
    FastTwoStep,
    /// Full rollouts to the estimator horizon.
    Rollout,
}

/// Greedy candidate pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Every susceptible node.
    Full,
    /// Susceptible nodes within `--radius` hops of a seed.
    Radius,
    /// Selection on the subgraph within `--radius` hops of a seed.
    Subgraph,
}

/// Seed placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeedingArg {
    /// Uniformly random susceptible nodes.
    Random,
    /// A connected cluster grown breadth first.
    Cluster,
}

/// Vaccination strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// No vaccination.
    Baseline,
    /// Highest degree first.
    Degree,
    /// Highest PageRank first.
    Pagerank,
    /// Highest betweenness first.
    Betweenness,
    /// Most infected contacts first, re-scored after every pick.
    Exposure,
    /// Simulation-driven greedy selection.
    Greedy,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Baseline => Self::Baseline,
            StrategyArg::Degree => Self::Degree,
            StrategyArg::Pagerank => Self::PageRank,
            StrategyArg::Betweenness => Self::Betweenness,
            StrategyArg::Exposure => Self::Exposure,
            StrategyArg::Greedy => Self::Greedy,
        }
    }
}

/// Execution strategies for trials and probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionArg {
    /// Parallel when available.
    Auto,
    /// Always on the calling thread.
    Sequential,
    /// Always on the rayon pool.
    Parallel,
}

impl From<ExecutionArg> for ExecutionStrategy {
    fn from(value: ExecutionArg) -> Self {
        match value {
            ExecutionArg::Auto => Self::Auto,
            ExecutionArg::Sequential => Self::Sequential,
            ExecutionArg::Parallel => Self::Parallel,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Edge-list ingestion failed.
    #[error(transparent)]
    EdgeList(#[from] EdgeListError),
    /// Graph generation failed.
    #[error(transparent)]
    Synthetic(#[from] SyntheticError),
    /// Experiment configuration or execution failed.
    #[error(transparent)]
    Core(#[from] ContagionError),
}

impl CliError {
    /// Stable machine-readable code for logging.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EdgeList(EdgeListError::EmptyInput) => "EDGELIST_EMPTY_INPUT",
            Self::EdgeList(EdgeListError::MissingColumn { .. }) => "EDGELIST_MISSING_COLUMN",
            Self::EdgeList(EdgeListError::Graph(_)) => "EDGELIST_GRAPH",
            Self::EdgeList(EdgeListError::Io(_)) => "EDGELIST_IO",
            Self::Synthetic(SyntheticError::InvalidAttachment { .. }) => {
                "SYNTHETIC_INVALID_ATTACHMENT"
            }
            Self::Synthetic(SyntheticError::InvalidProbability { .. }) => {
                "SYNTHETIC_INVALID_PROBABILITY"
            }
            Self::Synthetic(SyntheticError::Graph(_)) => "SYNTHETIC_GRAPH",
            Self::Core(error) => error.code().as_str(),
        }
    }

    /// Code of the underlying graph failure, if any.
    #[must_use]
    pub fn graph_code(&self) -> Option<GraphErrorCode> {
        match self {
            Self::EdgeList(EdgeListError::Graph(error))
            | Self::Synthetic(SyntheticError::Graph(error)) => Some(error.code()),
            Self::Core(error) => error.graph_code(),
            _ => None,
        }
    }
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Human-readable description of the graph source.
    pub source: String,
    /// Nodes dropped while loading the graph.
    pub discarded_nodes: usize,
    /// Input labels indexed by node id, for edge-list sources.
    pub labels: Option<Vec<String>>,
    /// Per-strategy results.
    pub report: ExperimentReport,
}

impl ExecutionSummary {
    /// Input label of `node`, or its id when the source had no labels.
    #[must_use]
    pub fn node_name(&self, node: NodeId) -> String {
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(node))
            .map_or_else(|| node.to_string(), Clone::clone)
    }
}

/// A graph together with what is known about where it came from.
#[derive(Debug)]
pub(super) struct LoadedGraph {
    pub(super) source: String,
    pub(super) graph: Graph,
    pub(super) discarded_nodes: usize,
    pub(super) labels: Option<Vec<String>>,
}

impl LoadedGraph {
    fn synthetic(source: String, graph: Graph) -> Self {
        Self {
            source,
            graph,
            discarded_nodes: 0,
            labels: None,
        }
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading the graph or running the experiment
/// fails.
///
/// # Examples
/// ```
/// use clap::Parser;
/// use contagion_cli::cli::{Cli, run_cli};
///
/// let cli = Cli::try_parse_from([
///     "contagion", "run", "--n-inf", "1", "--n-vac", "1", "--trials", "2",
///     "--seed", "4", "--strategy", "baseline,degree", "complete", "--nodes", "6",
/// ])?;
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.report.outcomes().len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(source = field::Empty, nodes = field::Empty, strategies = field::Empty),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let experiment = experiment_builder(&command).build()?;
    let strategies = selected_strategies(&command.strategies);

    let span = Span::current();
    span.record("strategies", strategies.len());

    let LoadedGraph {
        source,
        graph,
        discarded_nodes,
        labels,
    } = load_graph(command.source)?;
    span.record("source", field::display(&source));
    span.record("nodes", graph.node_count());

    let report = experiment.run(&graph, &strategies)?;
    info!(
        source = source.as_str(),
        nodes = report.node_count(),
        strategies = report.outcomes().len(),
        "command completed"
    );
    Ok(ExecutionSummary {
        source,
        discarded_nodes,
        labels,
        report,
    })
}

pub(super) fn experiment_builder(command: &RunCommand) -> ExperimentBuilder {
    let estimator = match command.estimator {
        EstimatorArg::FastTwoStep => EstimatorKind::FastTwoStep,
        EstimatorArg::Rollout => EstimatorKind::Rollout {
            horizon: command.estimator_horizon.unwrap_or(command.t_max),
        },
    };
    let scope = match command.scope {
        ScopeArg::Full => CandidateScope::Full,
        ScopeArg::Radius => CandidateScope::Radius(command.radius),
        ScopeArg::Subgraph => CandidateScope::Subgraph(command.radius),
    };
    let seeding = match command.seeding {
        SeedingArg::Random => SeedStrategy::Random,
        SeedingArg::Cluster => SeedStrategy::Cluster,
    };
    let builder = ExperimentBuilder::new()
        .with_beta(command.beta)
        .with_gamma(command.gamma)
        .with_horizon(command.t_max)
        .with_infected(command.n_inf)
        .with_vaccinated(command.n_vac)
        .with_trials(command.trials)
        .with_estimator_rollouts(command.rollouts)
        .with_estimator(estimator)
        .with_candidate_scope(scope)
        .with_seeding(seeding)
        .with_execution_strategy(command.execution.into());
    match command.seed {
        Some(seed) => builder.with_seed(seed),
        None => builder,
    }
}

pub(super) fn selected_strategies(requested: &[StrategyArg]) -> Vec<Strategy> {
    if requested.is_empty() {
        return Strategy::ALL.to_vec();
    }
    let mut strategies: Vec<Strategy> = Vec::with_capacity(requested.len());
    for strategy in requested.iter().copied().map(Strategy::from) {
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    strategies
}

#[instrument(name = "cli.load_graph", err, skip(source))]
pub(super) fn load_graph(source: RunSource) -> Result<LoadedGraph, CliError> {
    match source {
        RunSource::EdgeList(args) => {
            let mut provider = EdgeListProvider::new().with_delimiter(args.delimiter.into());
            if args.all_components {
                provider = provider.with_all_components();
            }
            let edges = provider.open(&args.path)?;
            let discarded_nodes = edges.discarded_nodes();
            let labels = edges.labels().to_vec();
            Ok(LoadedGraph {
                source: derive_source_name(&args.path),
                graph: edges.into_graph(),
                discarded_nodes,
                labels: Some(labels),
            })
        }
        RunSource::BarabasiAlbert(args) => {
            let graph = barabasi_albert(args.nodes, args.attachment, args.graph_seed)?;
            let name = format!("barabasi-albert(n={}, m={})", args.nodes, args.attachment);
            Ok(LoadedGraph::synthetic(name, graph))
        }
        RunSource::ErdosRenyi(args) => {
            let graph = erdos_renyi(args.nodes, args.probability, args.graph_seed)?;
            let name = format!("erdos-renyi(n={}, p={})", args.nodes, args.probability);
            Ok(LoadedGraph::synthetic(name, graph))
        }
        RunSource::Complete(args) => {
            let graph = complete(args.nodes)?;
            Ok(LoadedGraph::synthetic(format!("complete(n={})", args.nodes), graph))
        }
    }
}

pub(super) fn derive_source_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|value| value.to_str())
        .map_or_else(|| "edge_list".to_owned(), ToOwned::to_owned)
}

/// Renders `summary` to `writer` as a tab-separated table.
///
/// Metadata lines start with `#`; nodes in them are printed by input label
/// when the source had labels. The table has one row per time step and one
/// column per strategy holding the mean infected rate.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let report = &summary.report;
    writeln!(writer, "# source: {}", summary.source)?;
    writeln!(
        writer,
        "# nodes: {} (discarded {})",
        report.node_count(),
        summary.discarded_nodes
    )?;
    writeln!(writer, "# seeds: {}", join_nodes(summary, report.seeds()))?;
    for outcome in report.outcomes() {
        writeln!(
            writer,
            "# {} vaccinated: {}",
            outcome.strategy(),
            join_nodes(summary, outcome.vaccinated())
        )?;
    }

    write!(writer, "t")?;
    for outcome in report.outcomes() {
        write!(writer, "\t{}", outcome.strategy())?;
    }
    writeln!(writer)?;

    let rates: Vec<Vec<f64>> = report
        .outcomes()
        .iter()
        .map(|outcome| outcome.mean().infected_rate(report.node_count()))
        .collect();
    let steps = rates.iter().map(Vec::len).max().unwrap_or_default();
    for time in 0..steps {
        write!(writer, "{time}")?;
        for series in &rates {
            match series.get(time) {
                Some(rate) => write!(writer, "\t{rate:.6}")?,
                None => write!(writer, "\t")?,
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn join_nodes(summary: &ExecutionSummary, nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(|&node| summary.node_name(node))
        .collect::<Vec<_>>()
        .join(",")
}
