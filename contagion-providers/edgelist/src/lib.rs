//! Edge-list provider producing contact graphs for the contagion core.
//!
//! Reads two node labels per line, drops self-loops and repeated edges,
//! keeps the largest connected component, and relabels the survivors to
//! `0..n` in order of first appearance.

use std::{
    collections::{HashMap, VecDeque},
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use contagion_core::{Graph, GraphError, NodeId};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors raised while ingesting an edge list.
#[derive(Debug, Error)]
pub enum EdgeListError {
    /// The input held no edge lines.
    #[error("edge list contains no edges")]
    EmptyInput,
    /// A line held fewer than two labels.
    #[error("line {line} must contain two node labels")]
    MissingColumn {
        /// One-based line number.
        line: usize,
    },
    /// The graph could not be assembled from the parsed edges.
    #[error("graph construction failed: {0}")]
    Graph(#[from] GraphError),
    /// Reading the input failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Column separator of an edge list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Delimiter {
    /// A single tab.
    #[default]
    Tab,
    /// A single comma.
    Comma,
    /// Any run of whitespace.
    Whitespace,
    /// Any other single character.
    Char(char),
}

impl Delimiter {
    fn columns<'a>(self, line: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        let trimmed = |field: &'a str| field.trim();
        match self {
            Self::Tab => Box::new(line.split('\t').map(trimmed)),
            Self::Comma => Box::new(line.split(',').map(trimmed)),
            Self::Whitespace => Box::new(line.split_whitespace()),
            Self::Char(separator) => Box::new(line.split(separator).map(trimmed)),
        }
    }
}

/// A graph read from an edge list together with the original labels.
#[derive(Clone, Debug)]
pub struct EdgeList {
    graph: Graph,
    labels: Vec<String>,
    discarded_nodes: usize,
}

impl EdgeList {
    /// The relabelled graph, every node susceptible.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Consumes the edge list, returning the graph.
    #[must_use]
    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Original label of every node, indexed by dense id.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Original label of `node`.
    #[must_use]
    pub fn label(&self, node: NodeId) -> Option<&str> {
        self.labels.get(node).map(String::as_str)
    }

    /// Nodes dropped because they were outside the largest component.
    #[must_use]
    pub fn discarded_nodes(&self) -> usize {
        self.discarded_nodes
    }
}

/// Reads edge lists.
///
/// Blank lines and lines starting with `#` are skipped. Columns after the
/// second are ignored.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use contagion_providers_edgelist::EdgeListProvider;
///
/// let input = "# comment\na\tb\nb\tc\nx\ty\n";
/// let edges = EdgeListProvider::new().try_from_reader(Cursor::new(input))?;
/// assert_eq!(edges.graph().node_count(), 3);
/// assert_eq!(edges.labels(), &["a", "b", "c"]);
/// assert_eq!(edges.discarded_nodes(), 2);
/// # Ok::<(), contagion_providers_edgelist::EdgeListError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct EdgeListProvider {
    delimiter: Delimiter,
    largest_component: bool,
}

impl Default for EdgeListProvider {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Tab,
            largest_component: true,
        }
    }
}

impl EdgeListProvider {
    /// Creates a tab-separated provider that keeps the largest component.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the column separator.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Keeps every component instead of only the largest.
    #[must_use]
    pub fn with_all_components(mut self) -> Self {
        self.largest_component = false;
        self
    }

    /// Reads the edge list at `path`.
    ///
    /// # Errors
    /// See [`Self::try_from_reader`]; also returns [`EdgeListError::Io`] when
    /// the file cannot be opened.
    #[instrument(name = "edgelist.open", err, skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn open(&self, path: impl AsRef<Path>) -> Result<EdgeList, EdgeListError> {
        let file = File::open(path.as_ref())?;
        self.try_from_reader(BufReader::new(file))
    }

    /// Parses an edge list from `reader`.
    ///
    /// # Errors
    /// Returns [`EdgeListError::MissingColumn`] for lines with a single label,
    /// [`EdgeListError::EmptyInput`] when no edge lines exist, and
    /// [`EdgeListError::Io`] when reading fails.
    pub fn try_from_reader<R: BufRead>(&self, reader: R) -> Result<EdgeList, EdgeListError> {
        let mut ids: HashMap<String, NodeId> = HashMap::new();
        let mut labels = Vec::new();
        let mut edges = Vec::new();
        let mut intern = |label: &str| -> NodeId {
            if let Some(&id) = ids.get(label) {
                return id;
            }
            let id = labels.len();
            labels.push(label.to_owned());
            ids.insert(label.to_owned(), id);
            id
        };

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let content = line.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }
            let mut columns = self.delimiter.columns(content).filter(|field| !field.is_empty());
            let (Some(left), Some(right)) = (columns.next(), columns.next()) else {
                return Err(EdgeListError::MissingColumn { line: index + 1 });
            };
            edges.push((intern(left), intern(right)));
        }
        if edges.is_empty() {
            return Err(EdgeListError::EmptyInput);
        }

        let full = Graph::from_edges(labels.len(), edges)?;
        if !self.largest_component {
            return Ok(EdgeList {
                graph: full,
                labels,
                discarded_nodes: 0,
            });
        }
        let anchor = largest_component_anchor(&full);
        let component = full.neighbourhood(&[anchor], usize::MAX)?;
        let kept: Vec<String> = component
            .members()
            .iter()
            .map(|&node| labels[node].clone())
            .collect();
        let discarded_nodes = full.node_count() - kept.len();
        debug!(
            nodes = kept.len(),
            edges = component.graph().edge_count(),
            discarded_nodes,
            "edge list ingested"
        );
        Ok(EdgeList {
            graph: component.graph().clone(),
            labels: kept,
            discarded_nodes,
        })
    }
}

/// Lowest node of the largest connected component; earlier components win
/// ties.
fn largest_component_anchor(graph: &Graph) -> NodeId {
    let mut seen = vec![false; graph.node_count()];
    let mut queue = VecDeque::new();
    let mut best = (0, 0);
    for start in 0..graph.node_count() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        queue.push_back(start);
        let mut size = 0;
        while let Some(node) = queue.pop_front() {
            size += 1;
            for &next in graph.neighbours(node) {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        if size > best.1 {
            best = (start, size);
        }
    }
    best.0
}
