use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::model::FileDependency;

/// Files as nodes, [`FileDependency`] records as edges.
pub type EdgeGraph = DiGraph<PathBuf, FileDependency>;

pub struct GraphBuilder {
    graph: EdgeGraph,
    node_map: HashMap<PathBuf, NodeIndex>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: EdgeGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Adds a file node once; later calls return the existing index.
    pub fn add_file(&mut self, path: &Path) -> NodeIndex {
        if let Some(index) = self.node_map.get(path) {
            return *index;
        }
        let index = self.graph.add_node(path.to_path_buf());
        self.node_map.insert(path.to_path_buf(), index);
        index
    }

    pub fn add_dependency(&mut self, dependency: FileDependency) -> EdgeIndex {
        let from = self.add_file(&dependency.from);
        let to = self.add_file(&dependency.to);
        self.graph.add_edge(from, to, dependency)
    }

    pub fn extend<I: IntoIterator<Item = FileDependency>>(&mut self, dependencies: I) {
        for dependency in dependencies {
            self.add_dependency(dependency);
        }
    }

    pub fn node_index(&self, path: &Path) -> Option<NodeIndex> {
        self.node_map.get(path).copied()
    }

    pub fn build(self) -> EdgeGraph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    pub files: usize,
    pub edges: usize,
    /// File with the most incoming edges and its in-degree.
    pub hub: Option<(PathBuf, usize)>,
}

pub fn summarize(graph: &EdgeGraph) -> GraphSummary {
    let hub = graph
        .node_indices()
        .map(|index| {
            let incoming = graph.edges_directed(index, Direction::Incoming).count();
            (index, incoming)
        })
        .filter(|(_, incoming)| *incoming > 0)
        .max_by(|(a_index, a), (b_index, b)| a.cmp(b).then_with(|| graph[*b_index].cmp(&graph[*a_index])))
        .map(|(index, incoming)| (graph[index].clone(), incoming));

    GraphSummary {
        files: graph.node_count(),
        edges: graph.edge_count(),
        hub,
    }
}
