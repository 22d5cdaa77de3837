//! Reaction network assembly.
//!
//! Uses a `petgraph` `StableDiGraph` so that removing nodes during pruning
//! never reorders the survivors, plus a `HashMap` for id → index lookups.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::error::GraphError;
use crate::reaction::Transformation;
use crate::registry::StructureRegistry;

use super::{ChemicalNode, EDGE_SEPARATOR, EdgeData, NodeData, ReactionNode};

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Directed bipartite graph of chemicals and reactions.
pub struct RetroGraph {
    graph: StableDiGraph<NodeData, EdgeData>,
    /// Node id → NodeIndex mapping for O(1) lookups.
    node_index: HashMap<String, NodeIndex>,
    edge_separator: String,
}

impl RetroGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::with_edge_separator(EDGE_SEPARATOR)
    }

    /// Create a new empty graph whose edge ids use `separator`.
    pub fn with_edge_separator(separator: impl Into<String>) -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
            edge_separator: separator.into(),
        }
    }

    /// Assemble the full network: compounds, reactions, then edge ids.
    pub fn build(
        registry: &StructureRegistry,
        transformations: &[Transformation],
        edge_separator: &str,
    ) -> GraphResult<Self> {
        let mut graph = Self::with_edge_separator(edge_separator);
        graph.add_compounds(registry)?;
        graph.add_transformations(transformations)?;
        graph.make_edge_ids();
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "assembled reaction network"
        );
        Ok(graph)
    }

    fn insert_node(&mut self, data: NodeData) -> GraphResult<NodeIndex> {
        if self.node_index.contains_key(data.id()) {
            return Err(GraphError::DuplicateNode {
                id: data.id().to_string(),
            });
        }
        let id = data.id().to_string();
        let idx = self.graph.add_node(data);
        self.node_index.insert(id, idx);
        Ok(idx)
    }

    fn index_of(&self, id: &str) -> GraphResult<NodeIndex> {
        self.node_index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_string() })
    }

    /// Add one node per compound, ordered by label list (ties by id).
    pub fn add_compounds(&mut self, registry: &StructureRegistry) -> GraphResult<()> {
        let mut nodes: Vec<ChemicalNode> = registry.iter().map(ChemicalNode::from).collect();
        nodes.sort_by(|a, b| a.all_labels.cmp(&b.all_labels).then_with(|| a.id.cmp(&b.id)));
        for node in nodes {
            self.insert_node(NodeData::Chemical(node))?;
        }
        Ok(())
    }

    /// Add one node per reaction, ordered by id, with its consumption and
    /// production edges.
    pub fn add_transformations(&mut self, transformations: &[Transformation]) -> GraphResult<()> {
        let mut sorted: Vec<&Transformation> = transformations.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        for transformation in sorted {
            let rxn = self.insert_node(NodeData::Reaction(ReactionNode::from(transformation)))?;
            for (uid, &coeff) in &transformation.left {
                let cmpd = self.index_of(uid)?;
                self.graph.update_edge(cmpd, rxn, EdgeData::new(coeff));
            }
            for (uid, &coeff) in &transformation.right {
                let cmpd = self.index_of(uid)?;
                self.graph.update_edge(rxn, cmpd, EdgeData::new(coeff));
            }
        }
        Ok(())
    }

    /// Derive every edge id from its endpoints. Run after all nodes and
    /// edges exist.
    pub fn make_edge_ids(&mut self) {
        let indices: Vec<_> = self.graph.edge_indices().collect();
        for ei in indices {
            let Some((src, dst)) = self.graph.edge_endpoints(ei) else {
                continue;
            };
            let id = format!(
                "{}{}{}",
                self.graph[src].id(),
                self.edge_separator,
                self.graph[dst].id()
            );
            self.graph[ei].id = id;
        }
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&NodeData> {
        self.node_index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Mutable node access in insertion order, for annotation only.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut NodeData> {
        self.graph.node_weights_mut()
    }

    /// Edges in insertion order as `(source id, target id, data)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &EdgeData)> {
        self.graph.edge_indices().filter_map(move |ei| {
            let (src, dst) = self.graph.edge_endpoints(ei)?;
            Some((self.graph[src].id(), self.graph[dst].id(), &self.graph[ei]))
        })
    }

    /// Ids of sink chemicals, in insertion order.
    pub fn sinks(&self) -> Vec<String> {
        self.nodes()
            .filter(|n| n.is_sink())
            .map(|n| n.id().to_string())
            .collect()
    }

    /// Remove every node (and its edges) whose id is not in `keep`.
    /// Returns the number of nodes removed.
    pub fn retain_nodes(&mut self, keep: &HashSet<String>) -> usize {
        let doomed: Vec<String> = self
            .node_index
            .keys()
            .filter(|id| !keep.contains(*id))
            .cloned()
            .collect();
        for id in &doomed {
            if let Some(idx) = self.node_index.remove(id) {
                self.graph.remove_node(idx);
            }
        }
        doomed.len()
    }

    pub(crate) fn inner(&self) -> &StableDiGraph<NodeData, EdgeData> {
        &self.graph
    }

    pub(crate) fn index(&self, id: &str) -> Option<NodeIndex> {
        self.node_index.get(id).copied()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

impl Default for RetroGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RetroGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetroGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
