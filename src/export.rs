//! Export of the reaction network for visualization.
//!
//! The interchange format is the Cytoscape.js `elements` layout:
//! `{"elements": {"nodes": [{"data": ...}], "edges": [{"data": ...}]}}`.
//! Nodes and edges are emitted in graph insertion order, never re-sorted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::graph::{NodeData, RetroGraph};
use crate::reaction::Transformation;
use crate::registry::StructureRegistry;

/// File the HTML viewer loads the network from in directory output.
pub const NETWORK_FILE: &str = "network.json";

/// Node record: every node attribute plus Cytoscape's `name` and `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(flatten)]
    pub node: NodeData,
    /// Display name (the node label).
    pub name: String,
    /// Node key (the node id).
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub coeff: u32,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element<T> {
    pub data: T,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Elements {
    pub nodes: Vec<Element<NodeRecord>>,
    pub edges: Vec<Element<EdgeRecord>>,
}

/// Cytoscape.js-compatible network document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CytoscapeExport {
    pub elements: Elements,
}

impl CytoscapeExport {
    /// Snapshot a graph, preserving node and edge insertion order.
    pub fn from_graph(graph: &RetroGraph) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| Element {
                data: NodeRecord {
                    name: node.label().to_string(),
                    value: node.id().to_string(),
                    node: node.clone(),
                },
            })
            .collect();
        let edges = graph
            .edges()
            .map(|(source, target, edge)| Element {
                data: EdgeRecord {
                    source: source.to_string(),
                    target: target.to_string(),
                    coeff: edge.coeff,
                    id: edge.id.clone(),
                },
            })
            .collect();
        Self {
            elements: Elements { nodes, edges },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.nodes.is_empty()
    }

    /// Pretty-printed JSON (two-space indent).
    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::Serialization {
            message: e.to_string(),
        })
    }
}

/// How the exported network is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain JSON document at the given path.
    #[default]
    Json,
    /// `network = <json>` script in `<dir>/network.json`, as the viewer expects.
    Script,
}

/// Write `json` according to `format`; returns the file written.
pub fn write_network(
    json: &str,
    path: &Path,
    format: OutputFormat,
) -> Result<PathBuf, ExportError> {
    let (dir, file, content) = match format {
        OutputFormat::Json => (
            path.parent().map(Path::to_path_buf),
            path.to_path_buf(),
            json.to_string(),
        ),
        OutputFormat::Script => (
            Some(path.to_path_buf()),
            path.join(NETWORK_FILE),
            format!("network = {json}"),
        ),
    };
    if let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(&dir).map_err(|e| ExportError::Write {
            path: dir.display().to_string(),
            source: e,
        })?;
    }
    write_file(&file, &content)?;
    Ok(file)
}

/// One tab-separated line per reaction, in record order.
pub fn reactions_tsv(
    transformations: &[Transformation],
    registry: &StructureRegistry,
    reverse: bool,
) -> String {
    transformations
        .iter()
        .map(|t| t.to_tsv_line(registry, reverse) + "\n")
        .collect()
}

/// Write the reaction listing to `path`.
pub fn write_reactions(
    transformations: &[Transformation],
    registry: &StructureRegistry,
    reverse: bool,
    path: &Path,
) -> Result<(), ExportError> {
    write_file(path, &reactions_tsv(transformations, registry, reverse))
}

fn write_file(path: &Path, content: &str) -> Result<(), ExportError> {
    std::fs::write(path, content).map_err(|e| ExportError::Write {
        path: path.display().to_string(),
        source: e,
    })
}
