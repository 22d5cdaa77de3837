//! Reaction network: a directed bipartite graph of chemicals and reactions.
//!
//! - **Assembly** ([`RetroGraph`]): chemicals and reactions become nodes of a
//!   `petgraph` stable graph; edges go chemical → reaction (consumed) and
//!   reaction → chemical (produced), carrying stoichiometric coefficients.
//! - **Pruning** ([`prune`]): keeps only the nodes on shortest target–sink
//!   paths that avoid excluded structures.
//!
//! Node and edge insertion order is preserved through pruning, so exports
//! are reproducible.

pub mod network;
pub mod prune;

use serde::{Deserialize, Serialize};

use crate::compound::{Compound, Descriptors};
use crate::reaction::Transformation;

pub use network::RetroGraph;

/// Default separator inside derived edge ids (`source_=>_target`).
pub const EDGE_SEPARATOR: &str = "_=>_";

/// Chemical node attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalNode {
    pub id: String,
    /// SMILES as read from the results, unless a describer canonicalized it.
    pub smiles: String,
    /// InChI from the results columns or from a describer.
    pub inchi: Option<String>,
    /// Only set by a describer other than the default `PassThrough`; the
    /// results file carries no InChIKeys.
    pub inchikey: Option<String>,
    pub sink_chemical: bool,
    pub target_chemical: bool,
    pub label: String,
    pub all_labels: Vec<String>,
    /// Depiction, filled in by refinement.
    #[serde(default)]
    pub svg: Option<String>,
}

impl ChemicalNode {
    pub fn descriptors(&self) -> Descriptors {
        Descriptors {
            smiles: self.smiles.clone(),
            inchi: self.inchi.clone(),
            inchikey: self.inchikey.clone(),
        }
    }
}

impl From<&Compound> for ChemicalNode {
    fn from(c: &Compound) -> Self {
        let all_labels = c.labels();
        Self {
            id: c.uid.clone(),
            smiles: c.descriptors.smiles.clone(),
            inchi: c.descriptors.inchi.clone(),
            inchikey: c.descriptors.inchikey.clone(),
            sink_chemical: c.is_sink,
            target_chemical: c.is_target,
            label: all_labels.first().cloned().unwrap_or_else(|| c.uid.clone()),
            all_labels,
            svg: None,
        }
    }
}

/// Reaction node attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionNode {
    pub id: String,
    pub rsmiles: String,
    pub diameter: u32,
    pub rule_ids: Vec<String>,
    pub rule_score: f64,
    pub ec_numbers: Vec<String>,
    pub iteration: u32,
    pub label: String,
    pub all_labels: Vec<String>,
    /// Template reactions of the rules, filled in by refinement.
    #[serde(default)]
    pub rxn_template_ids: Vec<String>,
}

impl From<&Transformation> for ReactionNode {
    fn from(t: &Transformation) -> Self {
        Self {
            id: t.id.clone(),
            rsmiles: t.smiles.clone(),
            diameter: t.diameter,
            rule_ids: t.rule_ids.clone(),
            rule_score: t.score,
            ec_numbers: t.ec_numbers.clone(),
            iteration: t.iteration,
            label: t.label(),
            all_labels: t.labels(),
            rxn_template_ids: Vec::new(),
        }
    }
}

/// Node weight: chemicals and reactions share one id namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeData {
    Chemical(ChemicalNode),
    Reaction(ReactionNode),
}

impl NodeData {
    pub fn id(&self) -> &str {
        match self {
            NodeData::Chemical(c) => &c.id,
            NodeData::Reaction(r) => &r.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NodeData::Chemical(c) => &c.label,
            NodeData::Reaction(r) => &r.label,
        }
    }

    pub fn is_sink(&self) -> bool {
        matches!(self, NodeData::Chemical(c) if c.sink_chemical)
    }

    /// Whether any structural descriptor of this node is in `descriptors`.
    /// Reaction nodes never match.
    pub fn matches_any(&self, descriptors: &std::collections::HashSet<String>) -> bool {
        match self {
            NodeData::Chemical(c) => c.descriptors().iter().any(|d| descriptors.contains(d)),
            NodeData::Reaction(_) => false,
        }
    }
}

/// Edge weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Stoichiometric coefficient.
    pub coeff: u32,
    /// Derived id; empty until [`RetroGraph::make_edge_ids`] runs.
    pub id: String,
}

impl EdgeData {
    pub fn new(coeff: u32) -> Self {
        Self {
            coeff,
            id: String::new(),
        }
    }
}
