//! Node enrichment: structure depictions and template reactions.
//!
//! Enrichment only adds annotation fields and never changes topology.
//! Failures are per node: the annotation is left empty, a warning is
//! logged, and the run continues.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use rayon::prelude::*;

use crate::compound::Descriptors;
use crate::error::EnrichError;
use crate::graph::{NodeData, RetroGraph};

/// Renders a structure to an inline-embeddable depiction (e.g. an SVG data URI).
pub trait Depicter: Send + Sync {
    fn depict(&self, id: &str, descriptors: &Descriptors) -> Result<String, EnrichError>;
}

/// Looks up the template reactions a reaction rule was derived from.
pub trait TemplateLookup {
    fn templates_for(&self, rule_id: &str) -> Result<Vec<String>, EnrichError>;
}

/// Template table loaded from a JSON object `{ "rule id": ["reaction id", ...] }`.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    table: HashMap<String, Vec<String>>,
}

impl StaticTemplates {
    pub fn new(table: HashMap<String, Vec<String>>) -> Self {
        Self { table }
    }

    pub fn load(path: &Path) -> Result<Self, EnrichError> {
        let table_error = |message: String| EnrichError::TemplateTable {
            path: path.display().to_string(),
            message,
        };
        let content =
            std::fs::read_to_string(path).map_err(|e| table_error(e.to_string()))?;
        let table = serde_json::from_str(&content).map_err(|e| table_error(e.to_string()))?;
        Ok(Self { table })
    }
}

impl TemplateLookup for StaticTemplates {
    fn templates_for(&self, rule_id: &str) -> Result<Vec<String>, EnrichError> {
        Ok(self.table.get(rule_id).cloned().unwrap_or_default())
    }
}

/// Counts of what refinement did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichReport {
    pub depicted: usize,
    pub depiction_failures: usize,
    pub rules_queried: usize,
    pub rule_failures: usize,
}

/// Run every configured enrichment over `graph`.
pub fn refine(
    graph: &mut RetroGraph,
    depicter: Option<&dyn Depicter>,
    templates: Option<&dyn TemplateLookup>,
) -> EnrichReport {
    let mut report = EnrichReport::default();
    if let Some(depicter) = depicter {
        add_depictions(graph, depicter, &mut report);
    }
    if let Some(templates) = templates {
        add_template_ids(graph, templates, &mut report);
    }
    report
}

/// Depict every chemical node. Lookups run in parallel; results are written
/// back in node order.
pub fn add_depictions(
    graph: &mut RetroGraph,
    depicter: &dyn Depicter,
    report: &mut EnrichReport,
) {
    let jobs: Vec<(String, Descriptors)> = graph
        .nodes()
        .filter_map(|n| match n {
            NodeData::Chemical(c) => Some((c.id.clone(), c.descriptors())),
            NodeData::Reaction(_) => None,
        })
        .collect();

    let results: HashMap<String, Option<String>> = jobs
        .par_iter()
        .map(|(id, descriptors)| match depicter.depict(id, descriptors) {
            Ok(svg) => (id.clone(), Some(svg)),
            Err(e) => {
                tracing::warn!(
                    id = %id,
                    inchi = ?descriptors.inchi,
                    error = %e,
                    "depiction failed"
                );
                (id.clone(), None)
            }
        })
        .collect();

    for node in graph.nodes_mut() {
        if let NodeData::Chemical(c) = node {
            let svg = results.get(&c.id).cloned().flatten();
            if svg.is_some() {
                report.depicted += 1;
            } else {
                report.depiction_failures += 1;
            }
            c.svg = svg;
        }
    }
}

/// Attach template reaction ids to reaction nodes, querying each distinct
/// rule once.
pub fn add_template_ids(
    graph: &mut RetroGraph,
    templates: &dyn TemplateLookup,
    report: &mut EnrichReport,
) {
    let rules: BTreeSet<String> = graph
        .nodes()
        .filter_map(|n| match n {
            NodeData::Reaction(r) => Some(r.rule_ids.iter().cloned()),
            NodeData::Chemical(_) => None,
        })
        .flatten()
        .collect();

    let mut cache: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for rule_id in rules {
        report.rules_queried += 1;
        let found = templates.templates_for(&rule_id).unwrap_or_else(|e| {
            tracing::warn!(rule_id = %rule_id, error = %e, "template lookup failed");
            report.rule_failures += 1;
            Vec::new()
        });
        cache.insert(rule_id, found);
    }

    for node in graph.nodes_mut() {
        if let NodeData::Reaction(r) = node {
            let ids: BTreeSet<String> = r
                .rule_ids
                .iter()
                .filter_map(|rule| cache.get(rule))
                .flatten()
                .cloned()
                .collect();
            r.rxn_template_ids = ids.into_iter().collect();
        }
    }
}
