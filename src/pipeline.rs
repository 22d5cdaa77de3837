//! Staged processing pipeline.
//!
//! ingest → assemble → prune → refine → export. Each stage owns the
//! registry or graph while it runs and hands it to the next one; no stage
//! starts before the previous one has finished.

use crate::config::PipelineConfig;
use crate::enrich::{self, Depicter, EnrichReport, TemplateLookup};
use crate::error::RetroResult;
use crate::export::CytoscapeExport;
use crate::graph::RetroGraph;
use crate::graph::prune::{self, PruneReport};
use crate::ingest::{self, Ingested, PassThrough, Rp2Row, StructureDescriber};
use crate::reaction::Transformation;
use crate::registry::StructureRegistry;

/// Counts gathered across stages.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub structures: usize,
    pub transformations: usize,
    pub nodes_before_pruning: usize,
    pub edges_before_pruning: usize,
    pub nodes_after_pruning: usize,
    pub edges_after_pruning: usize,
    pub prune: PruneReport,
    pub enrich: EnrichReport,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "structures:      {}", self.structures)?;
        writeln!(f, "transformations: {}", self.transformations)?;
        writeln!(
            f,
            "network:         {} nodes, {} edges",
            self.nodes_before_pruning, self.edges_before_pruning
        )?;
        writeln!(
            f,
            "pruned:          {} nodes, {} edges",
            self.nodes_after_pruning, self.edges_after_pruning
        )?;
        write!(
            f,
            "sinks:           {} connected of {}",
            self.prune.connected_sinks(),
            self.prune.sinks.len()
        )
    }
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    pub registry: StructureRegistry,
    pub transformations: Vec<Transformation>,
    pub graph: RetroGraph,
    pub stats: PipelineStats,
}

impl PipelineOutput {
    pub fn export(&self) -> CytoscapeExport {
        CytoscapeExport::from_graph(&self.graph)
    }
}

/// Configured pipeline with its external collaborators.
pub struct Pipeline {
    config: PipelineConfig,
    describer: Box<dyn StructureDescriber>,
    depicter: Option<Box<dyn Depicter>>,
    templates: Option<Box<dyn TemplateLookup>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            describer: Box::new(PassThrough),
            depicter: None,
            templates: None,
        }
    }

    pub fn with_describer(mut self, describer: impl StructureDescriber + 'static) -> Self {
        self.describer = Box::new(describer);
        self
    }

    pub fn with_depicter(mut self, depicter: impl Depicter + 'static) -> Self {
        self.depicter = Some(Box::new(depicter));
        self
    }

    pub fn with_templates(mut self, templates: impl TemplateLookup + 'static) -> Self {
        self.templates = Some(Box::new(templates));
        self
    }

    /// Run every stage over the rows of one results file.
    pub fn run(&self, rows: Vec<Rp2Row>) -> RetroResult<PipelineOutput> {
        self.config.validate()?;

        let groups = ingest::group_rows(rows);
        let Ingested {
            registry,
            transformations,
        } = Ingested::from_groups(
            &groups,
            self.config.registry(),
            &self.config.ingest_options(),
            self.describer.as_ref(),
        )?;

        let mut graph =
            RetroGraph::build(&registry, &transformations, &self.config.edge_separator)?;
        let mut stats = PipelineStats {
            structures: registry.len(),
            transformations: transformations.len(),
            nodes_before_pruning: graph.node_count(),
            edges_before_pruning: graph.edge_count(),
            ..Default::default()
        };

        stats.prune = prune::prune(&mut graph, &self.config.target_id, &self.config.excluded);
        stats.nodes_after_pruning = graph.node_count();
        stats.edges_after_pruning = graph.edge_count();
        if graph.is_empty() {
            tracing::warn!(
                target_id = %self.config.target_id,
                "no source-to-sink path survived pruning"
            );
        }

        let depicter = self.depicter.as_ref().map(|d| d.as_ref() as &dyn Depicter);
        let templates = self
            .templates
            .as_ref()
            .map(|t| t.as_ref() as &dyn TemplateLookup);
        stats.enrich = enrich::refine(&mut graph, depicter, templates);

        Ok(PipelineOutput {
            registry,
            transformations,
            graph,
            stats,
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("depicter", &self.depicter.is_some())
            .field("templates", &self.templates.is_some())
            .finish()
    }
}
