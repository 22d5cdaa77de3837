//! RetroPath2.0 results ingestion.
//!
//! Reads the results CSV, groups rows by transformation, checks that each
//! group is self-consistent, and populates a [`StructureRegistry`] and the
//! list of [`Transformation`]s in a fixed, reproducible order:
//!
//! 1. register structures (transformations in sorted id order)
//! 2. annotate sinks and row-level InChIs
//! 3. promote iteration-zero substrates to targets
//! 4. build reaction records (ids are captured here)
//! 5. refresh structure descriptors

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::compound::Descriptors;
use crate::error::{IngestError, RetroResult};
use crate::reaction::{RawReaction, Transformation, side_tokens, split_sides};
use crate::registry::StructureRegistry;

/// Text of the first header cell; repeated inside concatenated result files.
const HEADER_MARKER: &str = "Initial source";

/// One row of a RetroPath2.0 results file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rp2Row {
    #[serde(rename = "Initial source", default)]
    pub initial_source: String,
    #[serde(rename = "Transformation ID")]
    pub transformation_id: String,
    #[serde(rename = "Reaction SMILES")]
    pub reaction_smiles: String,
    #[serde(rename = "Substrate SMILES")]
    pub substrate_smiles: String,
    #[serde(rename = "Substrate InChI", default)]
    pub substrate_inchi: String,
    #[serde(rename = "Product SMILES")]
    pub product_smiles: String,
    #[serde(rename = "Product InChI", default)]
    pub product_inchi: String,
    #[serde(rename = "In Sink", default)]
    pub in_sink: String,
    #[serde(rename = "Sink name", default)]
    pub sink_name: String,
    #[serde(rename = "Diameter", default)]
    pub diameter: String,
    #[serde(rename = "Rule ID", default)]
    pub rule_id: String,
    #[serde(rename = "EC number", default)]
    pub ec_number: String,
    #[serde(rename = "Score", default)]
    pub score: String,
    #[serde(rename = "Iteration", default)]
    pub iteration: String,
}

impl Rp2Row {
    fn is_repeated_header(&self) -> bool {
        self.initial_source == HEADER_MARKER
    }

    fn is_sink(&self) -> bool {
        self.in_sink.trim() == "1"
    }
}

/// Read rows from a results CSV, skipping repeated header lines.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Rp2Row>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<Rp2Row>() {
        let row = record.map_err(|e| IngestError::Csv {
            message: e.to_string(),
        })?;
        if !row.is_repeated_header() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Read rows from a results file on disk.
pub fn read_rows_from_path(path: &Path) -> Result<Vec<Rp2Row>, IngestError> {
    let file = std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    read_rows(file)
}

/// Split a bracketed list field such as `[RR-01, RR-02]`.
pub fn split_list(field: &str) -> Vec<String> {
    field
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(", ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rows sharing a transformation id.
#[derive(Debug, Clone)]
pub struct TransformationGroup {
    pub id: String,
    pub rows: Vec<Rp2Row>,
}

impl TransformationGroup {
    fn first(&self) -> &Rp2Row {
        // Groups are only created together with their first row.
        &self.rows[0]
    }

    /// Check that the reaction text and the substrate/product columns name
    /// the same structures, returning the union of reaction structures.
    fn consistent_structures(&self) -> RetroResult<BTreeSet<String>> {
        let (left, right) = split_sides(&self.first().reaction_smiles)?;
        let left_rxn: BTreeSet<String> = side_tokens(left).into_iter().map(String::from).collect();
        let right_rxn: BTreeSet<String> =
            side_tokens(right).into_iter().map(String::from).collect();
        let left_cols: BTreeSet<String> = self
            .rows
            .iter()
            .map(|r| r.substrate_smiles.clone())
            .collect();
        let right_cols: BTreeSet<String> = self
            .rows
            .iter()
            .map(|r| r.product_smiles.clone())
            .collect();

        if left_rxn != left_cols {
            return Err(IngestError::SubstrateMismatch {
                transformation: self.id.clone(),
                from_reaction: left_rxn.into_iter().collect(),
                from_columns: left_cols.into_iter().collect(),
            }
            .into());
        }
        if right_rxn != right_cols {
            return Err(IngestError::ProductMismatch {
                transformation: self.id.clone(),
                from_reaction: right_rxn.into_iter().collect(),
                from_columns: right_cols.into_iter().collect(),
            }
            .into());
        }
        Ok(left_rxn.union(&right_rxn).cloned().collect())
    }

    fn iteration(&self) -> Result<u32, IngestError> {
        parse_number(&self.id, "Iteration", &self.first().iteration)
    }

    fn raw_reaction(&self) -> Result<RawReaction, IngestError> {
        let row = self.first();
        Ok(RawReaction {
            id: self.id.clone(),
            smiles: row.reaction_smiles.clone(),
            diameter: parse_number(&self.id, "Diameter", &row.diameter)?,
            rule_ids: split_list(&row.rule_id),
            ec_numbers: split_list(&row.ec_number),
            score: parse_number(&self.id, "Score", &row.score)?,
            iteration: self.iteration()?,
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    transformation: &str,
    field: &'static str,
    value: &str,
) -> Result<T, IngestError> {
    value.trim().parse().map_err(|_| IngestError::InvalidNumber {
        transformation: transformation.to_string(),
        field,
        value: value.to_string(),
    })
}

/// Group rows by transformation id, keeping first-appearance order.
pub fn group_rows(rows: Vec<Rp2Row>) -> Vec<TransformationGroup> {
    let mut groups: Vec<TransformationGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows {
        match index.get(&row.transformation_id) {
            Some(&i) => groups[i].rows.push(row),
            None => {
                index.insert(row.transformation_id.clone(), groups.len());
                groups.push(TransformationGroup {
                    id: row.transformation_id.clone(),
                    rows: vec![row],
                });
            }
        }
    }
    groups
}

/// Refreshes the descriptors of a structure (canonical SMILES, InChI, ...).
pub trait StructureDescriber {
    fn describe(&self, current: &Descriptors) -> Result<Descriptors, String>;
}

/// Describer that keeps the descriptors found in the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl StructureDescriber for PassThrough {
    fn describe(&self, current: &Descriptors) -> Result<Descriptors, String> {
        Ok(current.clone())
    }
}

/// Options controlling ingestion.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Read reactions right to left (RetroPath2.0 writes them retro-wise).
    pub reverse: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { reverse: true }
    }
}

/// Registry and reaction records built from one results file.
#[derive(Debug)]
pub struct Ingested {
    pub registry: StructureRegistry,
    pub transformations: Vec<Transformation>,
}

impl Ingested {
    /// Ingest grouped rows into a fresh registry.
    pub fn from_groups(
        groups: &[TransformationGroup],
        registry: StructureRegistry,
        options: &IngestOptions,
        describer: &dyn StructureDescriber,
    ) -> RetroResult<Self> {
        let mut registry = registry;

        // 1) Consistency + registration, in sorted transformation order.
        let mut sorted: Vec<&TransformationGroup> = groups.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        for group in sorted {
            for smiles in group.consistent_structures()? {
                registry.get_or_create(&smiles);
            }
        }

        // 2) Sinks and row-level InChIs.
        for group in groups {
            for row in &group.rows {
                let substrate = lookup(&registry, &row.substrate_smiles)?;
                registry.record_inchi(&substrate, &row.substrate_inchi);
                let product = lookup(&registry, &row.product_smiles)?;
                registry.record_inchi(&product, &row.product_inchi);
                if row.is_sink() {
                    let names = split_list(&row.sink_name);
                    if names.is_empty() {
                        registry.mark_sink(&product);
                    }
                    for name in names {
                        registry.annotate_sink(&product, &name);
                    }
                }
            }
        }

        // 3) Targets: substrates of iteration-zero transformations.
        for group in groups {
            if group.iteration()? == 0 {
                let smiles = &group.first().substrate_smiles;
                if let Some(uid) = registry.promote_to_target(smiles) {
                    tracing::info!(target_id = %uid, smiles = %smiles, "promoted target");
                }
            }
        }

        // 4) Reaction records.
        let mut transformations = Vec::with_capacity(groups.len());
        for group in groups {
            let raw = group.raw_reaction()?;
            transformations.push(Transformation::new(raw, &registry, options.reverse)?);
        }

        // 5) Descriptors. Reactions keep the raw tokens, so this comes last.
        let uids: Vec<String> = registry.iter().map(|c| c.uid.clone()).collect();
        for uid in uids {
            let Some(current) = registry.get(&uid).map(|c| c.descriptors.clone()) else {
                continue;
            };
            match describer.describe(&current) {
                Ok(descriptors) => {
                    registry.set_descriptors(&uid, descriptors);
                }
                Err(message) => {
                    tracing::warn!(
                        uid = %uid,
                        smiles = %current.smiles,
                        %message,
                        "structure description failed"
                    );
                }
            }
        }

        tracing::info!(
            structures = registry.len(),
            transformations = transformations.len(),
            "ingested results"
        );

        Ok(Self {
            registry,
            transformations,
        })
    }
}

fn lookup(registry: &StructureRegistry, smiles: &str) -> Result<String, IngestError> {
    registry
        .lookup(smiles)
        .map(str::to_string)
        .ok_or_else(|| IngestError::UnknownStructure {
            smiles: smiles.to_string(),
        })
}
