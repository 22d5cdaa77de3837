// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # retrograph
//!
//! Turns RetroPath2.0 retrosynthesis results into a deduplicated, directed
//! bipartite reaction network, prunes it to the paths linking the target to
//! sink (available) compounds, and exports it for a Cytoscape.js viewer.
//!
//! ## Architecture
//!
//! - **Identity** (`ident`, `registry`, `compound`): one id per distinct structure
//! - **Reactions** (`reaction`): canonical, orientation-independent records
//! - **Ingestion** (`ingest`): results CSV → registry + reaction records
//! - **Network** (`graph`): petgraph assembly and source-to-sink pruning
//! - **Enrichment** (`enrich`): depictions and template reactions, non-fatal
//! - **Export** (`export`): Cytoscape.js `elements` JSON
//!
//! ## Library usage
//!
//! ```no_run
//! use retrograph::config::PipelineConfig;
//! use retrograph::ingest::read_rows_from_path;
//! use retrograph::pipeline::Pipeline;
//!
//! let rows = read_rows_from_path("results.csv".as_ref()).unwrap();
//! let output = Pipeline::new(PipelineConfig::default()).run(rows).unwrap();
//! println!("{}", output.export().to_json().unwrap());
//! ```

pub mod compound;
pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod graph;
pub mod ident;
pub mod ingest;
pub mod pipeline;
pub mod reaction;
pub mod registry;
