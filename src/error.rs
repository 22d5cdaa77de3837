//! Rich diagnostic error types for retrograph.
//!
//! Each stage defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know which part of the input
//! or configuration needs fixing.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for retrograph.
///
/// Each variant wraps a stage-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum RetroError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reaction(#[from] ReactionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Enrich(#[from] EnrichError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Ingestion errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    #[diagnostic(
        code(retrograph::ingest::io),
        help("Check that the RetroPath2.0 results file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {message}")]
    #[diagnostic(
        code(retrograph::ingest::csv),
        help(
            "The results file could not be parsed as CSV. \
             Make sure it is a RetroPath2.0 results file with its header row."
        )
    )]
    Csv { message: String },

    #[error("transformation {transformation}: substrates differ between reaction and columns")]
    #[diagnostic(
        code(retrograph::ingest::substrate_mismatch),
        help(
            "The reaction SMILES lists {from_reaction:?} on its left side but the \
             Substrate SMILES column lists {from_columns:?}. The input is corrupt \
             or was not produced by RetroPath2.0."
        )
    )]
    SubstrateMismatch {
        transformation: String,
        from_reaction: Vec<String>,
        from_columns: Vec<String>,
    },

    #[error("transformation {transformation}: products differ between reaction and columns")]
    #[diagnostic(
        code(retrograph::ingest::product_mismatch),
        help(
            "The reaction SMILES lists {from_reaction:?} on its right side but the \
             Product SMILES column lists {from_columns:?}. The input is corrupt \
             or was not produced by RetroPath2.0."
        )
    )]
    ProductMismatch {
        transformation: String,
        from_reaction: Vec<String>,
        from_columns: Vec<String>,
    },

    #[error("invalid {field} value {value:?} in transformation {transformation}")]
    #[diagnostic(
        code(retrograph::ingest::invalid_number),
        help("The {field} column must contain a plain number.")
    )]
    InvalidNumber {
        transformation: String,
        field: &'static str,
        value: String,
    },

    #[error("unknown structure {smiles:?} referenced by a row")]
    #[diagnostic(
        code(retrograph::ingest::unknown_structure),
        help(
            "A substrate or product column names a structure that is absent from \
             every reaction SMILES. This indicates an inconsistent results file."
        )
    )]
    UnknownStructure { smiles: String },
}

// ---------------------------------------------------------------------------
// Reaction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ReactionError {
    #[error("malformed reaction text: {text:?}")]
    #[diagnostic(
        code(retrograph::reaction::malformed),
        help("A reaction must have exactly one `>>` separating two non-empty sides.")
    )]
    Malformed { text: String },

    #[error("reaction {reaction} references unregistered structure {token:?}")]
    #[diagnostic(
        code(retrograph::reaction::unresolved),
        help("Register every structure of the reaction before building the record.")
    )]
    UnresolvedStructure { reaction: String, token: String },
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node not found: {id}")]
    #[diagnostic(
        code(retrograph::graph::node_not_found),
        help(
            "An edge references a node that was never added. \
             Structures must be added before the reactions that use them."
        )
    )]
    NodeNotFound { id: String },

    #[error("duplicate node id: {id}")]
    #[diagnostic(
        code(retrograph::graph::duplicate_node),
        help(
            "Structure and reaction nodes share one id namespace. \
             A reaction id collides with a structure id."
        )
    )]
    DuplicateNode { id: String },
}

// ---------------------------------------------------------------------------
// Enrichment errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EnrichError {
    #[error("depiction failed for {id}: {message}")]
    #[diagnostic(
        code(retrograph::enrich::depiction),
        help("The structure could not be rendered. The node is exported without a depiction.")
    )]
    Depiction { id: String, message: String },

    #[error("template lookup failed for rule {rule_id}: {message}")]
    #[diagnostic(
        code(retrograph::enrich::template),
        help("The rule has no retrievable template reactions. It is exported with none.")
    )]
    Template { rule_id: String, message: String },

    #[error("failed to load template table {path}: {message}")]
    #[diagnostic(
        code(retrograph::enrich::template_table),
        help("The template table must be a JSON object mapping rule ids to arrays of reaction ids.")
    )]
    TemplateTable { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("serialization error: {message}")]
    #[diagnostic(
        code(retrograph::export::serde),
        help("The graph could not be serialized to JSON. File a bug report.")
    )]
    Serialization { message: String },

    #[error("failed to write {path}: {source}")]
    #[diagnostic(
        code(retrograph::export::write),
        help("Check that the output location is writable and that the disk is not full.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    #[diagnostic(
        code(retrograph::config::read),
        help("Check that the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    #[diagnostic(
        code(retrograph::config::write),
        help("Check that the config location is writable.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    #[diagnostic(
        code(retrograph::config::parse),
        help("The config must be valid TOML. Run `retrograph init-config` for a template.")
    )]
    Parse { path: String, message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(retrograph::config::invalid), help("{message}"))]
    Invalid { message: String },
}

/// Convenience result type for retrograph operations.
pub type RetroResult<T> = std::result::Result<T, RetroError>;
