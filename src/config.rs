//! Pipeline configuration, loadable from TOML.
//!
//! ```toml
//! target_id = "TARGET_0000000001"
//! excluded = ["InChI=1S/H2O/h1H2"]
//! reverse = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graph::EDGE_SEPARATOR;
use crate::ident::{DEFAULT_SEPARATOR, DEFAULT_WIDTH, IdAllocator};
use crate::ingest::IngestOptions;
use crate::registry::{COMPOUND_PREFIX, StructureRegistry, TARGET_PREFIX};

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Cofactors filtered out of source-to-sink paths by default.
pub const DEFAULT_EXCLUDED: [&str; 3] = [
    "InChI=1S/O2/c1-2",  // O2
    "InChI=1S/H2O/h1H2", // water
    "InChI=1S/p+1",      // H+
];

/// Everything the pipeline needs from its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Node the source-to-sink paths start from.
    pub target_id: String,
    /// Structural descriptors treated as forbidden intermediates.
    pub excluded: Vec<String>,
    /// Read reactions right to left.
    pub reverse: bool,
    /// Digits in allocated ids.
    pub id_width: usize,
    pub compound_prefix: String,
    pub target_prefix: String,
    pub id_separator: String,
    pub edge_separator: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut targets = IdAllocator::new(TARGET_PREFIX);
        Self {
            target_id: targets.next_id(),
            excluded: DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect(),
            reverse: true,
            id_width: DEFAULT_WIDTH,
            compound_prefix: COMPOUND_PREFIX.to_string(),
            target_prefix: TARGET_PREFIX.to_string(),
            id_separator: DEFAULT_SEPARATOR.to_string(),
            edge_separator: EDGE_SEPARATOR.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |message: &str| {
            Err(ConfigError::Invalid {
                message: message.to_string(),
            })
        };
        if self.id_width == 0 {
            return invalid("id_width must be > 0");
        }
        if self.compound_prefix.is_empty() || self.target_prefix.is_empty() {
            return invalid("compound_prefix and target_prefix must not be empty");
        }
        if self.compound_prefix == self.target_prefix {
            return invalid("compound_prefix and target_prefix must differ");
        }
        // Allocated ids end in digits, so a separator with a non-digit keeps
        // the compound and target id spaces apart.
        if !self.id_separator.chars().any(|c| !c.is_ascii_digit()) {
            return invalid("id_separator must contain a non-digit character");
        }
        if self.edge_separator.is_empty() {
            return invalid("edge_separator must not be empty");
        }
        if self.target_id.is_empty() {
            return invalid("target_id must not be empty");
        }
        Ok(())
    }

    /// A fresh registry with allocators formatted per this config.
    pub fn registry(&self) -> StructureRegistry {
        StructureRegistry::with_allocators(
            IdAllocator::with_format(&self.compound_prefix, &self.id_separator, self.id_width),
            IdAllocator::with_format(&self.target_prefix, &self.id_separator, self.id_width),
        )
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            reverse: self.reverse,
        }
    }
}
