use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CdbError;
use crate::tiles::dataset::{GS_MODEL_GEOMETRY, GS_MODEL_TEXTURE};

/// Unique GS model count after which the legacy tool stopped scanning tiles.
pub const LEGACY_GS_SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    /// Stop the GS scan once more unique models than this have accumulated
    pub gs_sample_limit: Option<usize>,
    /// Tiles resolved per parallel batch
    pub batch_size: usize,
    /// Worker threads; the rayon default when unset
    pub workers: Option<usize>,
    /// Stop after this many findings
    pub max_findings: Option<usize>,
    /// CSV of `code,name` rows extending the built-in feature-class dictionary
    pub feature_dictionary: Option<PathBuf>,
    pub gs_model_dataset: i32,
    pub gs_texture_dataset: i32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            gs_sample_limit: None,
            batch_size: 1,
            workers: None,
            max_findings: None,
            feature_dictionary: None,
            gs_model_dataset: GS_MODEL_GEOMETRY,
            gs_texture_dataset: GS_MODEL_TEXTURE,
        }
    }
}

impl AuditConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: AuditConfig =
            toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), CdbError> {
        if self.batch_size == 0 {
            return Err(CdbError::Config("batch_size must be at least 1".to_string()));
        }
        if self.workers == Some(0) {
            return Err(CdbError::Config("workers must be at least 1".to_string()));
        }
        if self.max_findings == Some(0) {
            return Err(CdbError::Config("max_findings must be at least 1".to_string()));
        }
        Ok(())
    }
}
