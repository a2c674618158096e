//! Audit findings and report types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AssetRef;
use crate::tiles::TileAddress;

/// Feature/model dataset family being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatasetFamily {
    /// Geospecific models packaged in per-tile archives
    Gs,
    /// Geotypical models in the shared GTModel library
    Gt,
}

impl fmt::Display for DatasetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetFamily::Gs => write!(f, "GS"),
            DatasetFamily::Gt => write!(f, "GT"),
        }
    }
}

/// A missing asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "reference", rename_all = "snake_case")]
pub enum Finding {
    MissingModel(AssetRef),
    MissingTexture(AssetRef),
}

impl Finding {
    pub fn reference(&self) -> &AssetRef {
        match self {
            Finding::MissingModel(r) | Finding::MissingTexture(r) => r,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingModel(r) => write!(f, "MODEL MISSING: {}", r),
            Finding::MissingTexture(r) => write!(f, "TEXTURE MISSING: {}", r),
        }
    }
}

/// Model references contributed by one feature tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileSummary {
    pub tile: String,
    #[serde(skip)]
    pub address: TileAddress,
    pub model_references: usize,
}

/// Result of auditing one dataset family.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub family: DatasetFamily,
    pub generated_at: DateTime<Utc>,
    /// Tiles that contributed at least one model reference, in scan order
    pub tiles: Vec<TileSummary>,
    /// Unique model references examined
    pub models: usize,
    /// Unique texture references examined
    pub textures: usize,
    pub findings: Vec<Finding>,
    /// Set when the sample limit or the finding cap cut the audit short
    pub truncated: bool,
}

impl Report {
    pub fn new(family: DatasetFamily) -> Self {
        Self {
            family,
            generated_at: Utc::now(),
            tiles: Vec::new(),
            models: 0,
            textures: 0,
            findings: Vec::new(),
            truncated: false,
        }
    }

    pub fn missing_models(&self) -> impl Iterator<Item = &AssetRef> {
        self.findings.iter().filter_map(|f| match f {
            Finding::MissingModel(r) => Some(r),
            _ => None,
        })
    }

    pub fn missing_textures(&self) -> impl Iterator<Item = &AssetRef> {
        self.findings.iter().filter_map(|f| match f {
            Finding::MissingTexture(r) => Some(r),
            _ => None,
        })
    }
}
