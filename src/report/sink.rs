use std::sync::Mutex;

use tracing::{debug, info};

use crate::models::{DatasetFamily, Finding};
use crate::tiles::TileAddress;

/// Receives audit progress as the reporter produces it.
///
/// Calls arrive in report order from the coordinating thread.
pub trait FindingSink: Send + Sync {
    /// A tile contributed `model_references` model references.
    fn tile_resolved(&self, family: DatasetFamily, tile: &TileAddress, model_references: usize);

    fn finding(&self, finding: &Finding);
}

/// Writes tile summaries and findings to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl FindingSink for TracingSink {
    fn tile_resolved(&self, family: DatasetFamily, tile: &TileAddress, model_references: usize) {
        info!("{} TILE: {} ({} model references)", family, tile, model_references);
        debug!("{}: {}", tile, tile.bounds_string());
    }

    fn finding(&self, finding: &Finding) {
        info!("{}", finding);
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    tiles: Mutex<Vec<(TileAddress, usize)>>,
    findings: Mutex<Vec<Finding>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tiles(&self) -> Vec<(TileAddress, usize)> {
        self.tiles
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    pub fn findings(&self) -> Vec<Finding> {
        self.findings
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }
}

impl FindingSink for CollectingSink {
    fn tile_resolved(&self, _family: DatasetFamily, tile: &TileAddress, model_references: usize) {
        if let Ok(mut tiles) = self.tiles.lock() {
            tiles.push((*tile, model_references));
        }
    }

    fn finding(&self, finding: &Finding) {
        if let Ok(mut findings) = self.findings.lock() {
            findings.push(finding.clone());
        }
    }
}
