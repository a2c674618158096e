//! cdbaudit - completeness audits for CDB geospatial simulation databases.
//!
//! Decodes CDB tile addresses, walks feature tiles, resolves the 3D models and
//! textures they reference (plain files or zip archive members) and reports
//! every referenced asset that is missing.

pub mod archive;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod openflight;
pub mod report;
pub mod resolve;
pub mod scanner;
pub mod tiles;

pub use config::AuditConfig;
pub use error::{CdbError, Result};
pub use models::{AssetRef, DatasetFamily, Finding, Report};
pub use report::{FindingSink, MissingDataReporter, TracingSink};
pub use tiles::{GeoBounds, TileAddress};
