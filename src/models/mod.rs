//! Core data models for the audit.

pub mod asset;
pub mod finding;

pub use asset::{AssetRef, ModelReference, TextureReference};
pub use finding::{DatasetFamily, Finding, Report, TileSummary};
