//! Feature-layer collaborators: vector geometry, attribute tables and the
//! feature-class dictionary.

mod attributes;
mod dictionary;
mod vector;

pub use attributes::{AttributeIndex, AttributeRecord, AttributeSource, DbfSource};
pub use dictionary::{FeatureClassDictionary, FeatureDataDictionary};
pub use vector::{Feature, FeatureSource, ShapefileSource};
