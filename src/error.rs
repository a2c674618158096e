//! Error types for the CDB audit library.

use thiserror::Error;

/// Errors surfaced by the tile codec, collaborators and the reporter.
///
/// Data-completeness problems (missing models, textures, attribute files) are
/// not errors; they are recorded as findings. Only structural problems end up here.
#[derive(Debug, Error)]
pub enum CdbError {
    /// A tile file name does not follow the 7-token grammar.
    #[error("invalid tile file name '{name}': {reason}")]
    AddressDecode { name: String, reason: String },

    /// A model could not be opened or parsed, so its textures are unknown.
    #[error("model unreadable: {reference}: {reason}")]
    ModelUnreadable { reference: String, reason: String },

    /// OpenFlight stream is truncated or not OpenFlight at all.
    #[error("malformed OpenFlight data: {0}")]
    SceneFile(String),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("dbf error: {0}")]
    Dbf(#[from] shapefile::dbase::Error),

    /// Invalid audit configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CdbError {
    pub(crate) fn decode(name: &str, reason: impl Into<String>) -> Self {
        CdbError::AddressDecode {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CdbError>;
