use tracing::debug;

use crate::archive;
use crate::error::{CdbError, Result};
use crate::models::ModelReference;
use crate::openflight;

/// Source of the texture names a model embeds.
pub trait SceneSource: Send + Sync {
    /// Texture palette file names of `model`, in palette order.
    ///
    /// Fails with [`CdbError::ModelUnreadable`] when the model cannot be opened or parsed.
    fn texture_names(&self, model: &ModelReference) -> Result<Vec<String>>;
}

/// Reads OpenFlight models from plain files or zip archive entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlightSource;

impl SceneSource for OpenFlightSource {
    fn texture_names(&self, model: &ModelReference) -> Result<Vec<String>> {
        let reader = archive::read_asset(model).map_err(|e| unreadable(model, e))?;
        let names = openflight::texture_names(reader).map_err(|e| unreadable(model, e))?;
        debug!("{}: {} palette textures", model, names.len());
        Ok(names)
    }
}

fn unreadable(model: &ModelReference, cause: CdbError) -> CdbError {
    CdbError::ModelUnreadable {
        reference: model.to_string(),
        reason: cause.to_string(),
    }
}
