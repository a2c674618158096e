//! Feature → model → texture cross-reference resolution.

mod model;
mod scene;
mod texture;

pub use model::{ModelResolver, CNAM, FACC, FSC, MODL};
pub use scene::{OpenFlightSource, SceneSource};
pub use texture::{palette_file_name, TextureResolver, TextureStrategy};
