//! CDB tile addressing.
//!
//! Converts between structured tile addresses, their file names and directory
//! paths, and computes tile geometry from the LOD and latitude band.

mod address;
pub mod dataset;
pub mod latitude;
pub mod lod;

pub use address::{tiles_for_region, GeoBounds, TileAddress};
pub use latitude::tile_width_at_latitude;
