//! Level-of-detail geometry.
//!
//! A geocell at LOD 0 is one tile of 1024x1024 pixels. Each positive LOD halves
//! the tile's angular size; negative LODs keep the geocell extent and shrink the
//! raster instead.

use super::latitude::tile_width_at_latitude;

/// Coarsest LOD considered when searching by pixel size.
pub const MIN_LOD: i32 = -10;
/// Finest LOD defined by CDB.
pub const MAX_LOD: i32 = 23;
/// Raster dimension of a tile at LOD 0 and above.
pub const MAX_TILE_DIMENSION: u32 = 1024;

/// `max(2^lod, 1)`: number of tile rows per geocell at `lod`.
pub fn lod_divisor(lod: i32) -> f64 {
    if lod <= 0 {
        1.0
    } else {
        2f64.powi(lod)
    }
}

/// Number of tile rows (and columns) inside one geocell.
pub fn rows_for_lod(lod: i32) -> i32 {
    if lod <= 0 {
        1
    } else {
        1 << lod.min(MAX_LOD)
    }
}

/// Latitudinal angular size of one tile, in degrees.
pub fn pixel_size_for_lod(lod: i32) -> f64 {
    1.0 / lod_divisor(lod)
}

/// Raster dimension of a tile: `min(2^(lod+10), 1024)`.
pub fn tile_dimension_for_lod(lod: i32) -> u32 {
    let exponent = lod + 10;
    if exponent < 0 {
        0
    } else if exponent >= 10 {
        MAX_TILE_DIMENSION
    } else {
        1 << exponent
    }
}

/// First LOD in `[MIN_LOD, MAX_LOD]` whose pixel spacing is strictly finer than `pixel_size`.
pub fn lod_for_pixel_size(pixel_size: f64) -> i32 {
    (MIN_LOD..=MAX_LOD)
        .find(|&lod| (1.0 / 1024.0) / 2f64.powi(lod) < pixel_size)
        .unwrap_or(MAX_LOD)
}

/// Smaller of the latitudinal and longitudinal tile spacing at `latitude`.
pub fn minimum_pixel_size_for_lod(lod: i32, latitude: f64) -> f64 {
    let div = lod_divisor(lod);
    let lat_spacing = 1.0 / div;
    let lon_spacing = f64::from(tile_width_at_latitude(latitude)) / div;
    lat_spacing.min(lon_spacing)
}
