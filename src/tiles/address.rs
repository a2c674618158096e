//! Tile addressing: file-name and directory-path grammars, and geographic bounds.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::dataset::dataset_subdirectory;
use super::latitude::tile_width_at_latitude;
use super::lod::{lod_divisor, rows_for_lod};
use crate::error::{CdbError, Result};

/// Number of underscore separated tokens in a tile file name.
const TOKEN_COUNT: usize = 7;

/// Geographic extent in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    /// Build from the south/west/north/east order used on the command line.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// True when the two extents share interior area. Touching edges do not count.
    pub fn overlaps(&self, other: &GeoBounds) -> bool {
        !(self.north <= other.south
            || self.south >= other.north
            || self.east <= other.west
            || self.west >= other.east)
    }

    /// True when the extents overlap or share an edge.
    pub fn intersects(&self, other: &GeoBounds) -> bool {
        !(self.north < other.south
            || self.south > other.north
            || self.east < other.west
            || self.west > other.east)
    }
}

impl fmt::Display for GeoBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N={}, S={}, E={}, W={}",
            self.north, self.south, self.east, self.west
        )
    }
}

/// Structured address of one CDB tile.
///
/// Field order doubles as the sort order used for deterministic reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileAddress {
    /// Southern edge of the geocell, whole degrees (south negative)
    pub latitude: i32,
    /// Western edge of the geocell, whole degrees (west negative)
    pub longitude: i32,
    pub dataset: i32,
    pub selector1: i32,
    pub selector2: i32,
    /// Level of detail; negative values are the `LC` levels
    pub lod: i32,
    pub uref: i32,
    pub rref: i32,
}

impl TileAddress {
    /// Decode a tile base name such as `N34W118_D100_S001_T001_L00_U0_R0`.
    ///
    /// Exactly seven tokens are required; use [`TileAddress::from_prefix`] for
    /// asset names that append further tokens.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let tokens: Vec<&str> = name.split('_').collect();
        if tokens.len() != TOKEN_COUNT {
            return Err(CdbError::decode(
                name,
                format!("expected {} tokens, found {}", TOKEN_COUNT, tokens.len()),
            ));
        }
        Self::from_tokens(name, &tokens)
    }

    /// Decode the tile address carried by the first seven tokens of an asset name,
    /// e.g. `N34W118_D301_S001_T001_L06_U0_R1_AL015_000_roof`.
    pub fn from_prefix(name: &str) -> Result<Self> {
        let tokens: Vec<&str> = name.split('_').take(TOKEN_COUNT).collect();
        if tokens.len() < TOKEN_COUNT {
            return Err(CdbError::decode(
                name,
                format!("expected at least {} tokens, found {}", TOKEN_COUNT, tokens.len()),
            ));
        }
        Self::from_tokens(name, &tokens)
    }

    fn from_tokens(name: &str, tokens: &[&str]) -> Result<Self> {
        let (latitude, longitude) = decode_geocell(name, tokens[0])?;
        let lod = match tokens[4].strip_prefix("LC") {
            Some(digits) => -parse_number(name, digits, "LOD")?,
            None => parse_prefixed(name, tokens[4], 'L', "LOD")?,
        };

        Ok(Self {
            latitude,
            longitude,
            dataset: parse_prefixed(name, tokens[1], 'D', "dataset")?,
            selector1: parse_prefixed(name, tokens[2], 'S', "selector1")?,
            selector2: parse_prefixed(name, tokens[3], 'T', "selector2")?,
            lod,
            uref: parse_prefixed(name, tokens[5], 'U', "uref")?,
            rref: parse_prefixed(name, tokens[6], 'R', "rref")?,
        })
    }

    /// Canonical file base name (no extension).
    pub fn file_name(&self) -> String {
        let ns = if self.latitude >= 0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0 { 'E' } else { 'W' };
        let lc = if self.lod >= 0 { "L" } else { "LC" };
        format!(
            "{}{:02}{}{:03}_D{:03}_S{:03}_T{:03}_{}{:02}_U{}_R{}",
            ns,
            self.latitude.abs(),
            ew,
            self.longitude.abs(),
            self.dataset,
            self.selector1,
            self.selector2,
            lc,
            self.lod.abs(),
            self.uref,
            self.rref
        )
    }

    /// Directory of the tile relative to `<root>/Tiles`.
    ///
    /// Negative LODs always live under `LC/U0`, whatever their `uref`.
    pub fn directory_path(&self) -> String {
        let ns = if self.latitude >= 0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0 { 'E' } else { 'W' };
        let geocell = format!(
            "{}{:02}/{}{:03}/{}",
            ns,
            self.latitude.abs(),
            ew,
            self.longitude.abs(),
            dataset_subdirectory(self.dataset)
        );
        if self.lod < 0 {
            format!("{}/LC/U0", geocell)
        } else {
            format!("{}/L{:02}/U{}", geocell, self.lod, self.uref)
        }
    }

    /// Full path of the tile's file with the given extension under a database root.
    pub fn tile_file(&self, root: &Path, extension: &str) -> PathBuf {
        root.join("Tiles")
            .join(self.directory_path())
            .join(format!("{}.{}", self.file_name(), extension))
    }

    /// Same tile position in another dataset component.
    pub fn with_component(&self, dataset: i32, selector1: i32, selector2: i32) -> Self {
        Self {
            dataset,
            selector1,
            selector2,
            ..*self
        }
    }

    /// Companion attribute layer of a feature geometry layer (`selector2 + 1`).
    pub fn attribute_layer(&self) -> Self {
        Self {
            selector2: self.selector2 + 1,
            ..*self
        }
    }

    /// Geographic bounds of the tile.
    pub fn bounds(&self) -> GeoBounds {
        let div = lod_divisor(self.lod);
        let lat_spacing = 1.0 / div;
        let lon_spacing = f64::from(tile_width_at_latitude(f64::from(self.latitude))) / div;
        let south = f64::from(self.latitude) + lat_spacing * f64::from(self.uref);
        let west = f64::from(self.longitude) + lon_spacing * f64::from(self.rref);
        GeoBounds {
            north: south + lat_spacing,
            south,
            east: west + lon_spacing,
            west,
        }
    }

    pub fn bounds_string(&self) -> String {
        self.bounds().to_string()
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

impl FromStr for TileAddress {
    type Err = CdbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_file_name(s)
    }
}

/// Every tile of one dataset component at `lod` whose bounds overlap `region`.
pub fn tiles_for_region(
    lod: i32,
    region: &GeoBounds,
    dataset: i32,
    selector1: i32,
    selector2: i32,
) -> Vec<TileAddress> {
    let mut result = Vec::new();
    let rows = rows_for_lod(lod);
    let lat_start = (region.south.floor() as i32).max(-90);
    let lat_end = (region.north.ceil() as i32).min(90);

    for latitude in lat_start..lat_end {
        let width = tile_width_at_latitude(f64::from(latitude)) as i32;
        // Geocells are aligned to multiples of their width from the antimeridian
        let offset = ((region.west.max(-180.0) + 180.0) / f64::from(width)).floor() as i32;
        let mut longitude = -180 + offset * width;
        let lon_end = (region.east.ceil() as i32).min(180);

        while longitude < lon_end {
            for uref in 0..rows {
                for rref in 0..rows {
                    let tile = TileAddress {
                        latitude,
                        longitude,
                        dataset,
                        selector1,
                        selector2,
                        lod,
                        uref,
                        rref,
                    };
                    if tile.bounds().overlaps(region) {
                        result.push(tile);
                    }
                }
            }
            longitude += width;
        }
    }

    result
}

fn decode_geocell(name: &str, token: &str) -> Result<(i32, i32)> {
    let mut chars = token.chars();
    let lat_sign = match chars.next() {
        Some('N') => 1,
        Some('S') => -1,
        _ => return Err(CdbError::decode(name, "latitude must start with N or S")),
    };
    let split = token
        .find(|c: char| c == 'E' || c == 'W')
        .ok_or_else(|| CdbError::decode(name, "longitude must start with E or W"))?;
    let lon_sign = if token[split..].starts_with('E') { 1 } else { -1 };
    let latitude = parse_number(name, &token[1..split], "latitude")?;
    let longitude = parse_number(name, &token[split + 1..], "longitude")?;
    Ok((lat_sign * latitude, lon_sign * longitude))
}

fn parse_prefixed(name: &str, token: &str, prefix: char, field: &str) -> Result<i32> {
    let digits = token
        .strip_prefix(prefix)
        .ok_or_else(|| CdbError::decode(name, format!("{} token must start with '{}'", field, prefix)))?;
    parse_number(name, digits, field)
}

fn parse_number(name: &str, digits: &str, field: &str) -> Result<i32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CdbError::decode(
            name,
            format!("{} '{}' is not a number", field, digits),
        ));
    }
    digits
        .parse()
        .map_err(|_| CdbError::decode(name, format!("{} '{}' out of range", field, digits)))
}
