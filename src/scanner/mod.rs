//! Geocell scanner.
//!
//! Walks `Tiles/<lat>/<lon>/<dataset>/<lod>/<uref>/*` for one dataset and turns
//! the file names found there into tile addresses.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::tiles::{GeoBounds, TileAddress};

/// Depth of tile files below a geocell directory: dataset/lod/uref/file.
const FILE_DEPTH_IN_GEOCELL: usize = 4;

/// Odd `selector2` codes are primary geometry layers; even codes are their attribute companions.
pub fn is_feature_layer(tile: &TileAddress) -> bool {
    matches!(tile.selector2, 1 | 3 | 5 | 7 | 9)
}

/// True when `root` carries the CDB version metadata file.
pub fn is_cdb(root: &Path) -> bool {
    root.join("Metadata").join("Version.xml").is_file()
}

/// Geocell directories under `Tiles/`, as `(latitude dir, longitude dir)` name pairs.
pub fn geocells(root: &Path) -> Vec<(String, String)> {
    geocell_dirs(root)
        .into_iter()
        .filter_map(|dir| {
            let lon = dir.file_name()?.to_str()?.to_string();
            let lat = dir.parent()?.file_name()?.to_str()?.to_string();
            Some((lat, lon))
        })
        .collect()
}

fn geocell_dirs(root: &Path) -> Vec<PathBuf> {
    let tiles = root.join("Tiles");
    if !tiles.is_dir() {
        warn!("No Tiles directory under {}", root.display());
        return Vec::new();
    }

    WalkDir::new(&tiles)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_dir() => Some(e.into_path()),
            Ok(_) => None,
            Err(e) => {
                warn!("Skipping unreadable geocell entry: {}", e);
                None
            }
        })
        .collect()
}

fn dataset_dir_matches(name: &OsStr, prefix: &str) -> bool {
    name.to_str()
        .map(|n| n.len() >= 3 && &n.as_bytes()[..3] == prefix.as_bytes())
        .unwrap_or(false)
}

/// Base names (extension stripped) of every file stored for `dataset`, deduplicated.
///
/// Geocells are walked in parallel; the result keeps first-seen order.
pub fn file_names_for_dataset(root: &Path, dataset: i32) -> Vec<String> {
    let prefix = format!("{:03}", dataset);

    let per_geocell: Vec<Vec<String>> = geocell_dirs(root)
        .par_iter()
        .map(|geocell| {
            // min_depth would hide the dataset directories from filter_entry
            WalkDir::new(geocell)
                .max_depth(FILE_DEPTH_IN_GEOCELL)
                .into_iter()
                .filter_entry(|e| e.depth() != 1 || dataset_dir_matches(e.file_name(), &prefix))
                .filter_map(|entry| match entry {
                    Ok(e) if e.depth() == FILE_DEPTH_IN_GEOCELL && e.file_type().is_file() => e
                        .path()
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .map(str::to_string),
                    Ok(_) => None,
                    Err(e) => {
                        debug!("Skipping unreadable tile entry: {}", e);
                        None
                    }
                })
                .collect()
        })
        .collect();

    let mut seen = HashSet::new();
    per_geocell
        .into_iter()
        .flatten()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Unique tile addresses stored for `dataset`, filtered by `bounds` and `selector`.
///
/// Fails on the first file name that is not a tile name. Order follows the
/// directory walk; sort the result when determinism matters.
pub fn tiles_for_dataset<F>(
    root: &Path,
    dataset: i32,
    bounds: Option<&GeoBounds>,
    selector: F,
) -> Result<Vec<TileAddress>>
where
    F: Fn(&TileAddress) -> bool,
{
    let names = file_names_for_dataset(root, dataset);
    let mut tiles = Vec::with_capacity(names.len());

    for name in &names {
        let tile = TileAddress::from_file_name(name)?;
        if !selector(&tile) {
            continue;
        }
        if let Some(region) = bounds {
            if !tile.bounds().overlaps(region) {
                continue;
            }
        }
        tiles.push(tile);
    }

    info!(
        "Dataset {:03}: {} files, {} qualifying tiles",
        dataset,
        names.len(),
        tiles.len()
    );
    Ok(tiles)
}

/// Primary geometry tiles of a feature dataset.
pub fn feature_tiles(
    root: &Path,
    dataset: i32,
    bounds: Option<&GeoBounds>,
) -> Result<Vec<TileAddress>> {
    tiles_for_dataset(root, dataset, bounds, is_feature_layer)
}
