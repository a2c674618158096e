//! Zip archive access and archive-aware existence checks.
//!
//! CDB packages per-tile models and textures in zip archives. Lookups only read
//! the central directory; entry names are matched exactly (case-sensitive, no
//! path normalisation).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use hashbrown::{HashMap, HashSet};
use tracing::debug;
use zip::ZipArchive;

use crate::error::Result;
use crate::models::AssetRef;

const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

fn open(archive_path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(archive_path)?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

/// Names of every entry in the archive.
pub fn list_entries(archive_path: &Path) -> Result<Vec<String>> {
    let archive = open(archive_path)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// True when the archive opens and holds `entry`. Unopenable archives count as absent.
pub fn locate(archive_path: &Path, entry: &str) -> bool {
    match open(archive_path) {
        Ok(archive) => archive.file_names().any(|name| name == entry),
        Err(e) => {
            debug!("Cannot open archive {}: {}", archive_path.display(), e);
            false
        }
    }
}

/// Decompressed bytes of one archive entry.
pub fn extract(archive_path: &Path, entry: &str) -> Result<Vec<u8>> {
    let mut archive = open(archive_path)?;
    let mut file = archive.by_name(entry)?;
    // Declared sizes come from the central directory and may be corrupt
    let capacity = file.size().min(MAX_PREALLOCATION) as usize;
    let mut bytes = Vec::with_capacity(capacity);
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Open a reader over the bytes of an asset, wherever it lives.
pub fn read_asset(asset: &AssetRef) -> Result<Box<dyn Read>> {
    match asset {
        AssetRef::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        AssetRef::ArchiveEntry { archive, entry } => {
            Ok(Box::new(std::io::Cursor::new(extract(archive, entry)?)))
        }
    }
}

/// Existence checks for plain files and archive members.
///
/// Archive central directories are read once and cached, so checking many
/// textures packed in the same archive opens it a single time.
#[derive(Debug, Default)]
pub struct ExistenceChecker {
    directories: Mutex<HashMap<PathBuf, Option<Arc<HashSet<String>>>>>,
}

impl ExistenceChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, asset: &AssetRef) -> bool {
        match asset {
            AssetRef::File(path) => path.is_file(),
            AssetRef::ArchiveEntry { archive, entry } => self
                .directory(archive)
                .map(|names| names.contains(entry.as_str()))
                .unwrap_or(false),
        }
    }

    fn directory(&self, archive: &Path) -> Option<Arc<HashSet<String>>> {
        if let Some(cached) = self.lock().get(archive) {
            return cached.clone();
        }

        // Read outside the lock
        let names = match list_entries(archive) {
            Ok(names) => Some(Arc::new(names.into_iter().collect::<HashSet<_>>())),
            Err(e) => {
                debug!("Cannot open archive {}: {}", archive.display(), e);
                None
            }
        };
        self.lock().insert(archive.to_path_buf(), names.clone());
        names
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Option<Arc<HashSet<String>>>>> {
        self.directories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
