//! Locators for model and texture assets.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

const ARCHIVE_MARKER: &str = ".zip/";

/// Where an asset lives: a plain file, or an entry inside a zip archive.
///
/// Renders as `<path>` or `<archive>.zip/<entry>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetRef {
    File(PathBuf),
    ArchiveEntry { archive: PathBuf, entry: String },
}

/// Resolved location of an OpenFlight model.
pub type ModelReference = AssetRef;
/// Resolved location of a model texture.
pub type TextureReference = AssetRef;

impl AssetRef {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        AssetRef::File(path.into())
    }

    pub fn entry(archive: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        AssetRef::ArchiveEntry {
            archive: archive.into(),
            entry: entry.into(),
        }
    }

    /// Parse a locator string; the first `.zip/` splits archive from entry.
    pub fn parse(locator: &str) -> Self {
        match locator.find(ARCHIVE_MARKER) {
            Some(pos) => {
                let split = pos + ARCHIVE_MARKER.len() - 1;
                AssetRef::entry(&locator[..split], &locator[split + 1..])
            }
            None => AssetRef::file(locator),
        }
    }

    /// File name of the asset itself (the entry name for archive members).
    pub fn name(&self) -> Option<&str> {
        match self {
            AssetRef::File(path) => path.file_name().and_then(|n| n.to_str()),
            AssetRef::ArchiveEntry { entry, .. } => Some(entry.as_str()),
        }
    }

    /// Directory holding the asset; for archive members this is the archive path itself.
    pub fn container(&self) -> Option<&Path> {
        match self {
            AssetRef::File(path) => path.parent(),
            AssetRef::ArchiveEntry { archive, .. } => Some(archive.as_path()),
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::File(path) => write!(f, "{}", path.display()),
            AssetRef::ArchiveEntry { archive, entry } => {
                write!(f, "{}/{}", archive.display(), entry)
            }
        }
    }
}

impl Serialize for AssetRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_archive_entry() {
        let r = AssetRef::parse("/cdb/Tiles/N34/W118/300_GSModelGeometry/L00/U0/x.zip/x_AL015_000_1.flt");
        assert_eq!(
            r,
            AssetRef::entry(
                "/cdb/Tiles/N34/W118/300_GSModelGeometry/L00/U0/x.zip",
                "x_AL015_000_1.flt"
            )
        );
        assert_eq!(r.name(), Some("x_AL015_000_1.flt"));
        assert_eq!(
            r.to_string(),
            "/cdb/Tiles/N34/W118/300_GSModelGeometry/L00/U0/x.zip/x_AL015_000_1.flt"
        );
    }

    #[test]
    fn test_parse_plain_file() {
        let r = AssetRef::parse("/cdb/GTModel/a.flt");
        assert_eq!(r, AssetRef::file("/cdb/GTModel/a.flt"));
        assert_eq!(r.container(), Some(Path::new("/cdb/GTModel")));
    }

    #[test]
    fn test_serializes_as_locator() {
        let r = AssetRef::entry("/a/b.zip", "c.rgb");
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"/a/b.zip/c.rgb\"");
    }
}
