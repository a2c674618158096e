use std::path::{Path, PathBuf};

use crate::archive::ExistenceChecker;
use crate::models::{AssetRef, DatasetFamily, ModelReference, TextureReference};
use crate::tiles::dataset::GS_MODEL_TEXTURE;
use crate::tiles::TileAddress;

/// One way of locating a texture named by a model's palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureStrategy {
    /// Plain file next to the model's archive. Only taken when the file exists.
    ArchiveSibling,
    /// Entry of the per-tile texture archive addressed by the texture's own name.
    TileArchive,
    /// Plain file in the model's own directory.
    ModelDirectory,
}

const GS_STRATEGIES: &[TextureStrategy] =
    &[TextureStrategy::ArchiveSibling, TextureStrategy::TileArchive];
const GT_STRATEGIES: &[TextureStrategy] = &[TextureStrategy::ModelDirectory];

impl TextureStrategy {
    /// Strategies tried, in order, for a dataset family.
    pub fn for_family(family: DatasetFamily) -> &'static [TextureStrategy] {
        match family {
            DatasetFamily::Gs => GS_STRATEGIES,
            DatasetFamily::Gt => GT_STRATEGIES,
        }
    }

    /// Whether a candidate must already exist for the strategy to succeed.
    pub fn requires_existing(self) -> bool {
        matches!(self, TextureStrategy::ArchiveSibling)
    }

    /// Where this strategy would place `texture`, if it applies at all.
    pub fn candidate(
        self,
        root: &Path,
        texture_dataset: i32,
        model: &ModelReference,
        texture: &str,
    ) -> Option<TextureReference> {
        match self {
            TextureStrategy::ArchiveSibling => match model {
                AssetRef::ArchiveEntry { archive, .. } => {
                    Some(AssetRef::file(archive.parent()?.join(texture)))
                }
                AssetRef::File(path) => Some(AssetRef::file(path.parent()?.join(texture))),
            },
            TextureStrategy::TileArchive => {
                let stem = Path::new(texture).file_stem()?.to_str()?;
                let tile = TileAddress::from_prefix(stem)
                    .ok()?
                    .with_component(texture_dataset, 1, 1);
                Some(AssetRef::entry(tile.tile_file(root, "zip"), texture))
            }
            TextureStrategy::ModelDirectory => {
                Some(AssetRef::file(model.container()?.join(texture)))
            }
        }
    }
}

/// Palette entries may carry a directory; only the file name locates the texture.
pub fn palette_file_name(raw: &str) -> &str {
    raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(raw)
}

/// Derives texture locations for resolved models.
pub struct TextureResolver<'a> {
    root: PathBuf,
    checker: &'a ExistenceChecker,
    texture_dataset: i32,
}

impl<'a> TextureResolver<'a> {
    pub fn new(root: &Path, checker: &'a ExistenceChecker) -> Self {
        Self {
            root: root.to_path_buf(),
            checker,
            texture_dataset: GS_MODEL_TEXTURE,
        }
    }

    /// Dataset code of the per-tile GS texture archives.
    pub fn with_texture_dataset(mut self, dataset: i32) -> Self {
        self.texture_dataset = dataset;
        self
    }

    /// Location of palette texture `name` used by `model`.
    ///
    /// The first applicable strategy wins. When none applies the first
    /// strategy's unchecked candidate is returned so the texture can still be
    /// reported as missing.
    pub fn resolve(
        &self,
        family: DatasetFamily,
        model: &ModelReference,
        name: &str,
    ) -> TextureReference {
        let texture = palette_file_name(name);
        let strategies = TextureStrategy::for_family(family);

        for &strategy in strategies {
            let Some(candidate) =
                strategy.candidate(&self.root, self.texture_dataset, model, texture)
            else {
                continue;
            };
            if !strategy.requires_existing() || self.checker.exists(&candidate) {
                return candidate;
            }
        }

        strategies
            .first()
            .and_then(|s| s.candidate(&self.root, self.texture_dataset, model, texture))
            .unwrap_or_else(|| AssetRef::file(texture))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gs_model(root: &Path) -> ModelReference {
        let archive = root.join(
            "Tiles/N34/W118/300_GSModelGeometry/L06/U0/N34W118_D300_S001_T001_L06_U0_R1.zip",
        );
        AssetRef::entry(archive, "N34W118_D300_S001_T001_L06_U0_R1_AL015_001_barn.flt")
    }

    #[test]
    fn test_gs_prefers_existing_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let model = gs_model(dir.path());
        let u_dir = dir.path().join("Tiles/N34/W118/300_GSModelGeometry/L06/U0");
        std::fs::create_dir_all(&u_dir).unwrap();
        std::fs::write(u_dir.join("shared.rgb"), b"x").unwrap();

        let checker = ExistenceChecker::new();
        let resolver = TextureResolver::new(dir.path(), &checker);
        assert_eq!(
            resolver.resolve(DatasetFamily::Gs, &model, "shared.rgb"),
            AssetRef::file(u_dir.join("shared.rgb"))
        );
    }

    #[test]
    fn test_gs_falls_back_to_texture_tile_archive() {
        let root = Path::new("/cdb");
        let checker = ExistenceChecker::new();
        let resolver = TextureResolver::new(root, &checker);
        let name = "N34W118_D301_S001_T001_L06_U0_R1_AL015_001_roof.rgb";

        assert_eq!(
            resolver.resolve(DatasetFamily::Gs, &gs_model(root), name),
            AssetRef::entry(
                "/cdb/Tiles/N34/W118/301_GSModelTexture/L06/U0/N34W118_D301_S001_T001_L06_U0_R1.zip",
                name
            )
        );
    }

    #[test]
    fn test_gs_undecodable_name_keeps_sibling_path() {
        let root = Path::new("/cdb");
        let checker = ExistenceChecker::new();
        let resolver = TextureResolver::new(root, &checker);

        assert_eq!(
            resolver.resolve(DatasetFamily::Gs, &gs_model(root), "textures/plain.rgb"),
            AssetRef::file("/cdb/Tiles/N34/W118/300_GSModelGeometry/L06/U0/plain.rgb")
        );
    }

    #[test]
    fn test_gt_uses_model_directory() {
        let root = Path::new("/cdb");
        let checker = ExistenceChecker::new();
        let resolver = TextureResolver::new(root, &checker);
        let model = AssetRef::file("/cdb/GTModel/500_GTModelGeometry/A_Culture/D500_S001_T001_AL015_001_barn.flt");

        assert_eq!(
            resolver.resolve(DatasetFamily::Gt, &model, "N34W118_D301_S001_T001_L06_U0_R1_x.rgb"),
            AssetRef::file("/cdb/GTModel/500_GTModelGeometry/A_Culture/N34W118_D301_S001_T001_L06_U0_R1_x.rgb")
        );
    }

    #[test]
    fn test_palette_file_name() {
        assert_eq!(palette_file_name("a/b\\c.rgb"), "c.rgb");
        assert_eq!(palette_file_name("c.rgb"), "c.rgb");
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(
            TextureStrategy::for_family(DatasetFamily::Gs),
            &[TextureStrategy::ArchiveSibling, TextureStrategy::TileArchive]
        );
        assert!(!TextureStrategy::TileArchive.requires_existing());
    }
}
