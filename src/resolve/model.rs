use std::path::{Path, PathBuf};

use tracing::debug;

use crate::features::{AttributeIndex, AttributeSource, FeatureClassDictionary, FeatureSource};
use crate::models::{AssetRef, DatasetFamily, ModelReference};
use crate::tiles::dataset::{dataset_subdirectory, GS_MODEL_GEOMETRY, GT_MODEL_GEOMETRY};
use crate::tiles::{GeoBounds, TileAddress};

pub const CNAM: &str = "CNAM";
pub const FACC: &str = "FACC";
pub const FSC: &str = "FSC";
pub const MODL: &str = "MODL";

const GT_MODEL_DIR: &str = "GTModel";
const GT_MODEL_PREFIX: &str = "D500_S001_T001";

/// Model identity carried by one attribute row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModelKey<'a> {
    facc: &'a str,
    fsc: String,
    modl: &'a str,
}

impl ModelKey<'_> {
    fn suffix(&self) -> String {
        format!("{}_{}_{}.flt", self.facc, self.fsc, self.modl)
    }
}

/// Joins feature geometry to attribute rows and derives model locations.
pub struct ModelResolver<'a> {
    root: PathBuf,
    features: &'a dyn FeatureSource,
    attributes: &'a dyn AttributeSource,
    dictionary: &'a dyn FeatureClassDictionary,
    model_dataset: i32,
}

impl<'a> ModelResolver<'a> {
    pub fn new(
        root: &Path,
        features: &'a dyn FeatureSource,
        attributes: &'a dyn AttributeSource,
        dictionary: &'a dyn FeatureClassDictionary,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            features,
            attributes,
            dictionary,
            model_dataset: GS_MODEL_GEOMETRY,
        }
    }

    /// Dataset code of the per-tile GS model archives.
    pub fn with_model_dataset(mut self, dataset: i32) -> Self {
        self.model_dataset = dataset;
        self
    }

    /// Model references of every feature in `tile`, in feature order.
    ///
    /// Missing layers, empty attribute tables and unmatched features contribute nothing.
    pub fn resolve(
        &self,
        tile: &TileAddress,
        family: DatasetFamily,
        filter: Option<&GeoBounds>,
    ) -> Vec<ModelReference> {
        let features = self
            .features
            .features(&tile.tile_file(&self.root, "shp"), &[CNAM], filter);
        if features.is_empty() {
            return Vec::new();
        }

        let attribute_file = tile.attribute_layer().tile_file(&self.root, "dbf");
        let index = AttributeIndex::build(self.attributes.records(&attribute_file), CNAM);
        if index.is_empty() {
            debug!("{}: no attribute rows in {}", tile, attribute_file.display());
            return Vec::new();
        }

        let mut models = Vec::new();
        for feature in &features {
            let Some(cnam) = feature.attribute(CNAM) else {
                continue;
            };
            let Some(record) = index.get(cnam) else {
                continue;
            };
            // Absent FACC or MODL still yields a reference
            let (facc, modl) = (record.get(FACC), record.get(MODL));
            if facc.is_none() || modl.is_none() {
                debug!("{}: CNAM {} lacks FACC or MODL", tile, cnam);
            }
            let key = ModelKey {
                facc: facc.unwrap_or(""),
                fsc: format!("{:0>3}", record.get(FSC).unwrap_or("0")),
                modl: modl.unwrap_or(""),
            };
            models.push(match family {
                DatasetFamily::Gs => self.gs_reference(tile, &key),
                DatasetFamily::Gt => self.gt_reference(&key),
            });
        }
        models
    }

    fn gs_reference(&self, tile: &TileAddress, key: &ModelKey<'_>) -> ModelReference {
        let archive_tile = tile.with_component(self.model_dataset, 1, 1);
        AssetRef::entry(
            archive_tile.tile_file(&self.root, "zip"),
            format!("{}_{}", archive_tile.file_name(), key.suffix()),
        )
    }

    fn gt_reference(&self, key: &ModelKey<'_>) -> ModelReference {
        AssetRef::file(
            self.root
                .join(GT_MODEL_DIR)
                .join(dataset_subdirectory(GT_MODEL_GEOMETRY))
                .join(self.dictionary.subdirectory(key.facc))
                .join(format!("{}_{}", GT_MODEL_PREFIX, key.suffix())),
        )
    }
}
