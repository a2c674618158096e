use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use super::sink::FindingSink;
use crate::archive::ExistenceChecker;
use crate::config::AuditConfig;
use crate::error::{CdbError, Result};
use crate::features::{AttributeSource, FeatureClassDictionary, FeatureSource};
use crate::models::{
    DatasetFamily, Finding, ModelReference, Report, TextureReference, TileSummary,
};
use crate::resolve::{ModelResolver, SceneSource, TextureResolver};
use crate::scanner;
use crate::tiles::dataset::{GS_FEATURE, GT_FEATURE};
use crate::tiles::GeoBounds;

/// Runs the feature → model → texture audit for one dataset family.
pub struct MissingDataReporter<'a> {
    root: PathBuf,
    config: AuditConfig,
    features: &'a dyn FeatureSource,
    attributes: &'a dyn AttributeSource,
    scenes: &'a dyn SceneSource,
    dictionary: &'a dyn FeatureClassDictionary,
}

impl<'a> MissingDataReporter<'a> {
    pub fn new(
        root: &Path,
        config: AuditConfig,
        features: &'a dyn FeatureSource,
        attributes: &'a dyn AttributeSource,
        scenes: &'a dyn SceneSource,
        dictionary: &'a dyn FeatureClassDictionary,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            features,
            attributes,
            scenes,
            dictionary,
        }
    }

    /// Audit every feature tile of `family` inside `bounds`.
    ///
    /// Only an undecodable tile file name or an invalid configuration fails
    /// the run; everything missing becomes a finding.
    pub fn run(
        &self,
        family: DatasetFamily,
        bounds: Option<&GeoBounds>,
        sink: &dyn FindingSink,
    ) -> Result<Report> {
        self.config.validate()?;
        match self.config.workers {
            Some(workers) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| CdbError::Config(e.to_string()))?;
                pool.install(|| self.audit(family, bounds, sink))
            }
            None => self.audit(family, bounds, sink),
        }
    }

    fn audit(
        &self,
        family: DatasetFamily,
        bounds: Option<&GeoBounds>,
        sink: &dyn FindingSink,
    ) -> Result<Report> {
        let mut report = Report::new(family);

        let models = self.collect_models(family, bounds, sink, &mut report)?;
        report.models = models.len();
        info!("{} models", models.len());

        let checker = ExistenceChecker::new();
        let Some(textures) = self.collect_textures(family, &models, &checker, sink, &mut report)
        else {
            return Ok(report);
        };
        report.textures = textures.len();
        info!("{} textures", textures.len());

        let missing: Vec<&TextureReference> = textures
            .par_iter()
            .filter(|texture| !checker.exists(texture))
            .collect();
        for texture in missing {
            let finding = Finding::MissingTexture(texture.clone());
            if !record(&mut report, sink, finding, self.config.max_findings) {
                break;
            }
        }

        Ok(report)
    }

    /// Resolve tiles batch by batch into the sorted set of unique models.
    fn collect_models(
        &self,
        family: DatasetFamily,
        bounds: Option<&GeoBounds>,
        sink: &dyn FindingSink,
        report: &mut Report,
    ) -> Result<Vec<ModelReference>> {
        let dataset = match family {
            DatasetFamily::Gs => GS_FEATURE,
            DatasetFamily::Gt => GT_FEATURE,
        };
        let limit = match family {
            DatasetFamily::Gs => self.config.gs_sample_limit,
            DatasetFamily::Gt => None,
        };

        let mut tiles = scanner::feature_tiles(&self.root, dataset, bounds)?;
        tiles.sort();

        let resolver =
            ModelResolver::new(&self.root, self.features, self.attributes, self.dictionary)
                .with_model_dataset(self.config.gs_model_dataset);

        let mut models = BTreeSet::new();
        let mut scanned = 0;
        for batch in tiles.chunks(self.config.batch_size) {
            let resolved: Vec<Vec<ModelReference>> = batch
                .par_iter()
                .map(|tile| resolver.resolve(tile, family, bounds))
                .collect();
            scanned += batch.len();

            for (tile, references) in batch.iter().zip(resolved) {
                if references.is_empty() {
                    continue;
                }
                sink.tile_resolved(family, tile, references.len());
                report.tiles.push(TileSummary {
                    tile: tile.file_name(),
                    address: *tile,
                    model_references: references.len(),
                });
                models.extend(references);
            }

            if let Some(limit) = limit {
                if models.len() > limit {
                    info!(
                        "Sample limit {} reached after {} of {} tiles",
                        limit,
                        scanned,
                        tiles.len()
                    );
                    report.truncated = scanned < tiles.len();
                    break;
                }
            }
        }

        Ok(models.into_iter().collect())
    }

    /// Texture references of every readable model; unreadable models become findings.
    ///
    /// Returns `None` when the finding cap was hit.
    fn collect_textures(
        &self,
        family: DatasetFamily,
        models: &[ModelReference],
        checker: &ExistenceChecker,
        sink: &dyn FindingSink,
        report: &mut Report,
    ) -> Option<Vec<TextureReference>> {
        let resolver = TextureResolver::new(&self.root, checker)
            .with_texture_dataset(self.config.gs_texture_dataset);

        let per_model: Vec<Result<Vec<TextureReference>>> = models
            .par_iter()
            .map(|model| {
                let names = self.scenes.texture_names(model)?;
                Ok(names
                    .iter()
                    .map(|name| resolver.resolve(family, model, name))
                    .collect())
            })
            .collect();

        let mut textures = BTreeSet::new();
        for (model, result) in models.iter().zip(per_model) {
            match result {
                Ok(references) => textures.extend(references),
                Err(e) => {
                    debug!("{}", e);
                    let finding = Finding::MissingModel(model.clone());
                    if !record(report, sink, finding, self.config.max_findings) {
                        return None;
                    }
                }
            }
        }
        Some(textures.into_iter().collect())
    }
}

/// Add a finding; false once the cap is reached and the audit should stop.
fn record(
    report: &mut Report,
    sink: &dyn FindingSink,
    finding: Finding,
    max_findings: Option<usize>,
) -> bool {
    sink.finding(&finding);
    report.findings.push(finding);
    match max_findings {
        Some(max) if report.findings.len() >= max => {
            info!("Stopping after {} findings", report.findings.len());
            report.truncated = true;
            false
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::write_zip;
    use crate::features::FeatureDataDictionary;
    use crate::models::AssetRef;
    use crate::openflight::tests::flight_bytes;
    use crate::report::CollectingSink;
    use crate::resolve::fakes::{FakeAttributes, FakeFeatures, FakeScenes};
    use crate::resolve::OpenFlightSource;
    use crate::tiles::TileAddress;

    struct Fixture {
        dir: tempfile::TempDir,
        features: FakeFeatures,
        attributes: FakeAttributes,
        dictionary: FeatureDataDictionary,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                features: FakeFeatures::default(),
                attributes: FakeAttributes::default(),
                dictionary: FeatureDataDictionary::builtin(),
            }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        /// A feature tile holding one feature per `(cnam, modl)` pair, all matched.
        fn add_tile(&mut self, name: &str, models: &[(&str, &str)]) -> TileAddress {
            let tile = TileAddress::from_file_name(name).unwrap();
            let shp = tile.tile_file(self.root(), "shp");
            std::fs::create_dir_all(shp.parent().unwrap()).unwrap();
            std::fs::write(&shp, b"").unwrap();

            let cnams: Vec<&str> = models.iter().map(|(cnam, _)| *cnam).collect();
            self.features.add(shp, &cnams);
            let rows: Vec<(&str, &str, &str, &str)> = models
                .iter()
                .map(|(cnam, modl)| (*cnam, "AL015", "1", *modl))
                .collect();
            let dbf = tile.attribute_layer().tile_file(self.root(), "dbf");
            self.attributes.add(dbf, &rows);
            tile
        }

        fn reporter<'a>(&'a self, config: AuditConfig, scenes: &'a dyn SceneSource) -> MissingDataReporter<'a> {
            MissingDataReporter::new(
                self.root(),
                config,
                &self.features,
                &self.attributes,
                scenes,
                &self.dictionary,
            )
        }
    }

    fn model_entry(root: &Path, tile: &TileAddress, modl: &str) -> ModelReference {
        let archive_tile = tile.with_component(300, 1, 1);
        AssetRef::entry(
            archive_tile.tile_file(root, "zip"),
            format!("{}_AL015_001_{}.flt", archive_tile.file_name(), modl),
        )
    }

    #[test]
    fn test_gs_end_to_end() {
        let mut fx = Fixture::new();
        let tile = fx.add_tile("N34W118_D100_S001_T001_L06_U0_R1", &[("house", "barn")]);

        let model = model_entry(fx.root(), &tile, "barn");
        let (archive, entry) = match &model {
            AssetRef::ArchiveEntry { archive, entry } => (archive.clone(), entry.clone()),
            AssetRef::File(_) => unreachable!(),
        };
        let present = "N34W118_D301_S001_T001_L06_U0_R1_AL015_001_roof.rgb";
        let absent = "N34W118_D301_S001_T001_L06_U0_R1_AL015_001_wall.rgb";
        write_zip(&archive, &[(entry.as_str(), flight_bytes(&[present, absent]).as_slice())]);

        let texture_archive = tile.with_component(301, 1, 1).tile_file(fx.root(), "zip");
        write_zip(&texture_archive, &[(present, &b"rgb"[..])]);

        let sink = CollectingSink::new();
        let report = fx
            .reporter(AuditConfig::default(), &OpenFlightSource)
            .run(DatasetFamily::Gs, None, &sink)
            .unwrap();

        assert_eq!(report.models, 1);
        assert_eq!(report.textures, 2);
        assert_eq!(
            report.findings,
            vec![Finding::MissingTexture(AssetRef::entry(&texture_archive, absent))]
        );
        assert_eq!(sink.tiles(), vec![(tile, 1)]);
        assert_eq!(sink.findings(), report.findings);
        assert!(!report.truncated);
    }

    #[test]
    fn test_missing_archive_is_one_missing_model() {
        let mut fx = Fixture::new();
        let tile = fx.add_tile("N34W118_D100_S001_T001_L06_U0_R1", &[("house", "barn")]);

        let report = fx
            .reporter(AuditConfig::default(), &OpenFlightSource)
            .run(DatasetFamily::Gs, None, &CollectingSink::new())
            .unwrap();

        assert_eq!(
            report.findings,
            vec![Finding::MissingModel(model_entry(fx.root(), &tile, "barn"))]
        );
        assert_eq!(report.textures, 0);
        assert_eq!(report.missing_textures().count(), 0);
    }

    #[test]
    fn test_unmatched_features_never_reach_the_report() {
        let mut fx = Fixture::new();
        let tile = fx.add_tile("N34W118_D100_S001_T001_L06_U0_R1", &[("house", "barn")]);
        // A second feature with no attribute row
        let shp = tile.tile_file(fx.root(), "shp");
        fx.features.add(shp, &["house", "orphan"]);

        let report = fx
            .reporter(AuditConfig::default(), &FakeScenes::default())
            .run(DatasetFamily::Gs, None, &CollectingSink::new())
            .unwrap();

        assert_eq!(report.models, 1);
        assert_eq!(report.tiles[0].model_references, 1);
        assert!(report.findings.iter().all(|f| !f.to_string().contains("orphan")));
    }

    #[test]
    fn test_gs_sample_limit_stops_after_batch() {
        let mut fx = Fixture::new();
        for i in 0..14 {
            let name = format!("N34W118_D100_S001_T001_L06_U0_R{}", i);
            let modl = format!("m{}", i);
            fx.add_tile(&name, &[("f", modl.as_str())]);
        }
        let config = AuditConfig {
            gs_sample_limit: Some(10),
            ..AuditConfig::default()
        };

        let report = fx
            .reporter(config.clone(), &FakeScenes::default())
            .run(DatasetFamily::Gs, None, &CollectingSink::new())
            .unwrap();
        assert_eq!(report.models, 11);
        assert_eq!(report.tiles.len(), 11);
        assert!(report.truncated);

        let batched = AuditConfig {
            batch_size: 4,
            ..config
        };
        let report = fx
            .reporter(batched, &FakeScenes::default())
            .run(DatasetFamily::Gs, None, &CollectingSink::new())
            .unwrap();
        assert_eq!(report.models, 12);
    }

    #[test]
    fn test_gt_ignores_gs_sample_limit() {
        let mut fx = Fixture::new();
        for i in 0..14 {
            let name = format!("N34W118_D101_S001_T001_L06_U0_R{}", i);
            let modl = format!("m{}", i);
            fx.add_tile(&name, &[("f", modl.as_str())]);
        }
        let config = AuditConfig {
            gs_sample_limit: Some(10),
            ..AuditConfig::default()
        };

        let report = fx
            .reporter(config, &FakeScenes::default())
            .run(DatasetFamily::Gt, None, &CollectingSink::new())
            .unwrap();
        assert_eq!(report.models, 14);
        assert_eq!(report.tiles.len(), 14);
        assert!(!report.truncated);
    }

    #[test]
    fn test_gt_end_to_end() {
        let mut fx = Fixture::new();
        let tile = fx.add_tile("N34W118_D101_S001_T001_L06_U0_R1", &[("tree", "oak")]);

        let model_dir = fx
            .root()
            .join("GTModel/500_GTModelGeometry")
            .join(fx.dictionary.subdirectory("AL015"));
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(
            model_dir.join("D500_S001_T001_AL015_001_oak.flt"),
            flight_bytes(&["textures\\bark.rgb", "leaves.rgb"]),
        )
        .unwrap();
        std::fs::write(model_dir.join("bark.rgb"), b"rgb").unwrap();

        let sink = CollectingSink::new();
        let report = fx
            .reporter(AuditConfig::default(), &OpenFlightSource)
            .run(DatasetFamily::Gt, None, &sink)
            .unwrap();

        assert_eq!(report.models, 1);
        assert_eq!(report.textures, 2);
        assert_eq!(
            report.findings,
            vec![Finding::MissingTexture(AssetRef::file(model_dir.join("leaves.rgb")))]
        );
        assert_eq!(sink.tiles(), vec![(tile, 1)]);
    }

    #[test]
    fn test_row_without_modl_is_a_missing_model() {
        let mut fx = Fixture::new();
        let tile = TileAddress::from_file_name("N34W118_D100_S001_T001_L06_U0_R1").unwrap();
        let shp = tile.tile_file(fx.root(), "shp");
        std::fs::create_dir_all(shp.parent().unwrap()).unwrap();
        std::fs::write(&shp, b"").unwrap();
        fx.features.add(shp, &["house"]);
        let dbf = tile.attribute_layer().tile_file(fx.root(), "dbf");
        fx.attributes.add_records(
            dbf,
            vec![[("CNAM", "house"), ("FACC", "AL015"), ("FSC", "1")]
                .into_iter()
                .collect()],
        );

        let report = fx
            .reporter(AuditConfig::default(), &OpenFlightSource)
            .run(DatasetFamily::Gs, None, &CollectingSink::new())
            .unwrap();

        assert_eq!(report.tiles.len(), 1);
        assert_eq!(
            report.findings,
            vec![Finding::MissingModel(model_entry(fx.root(), &tile, ""))]
        );
    }

    #[test]
    fn test_sample_limit_disabled_by_default() {
        let mut fx = Fixture::new();
        for i in 0..14 {
            let name = format!("N34W118_D100_S001_T001_L06_U0_R{}", i);
            let modl = format!("m{}", i);
            fx.add_tile(&name, &[("f", modl.as_str())]);
        }
        let report = fx
            .reporter(AuditConfig::default(), &FakeScenes::default())
            .run(DatasetFamily::Gs, None, &CollectingSink::new())
            .unwrap();
        assert_eq!(report.models, 14);
        assert_eq!(report.missing_models().count(), 14);
    }

    #[test]
    fn test_runs_are_idempotent() {
        let mut fx = Fixture::new();
        for i in 0..6 {
            let name = format!("N34W118_D100_S001_T001_L06_U{}_R0", i);
            fx.add_tile(&name, &[("a", "shared"), ("b", "own")]);
        }
        let config = AuditConfig {
            batch_size: 3,
            workers: Some(4),
            ..AuditConfig::default()
        };

        let first = fx
            .reporter(config.clone(), &OpenFlightSource)
            .run(DatasetFamily::Gs, None, &CollectingSink::new())
            .unwrap();
        let second = fx
            .reporter(config, &OpenFlightSource)
            .run(DatasetFamily::Gs, None, &CollectingSink::new())
            .unwrap();
        assert_eq!(first.findings, second.findings);
        assert_eq!(first.findings.len(), 12);

        let mut sorted = first.findings.clone();
        sorted.sort_by_key(|f| f.reference().clone());
        assert_eq!(sorted, first.findings);
    }

    #[test]
    fn test_max_findings_truncates() {
        let mut fx = Fixture::new();
        for i in 0..5 {
            let name = format!("N34W118_D100_S001_T001_L06_U0_R{}", i);
            let modl = format!("m{}", i);
            fx.add_tile(&name, &[("f", modl.as_str())]);
        }
        let config = AuditConfig {
            max_findings: Some(2),
            ..AuditConfig::default()
        };

        let sink = CollectingSink::new();
        let report = fx
            .reporter(config, &FakeScenes::default())
            .run(DatasetFamily::Gs, None, &sink)
            .unwrap();
        assert_eq!(report.findings.len(), 2);
        assert_eq!(sink.findings().len(), 2);
        assert!(report.truncated);
    }

    #[test]
    fn test_bad_tile_name_fails_the_run() {
        let fx = Fixture::new();
        let dir = fx.root().join("Tiles/N34/W118/100_GSFeature/L06/U0");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("not_a_tile.shp"), b"").unwrap();

        let result = fx
            .reporter(AuditConfig::default(), &FakeScenes::default())
            .run(DatasetFamily::Gs, None, &CollectingSink::new());
        assert!(matches!(result, Err(CdbError::AddressDecode { .. })));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let fx = Fixture::new();
        let config = AuditConfig {
            batch_size: 0,
            ..AuditConfig::default()
        };
        let result = fx
            .reporter(config, &FakeScenes::default())
            .run(DatasetFamily::Gs, None, &CollectingSink::new());
        assert!(matches!(result, Err(CdbError::Config(_))));

        let config = AuditConfig {
            max_findings: Some(0),
            ..AuditConfig::default()
        };
        let sink = CollectingSink::new();
        let result = fx
            .reporter(config, &FakeScenes::default())
            .run(DatasetFamily::Gs, None, &sink);
        assert!(matches!(result, Err(CdbError::Config(_))));
        assert!(sink.findings().is_empty());
    }
}
