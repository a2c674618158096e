//! Vector feature reader over ESRI shapefiles.

use std::path::Path;

use shapefile::dbase::Record;
use shapefile::Shape;
use tracing::{debug, warn};

use super::attributes::{field_text, AttributeRecord};
use crate::error::Result;
use crate::tiles::GeoBounds;

/// A vector feature: its projected attributes and its envelope, if it has geometry.
#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub attributes: AttributeRecord,
    pub envelope: Option<GeoBounds>,
}

impl Feature {
    pub fn attribute(&self, field: &str) -> Option<&str> {
        self.attributes.get(field)
    }
}

/// Source of vector features.
pub trait FeatureSource: Send + Sync {
    /// Features of the layer at `path`, projected onto `fields`.
    ///
    /// With a `filter`, only features whose envelope intersects it are returned
    /// (features without geometry are kept). A missing or unreadable layer yields nothing.
    fn features(&self, path: &Path, fields: &[&str], filter: Option<&GeoBounds>) -> Vec<Feature>;
}

/// Reads `.shp` geometry with attributes from the sibling `.dbf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapefileSource;

impl FeatureSource for ShapefileSource {
    fn features(&self, path: &Path, fields: &[&str], filter: Option<&GeoBounds>) -> Vec<Feature> {
        if !path.is_file() {
            debug!("No vector layer at {}", path.display());
            return Vec::new();
        }
        match read_shapefile(path, fields, filter) {
            Ok(features) => features,
            Err(e) => {
                warn!("bad shapefile: {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

fn read_shapefile(path: &Path, fields: &[&str], filter: Option<&GeoBounds>) -> Result<Vec<Feature>> {
    let mut reader = shapefile::Reader::from_path(path)?;
    let mut features = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        let envelope = shape_envelope(&shape);
        if let (Some(region), Some(env)) = (filter, envelope.as_ref()) {
            if !env.intersects(region) {
                continue;
            }
        }
        features.push(Feature {
            attributes: project(&record, fields),
            envelope,
        });
    }

    Ok(features)
}

fn project(record: &Record, fields: &[&str]) -> AttributeRecord {
    fields
        .iter()
        .filter_map(|&field| record.get(field).and_then(field_text).map(|text| (field, text)))
        .collect()
}

fn point_envelope(x: f64, y: f64) -> GeoBounds {
    GeoBounds::new(y, x, y, x)
}

fn box_envelope(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> GeoBounds {
    GeoBounds::new(min_y, min_x, max_y, max_x)
}

fn shape_envelope(shape: &Shape) -> Option<GeoBounds> {
    match shape {
        Shape::NullShape => None,
        Shape::Point(p) => Some(point_envelope(p.x, p.y)),
        Shape::PointM(p) => Some(point_envelope(p.x, p.y)),
        Shape::PointZ(p) => Some(point_envelope(p.x, p.y)),
        Shape::Polyline(s) => {
            let b = s.bbox();
            Some(box_envelope(b.min.x, b.min.y, b.max.x, b.max.y))
        }
        Shape::PolylineZ(s) => {
            let b = s.bbox();
            Some(box_envelope(b.min.x, b.min.y, b.max.x, b.max.y))
        }
        Shape::Polygon(s) => {
            let b = s.bbox();
            Some(box_envelope(b.min.x, b.min.y, b.max.x, b.max.y))
        }
        Shape::PolygonZ(s) => {
            let b = s.bbox();
            Some(box_envelope(b.min.x, b.min.y, b.max.x, b.max.y))
        }
        Shape::Multipoint(s) => {
            let b = s.bbox();
            Some(box_envelope(b.min.x, b.min.y, b.max.x, b.max.y))
        }
        Shape::MultipointZ(s) => {
            let b = s.bbox();
            Some(box_envelope(b.min.x, b.min.y, b.max.x, b.max.y))
        }
        // M-only and multipatch layers do not occur in CDB feature tiles; keep them unfiltered
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_layer_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("N34W118_D100_S001_T001_L00_U0_R0.shp");
        assert!(ShapefileSource.features(&path, &["CNAM"], None).is_empty());
    }

    #[test]
    fn test_corrupt_layer_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.shp");
        std::fs::write(&path, b"garbage").unwrap();
        assert!(ShapefileSource.features(&path, &["CNAM"], None).is_empty());
    }

    fn write_points(path: &Path, points: &[(f64, f64, &str)]) {
        use shapefile::dbase::{FieldName, FieldValue, TableWriterBuilder};

        let table = TableWriterBuilder::new()
            .add_character_field(FieldName::try_from("CNAM").unwrap(), 32)
            .add_character_field(FieldName::try_from("NOTE").unwrap(), 16);
        let mut writer = shapefile::Writer::from_path(path, table).unwrap();
        for (x, y, cnam) in points {
            let mut record = Record::default();
            record.insert("CNAM".to_string(), FieldValue::Character(Some(cnam.to_string())));
            record.insert("NOTE".to_string(), FieldValue::Character(Some("survey".to_string())));
            writer
                .write_shape_and_record(&shapefile::Point::new(*x, *y), &record)
                .unwrap();
        }
    }

    fn cnams(features: &[Feature]) -> Vec<&str> {
        features.iter().filter_map(|f| f.attribute("CNAM")).collect()
    }

    #[test]
    fn test_reads_projected_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("N34W118_D100_S001_T001_L06_U0_R1.shp");
        write_points(&path, &[(-117.5, 34.5, "house"), (-100.0, 40.0, "far")]);

        let features = ShapefileSource.features(&path, &["CNAM"], None);
        assert_eq!(cnams(&features), vec!["house", "far"]);
        assert_eq!(features[0].attributes.len(), 1);
        assert!(!features[0].attributes.contains("NOTE"));

        let env = features[0].envelope.as_ref().unwrap();
        assert_eq!(env.west, -117.5);
        assert_eq!(env.south, 34.5);
    }

    #[test]
    fn test_filter_keeps_touching_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("N34W118_D100_S001_T001_L06_U0_R1.shp");
        write_points(
            &path,
            &[(-117.5, 34.5, "house"), (-100.0, 40.0, "far"), (-117.0, 35.0, "corner")],
        );

        let region = GeoBounds::new(34.0, -118.0, 35.0, -117.0);
        let features = ShapefileSource.features(&path, &["CNAM"], Some(&region));
        assert_eq!(cnams(&features), vec!["house", "corner"]);
    }

    #[test]
    fn test_point_envelope() {
        let shape = Shape::Point(shapefile::Point::new(-117.5, 34.25));
        let env = shape_envelope(&shape).unwrap();
        assert_eq!(env.west, -117.5);
        assert_eq!(env.east, -117.5);
        assert_eq!(env.south, 34.25);
        assert!(env.intersects(&GeoBounds::new(34.0, -118.0, 35.0, -117.0)));
        assert!(shape_envelope(&Shape::NullShape).is_none());
    }
}
