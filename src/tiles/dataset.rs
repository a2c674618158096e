//! CDB dataset codes and their directory names.

/// GSFeature: point features placing geotypical/geospecific models in tiles.
pub const GS_FEATURE: i32 = 100;
/// GTFeature: point features referencing the shared geotypical model library.
pub const GT_FEATURE: i32 = 101;
/// GSModelGeometry: per-tile archives of OpenFlight models.
pub const GS_MODEL_GEOMETRY: i32 = 300;
/// GSModelTexture: per-tile archives of model textures.
pub const GS_MODEL_TEXTURE: i32 = 301;
/// GTModelGeometry: the geotypical model library under `GTModel/`.
pub const GT_MODEL_GEOMETRY: i32 = 500;

const DATASETS: &[(i32, &str)] = &[
    (1, "Elevation"),
    (2, "MinMaxElevation"),
    (3, "MaxCulture"),
    (4, "Imagery"),
    (5, "RMTexture"),
    (6, "RMDescriptor"),
    (100, "GSFeature"),
    (101, "GTFeature"),
    (102, "GeoPolitical"),
    (200, "VectorMaterial"),
    (201, "RoadNetwork"),
    (202, "RailRoadNetwork"),
    (203, "PowerLineNetwork"),
    (204, "HydrographyNetwork"),
    (300, "GSModelGeometry"),
    (301, "GSModelTexture"),
    (302, "GSModelSignature"),
    (303, "GSModelDescriptor"),
    (304, "GSModelMaterial"),
    (305, "GSModelInteriorGeometry"),
    (306, "GSModelInteriorTexture"),
    (307, "GSModelInteriorDescriptor"),
    (308, "GSModelInteriorMaterial"),
    (309, "GSModelCMT"),
    (310, "T2DModelGeometry"),
    (311, "GSModelInteriorCMT"),
    (500, "GTModelGeometry"),
    (501, "GTModelTexture"),
    (502, "GTModelSignature"),
    (503, "GTModelDescriptor"),
    (504, "GTModelMaterial"),
    (505, "GTModelCMT"),
    (510, "GTModelInteriorGeometry"),
    (511, "GTModelInteriorTexture"),
    (600, "MModelGeometry"),
    (601, "MModelTexture"),
];

/// Human-readable dataset name, if the code is known.
pub fn dataset_name(code: i32) -> Option<&'static str> {
    DATASETS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Dataset code for a name, case-insensitive.
pub fn dataset_code(name: &str) -> Option<i32> {
    DATASETS
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(code, _)| *code)
}

/// Directory name of a dataset, e.g. `300_GSModelGeometry`.
///
/// Unknown codes render as the bare three digit code.
pub fn dataset_subdirectory(code: i32) -> String {
    match dataset_name(code) {
        Some(name) => format!("{:03}_{}", code, name),
        None => format!("{:03}", code),
    }
}
