//! Feature-class dictionary: maps FACC codes to the GTModel directory hierarchy.
//!
//! A FACC code such as `AL015` splits into category `A`, subcategory `L` and
//! feature type `015`; the model library stores it under
//! `A_Culture/L_Misc_Feature/015_Building`.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use hashbrown::HashMap;
use tracing::info;

/// Resolves the model-library subdirectory of a feature class.
pub trait FeatureClassDictionary: Send + Sync {
    fn subdirectory(&self, facc: &str) -> String;
}

const CATEGORIES: &[(&str, &str)] = &[
    ("A", "Culture"),
    ("B", "Hydrography"),
    ("C", "Hypsography"),
    ("D", "Physiography"),
    ("E", "Vegetation"),
    ("F", "Demarcation"),
    ("G", "Aeronautical_Information"),
    ("I", "Cadastral"),
    ("S", "Special_Use"),
    ("Z", "General"),
];

const SUBCATEGORIES: &[(&str, &str)] = &[
    ("AA", "Extraction"),
    ("AB", "Waste"),
    ("AC", "Processing"),
    ("AD", "Power_Generation"),
    ("AF", "Misc_Industry"),
    ("AH", "Commercial"),
    ("AJ", "Agricultural"),
    ("AK", "Recreational"),
    ("AL", "Misc_Feature"),
    ("AM", "Storage"),
    ("AN", "Railroad"),
    ("AP", "Road"),
    ("AQ", "Transportation"),
    ("AT", "Communication"),
    ("BB", "Ports_and_Harbors"),
    ("BH", "Inland_Water"),
    ("EA", "Cropland"),
    ("EC", "Woodland"),
    ("GB", "Aerodrome"),
];

const FEATURE_TYPES: &[(&str, &str)] = &[
    ("AD010", "Power_Plant"),
    ("AF010", "Smokestack"),
    ("AJ050", "Windmill"),
    ("AK160", "Stadium"),
    ("AL013", "Building"),
    ("AL015", "Building"),
    ("AL020", "Built_Up_Area"),
    ("AL130", "Memorial_Monument"),
    ("AL240", "Tower_NonCommunication"),
    ("AM070", "Storage_Tank"),
    ("AP030", "Road"),
    ("AQ040", "Bridge"),
    ("AQ063", "Road_Interchange"),
    ("AT010", "Dish_Aerial"),
    ("AT080", "Communication_Tower"),
    ("BB041", "Breakwater"),
    ("EC030", "Trees"),
    ("EC040", "Cleared_Way"),
    ("GB030", "Helipad"),
    ("GB040", "Launch_Pad"),
];

/// In-memory feature data dictionary, seeded with common CDB feature classes.
#[derive(Debug, Clone)]
pub struct FeatureDataDictionary {
    names: HashMap<String, String>,
}

impl Default for FeatureDataDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FeatureDataDictionary {
    /// Dictionary with no entries; every level falls back to its bare code.
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut dictionary = Self::empty();
        for (code, name) in CATEGORIES.iter().chain(SUBCATEGORIES).chain(FEATURE_TYPES) {
            dictionary.insert(code, name);
        }
        dictionary
    }

    /// Add or replace a name. The code length selects the level:
    /// 1 = category, 2 = subcategory, 5 = feature type.
    pub fn insert(&mut self, code: &str, name: &str) {
        self.names
            .insert(code.trim().to_uppercase(), name.trim().replace(' ', "_"));
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Merge `code,name` rows from a CSV file (header row required).
    pub fn load_csv(&mut self, path: &Path) -> Result<()> {
        info!("Loading feature dictionary from {}", path.display());

        let file = File::open(path).context("Failed to open feature dictionary")?;
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = csv_reader.headers()?.clone();
        let code_idx = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case("code"))
            .context("Column 'code' not found")?;
        let name_idx = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case("name"))
            .context("Column 'name' not found")?;

        let mut loaded = 0;
        for result in csv_reader.records() {
            let record = result?;
            if let (Some(code), Some(name)) = (record.get(code_idx), record.get(name_idx)) {
                if !code.is_empty() && !name.is_empty() {
                    self.insert(code, name);
                    loaded += 1;
                }
            }
        }

        info!("Loaded {} feature dictionary entries", loaded);
        Ok(())
    }

    fn level(&self, key: &str, code: &str) -> String {
        match self.names.get(key) {
            Some(name) => format!("{}_{}", code, name),
            None => code.to_string(),
        }
    }
}

impl FeatureClassDictionary for FeatureDataDictionary {
    fn subdirectory(&self, facc: &str) -> String {
        let facc = facc.trim().to_uppercase();
        if facc.len() != 5 || !facc.is_ascii() {
            return facc;
        }
        [
            self.level(&facc[..1], &facc[..1]),
            self.level(&facc[..2], &facc[1..2]),
            self.level(&facc, &facc[2..]),
        ]
        .join("/")
    }
}
