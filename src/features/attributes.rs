//! Attribute join store.
//!
//! Loads dBASE attribute tables into string records and indexes them by a key field.

use std::path::Path;

use hashbrown::HashMap;
use shapefile::dbase::{self, FieldValue};
use tracing::{debug, warn};

use crate::error::Result;

/// One attribute row: field name to trimmed string value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeRecord {
    fields: HashMap<String, String>,
}

impl AttributeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl AsRef<str>) {
        self.fields
            .insert(field.into(), value.as_ref().trim().to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for AttributeRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = AttributeRecord::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

/// Attribute records keyed by the value of one designated field.
#[derive(Debug, Clone, Default)]
pub struct AttributeIndex {
    by_key: HashMap<String, AttributeRecord>,
}

impl AttributeIndex {
    /// Index `records` by `key_field`. Rows without the field are dropped;
    /// on duplicate keys the last row wins.
    pub fn build(records: Vec<AttributeRecord>, key_field: &str) -> Self {
        let mut by_key = HashMap::with_capacity(records.len());
        for record in records {
            if let Some(key) = record.get(key_field) {
                by_key.insert(key.to_string(), record);
            }
        }
        Self { by_key }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeRecord> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Source of tabular attribute rows.
pub trait AttributeSource: Send + Sync {
    /// All rows of the table at `path`. Missing or corrupt tables yield no rows.
    fn records(&self, path: &Path) -> Vec<AttributeRecord>;
}

/// Reads dBASE (`.dbf`) tables from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbfSource;

impl AttributeSource for DbfSource {
    fn records(&self, path: &Path) -> Vec<AttributeRecord> {
        if !path.is_file() {
            debug!("No attribute table at {}", path.display());
            return Vec::new();
        }
        match read_dbf(path) {
            Ok(records) => records,
            Err(e) => {
                warn!("bad dbf: {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

fn read_dbf(path: &Path) -> Result<Vec<AttributeRecord>> {
    let mut reader = dbase::Reader::from_path(path)?;
    let names: Vec<String> = reader
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();

    let rows = reader.read()?;
    Ok(rows
        .iter()
        .map(|row| {
            names
                .iter()
                .filter_map(|name| row.get(name).and_then(field_text).map(|text| (name.as_str(), text)))
                .collect()
        })
        .collect())
}

/// Render a dBASE value the way it reads in the table. Null and blank values have no text.
pub(crate) fn field_text(value: &FieldValue) -> Option<String> {
    let text = match value {
        FieldValue::Character(Some(s)) => Some(s.clone()),
        FieldValue::Memo(s) => Some(s.clone()),
        FieldValue::Numeric(Some(n)) => Some(n.to_string()),
        FieldValue::Float(Some(n)) => Some(n.to_string()),
        FieldValue::Double(n) => Some(n.to_string()),
        FieldValue::Integer(n) => Some(n.to_string()),
        FieldValue::Logical(Some(b)) => Some(if *b { "T" } else { "F" }.to_string()),
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None) => None,
        other => Some(format!("{:?}", other)),
    };
    text.filter(|t| !t.trim().is_empty())
}
