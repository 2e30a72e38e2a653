use std::path::Path;
use std::rc::Rc;

use geo::Geometry;
use geojson::JsonObject;
use serde_json::Value as JsonValue;

use crate::crs::Crs;
use crate::error::{PipelineError, Result};

/// Name of the implicit geometry column.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// One feature: its attributes keyed by column name plus an optional shape.
/// A column missing from `attributes` was absent in the source file;
/// a JSON `null` means the column was present without a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub attributes: JsonObject,
    pub geometry: Option<Geometry<f64>>,
    pub source: Option<Rc<Path>>,
}

impl Record {
    pub fn new(attributes: JsonObject, geometry: Option<Geometry<f64>>) -> Self {
        Record {
            attributes,
            geometry,
            source: None,
        }
    }
}

/// An in-memory feature table: ordered attribute columns, one record per
/// feature and a table-level CRS shared by every geometry.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub crs: Option<Crs>,
    columns: Vec<String>,
    records: Vec<Record>,
}

impl FeatureTable {
    pub fn new(crs: Option<Crs>) -> Self {
        FeatureTable {
            crs,
            columns: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Appends a record, registering any attribute it carries that the table
    /// has not seen yet. New columns keep their first-seen order.
    pub fn push(&mut self, record: Record) {
        for key in record.attributes.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.records.push(record);
    }

    /// Removes each named column that exists. Returns the names actually removed.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let dropped: Vec<String> = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| self.has_column(n))
            .map(str::to_string)
            .collect();

        if dropped.is_empty() {
            return dropped;
        }

        self.columns.retain(|c| !dropped.contains(c));
        for record in &mut self.records {
            record.attributes.retain(|k, _| !dropped.contains(k));
        }
        dropped
    }

    /// Gives every record a `value` entry for each table column it lacks.
    pub fn fill_missing(&mut self, value: JsonValue) {
        for record in &mut self.records {
            for column in &self.columns {
                if !record.attributes.contains_key(column) {
                    record.attributes.insert(column.clone(), value.clone());
                }
            }
        }
    }

    /// Sets a column from one value per record, replacing it in place if it
    /// already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<JsonValue>) -> Result<()> {
        if values.len() != self.records.len() {
            return Err(PipelineError::Schema(format!(
                "column `{}` has {} values for {} rows",
                name,
                values.len(),
                self.records.len()
            )));
        }
        if name == GEOMETRY_COLUMN {
            return Err(PipelineError::Schema(format!(
                "`{}` is reserved for the geometry column",
                GEOMETRY_COLUMN
            )));
        }
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
        for (record, value) in self.records.iter_mut().zip(values) {
            record.attributes.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Values of one column, row by row. `None` where a record lacks the column.
    pub fn column(&self, name: &str) -> impl Iterator<Item = Option<&JsonValue>> + '_ {
        let name = name.to_string();
        self.records.iter().map(move |r| r.attributes.get(&name))
    }

    /// Builds a new table holding exactly `names`, in that order. `geometry`
    /// keeps the geometry column; leaving it out strips every shape.
    /// Fails if a column is unknown, or if any record lacks it.
    pub fn select(&self, names: &[&str]) -> Result<FeatureTable> {
        let keep_geometry = names.contains(&GEOMETRY_COLUMN);
        let attributes: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| *n != GEOMETRY_COLUMN)
            .collect();

        for name in &attributes {
            if !self.has_column(name) {
                return Err(PipelineError::MissingColumn {
                    column: name.to_string(),
                    source_file: None,
                });
            }
        }

        let mut selected = FeatureTable::new(self.crs.clone());
        selected.columns = attributes.iter().map(|n| n.to_string()).collect();
        selected.records.reserve(self.records.len());

        for record in &self.records {
            let mut kept = JsonObject::new();
            for name in &attributes {
                let value = record.attributes.get(*name).ok_or_else(|| {
                    PipelineError::MissingColumn {
                        column: name.to_string(),
                        source_file: record.source.as_ref().map(|p| p.to_path_buf()),
                    }
                })?;
                kept.insert(name.to_string(), value.clone());
            }
            selected.records.push(Record {
                attributes: kept,
                geometry: if keep_geometry { record.geometry.clone() } else { None },
                source: record.source.clone(),
            });
        }

        Ok(selected)
    }
}
