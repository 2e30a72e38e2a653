use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry as GeoJsonGeometry, JsonObject};
use log::info;
use serde_json::Value as JsonValue;

use crate::error::{PipelineError, Result};
use crate::table::FeatureTable;

/// Writes the attribute columns of `table` as CSV: a header row, then one
/// row per feature. Geometry and the row index are not written.
pub fn write_csv(table: &FeatureTable, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    writer.write_record(table.columns())?;
    for record in table.records() {
        writer.write_record(
            table
                .columns()
                .iter()
                .map(|column| csv_field(record.attributes.get(column))),
        )?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;

    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

fn csv_field(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Writes `table` as a GeoJSON FeatureCollection, geometry kept in the table
/// CRS. A non-WGS 84 table gets a legacy `crs` member so readers know the
/// coordinates are projected.
pub fn write_geojson(table: &FeatureTable, path: &Path) -> Result<()> {
    let features: Vec<Feature> = table
        .records()
        .iter()
        .map(|record| {
            let mut properties = JsonObject::new();
            for column in table.columns() {
                let value = record
                    .attributes
                    .get(column)
                    .cloned()
                    .unwrap_or(JsonValue::Null);
                properties.insert(column.clone(), value);
            }

            Feature {
                bbox: None,
                geometry: record
                    .geometry
                    .as_ref()
                    .map(|g| GeoJsonGeometry::new(geojson::Value::from(g))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let mut foreign_members = JsonObject::new();
    if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
        foreign_members.insert("name".to_string(), JsonValue::String(name.to_string()));
    }
    if let Some(crs_members) = table.crs.as_ref().and_then(|crs| crs.foreign_members()) {
        foreign_members.extend(crs_members);
    }

    let feature_collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    };

    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &feature_collection)?;
    writer.flush().map_err(|e| PipelineError::io(path, e))?;

    info!("Wrote {} features to {}", table.len(), path.display());
    Ok(())
}
