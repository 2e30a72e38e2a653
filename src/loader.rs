use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use geo::Geometry;
use geojson::{feature::Id, Feature, GeoJson, JsonObject};
use glob::Pattern;
use log::{debug, info};
use serde_json::Value as JsonValue;

use crate::crs::Crs;
use crate::error::{PipelineError, Result};
use crate::table::{FeatureTable, Record, GEOMETRY_COLUMN};

/// File name pattern picked up in the input directory.
pub const INPUT_PATTERN: &str = "*.geojson";

/// Lists the GeoJSON files directly under `dir`, sorted by path so that the
/// merged row order does not depend on directory listing order.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(INPUT_PATTERN)?;
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| pattern.matches(n));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    info!("Found {} GeoJSON files in {}", files.len(), dir.display());
    Ok(files)
}

/// Lazily loads every input file under `dir`, one table per file.
pub fn load_dir(
    dir: &Path,
    drop_columns: &[String],
) -> Result<impl Iterator<Item = Result<FeatureTable>>> {
    let files = list_input_files(dir)?;
    let drop_columns = drop_columns.to_vec();
    Ok(files
        .into_iter()
        .map(move |path| load_table(&path, &drop_columns)))
}

/// Function to load one GeoJSON file into a table, removing `drop_columns`
/// where present.
pub fn load_table(file_path: &Path, drop_columns: &[String]) -> Result<FeatureTable> {
    info!("Loading file: {}", file_path.display());
    let file = File::open(file_path).map_err(|e| PipelineError::io(file_path, e))?;
    let reader = BufReader::new(file);

    let geojson = GeoJson::from_reader(reader).map_err(|e| PipelineError::Parse {
        path: file_path.to_path_buf(),
        source: geojson::Error::MalformedJson(e),
    })?;

    let source: Rc<Path> = Rc::from(file_path);
    let (crs, features) = match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = match fc.foreign_members.as_ref().and_then(|m| m.get("crs")) {
                Some(member) => Some(Crs::from_geojson_member(member)?),
                None => None,
            };
            (crs, fc.features)
        }
        GeoJson::Feature(feature) => (None, vec![feature]),
        GeoJson::Geometry(geometry) => (
            None,
            vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
        ),
    };

    let mut table = FeatureTable::new(crs);
    for feature in features {
        let mut record = feature_to_record(feature, file_path)?;
        record.source = Some(Rc::clone(&source));
        table.push(record);
    }
    info!("Found {} features in file", table.len());

    // A property left out of one feature is null there, not absent from the file
    table.fill_missing(JsonValue::Null);

    let dropped = table.drop_columns(drop_columns);
    if !dropped.is_empty() {
        debug!("Dropped columns {:?} from {}", dropped, file_path.display());
    }

    Ok(table)
}

fn feature_to_record(feature: Feature, file_path: &Path) -> Result<Record> {
    let parse_error = |source: geojson::Error| PipelineError::Parse {
        path: file_path.to_path_buf(),
        source,
    };

    let geometry = feature
        .geometry
        .map(Geometry::<f64>::try_from)
        .transpose()
        .map_err(parse_error)?;

    let properties = feature.properties.unwrap_or_default();
    if properties.contains_key(GEOMETRY_COLUMN) {
        return Err(PipelineError::Schema(format!(
            "property `{}` in {} collides with the geometry column",
            GEOMETRY_COLUMN,
            file_path.display()
        )));
    }

    // A top-level feature id stands in for a missing `id` property
    let attributes = match feature.id {
        Some(id) if !properties.contains_key("id") => {
            let mut attributes = JsonObject::new();
            attributes.insert("id".to_string(), id_to_json(id));
            attributes.extend(properties);
            attributes
        }
        _ => properties,
    };

    Ok(Record::new(attributes, geometry))
}

fn id_to_json(id: Id) -> JsonValue {
    match id {
        Id::String(s) => JsonValue::String(s),
        Id::Number(n) => JsonValue::Number(n),
    }
}
