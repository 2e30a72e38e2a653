use std::path::PathBuf;

use log::info;

pub mod area;
pub mod config;
pub mod crs;
pub mod error;
pub mod loader;
pub mod merger;
pub mod table;
pub mod writer;

pub use config::Config;
pub use crs::Crs;
pub use error::{PipelineError, Result};
pub use table::{FeatureTable, Record};

/// Columns kept in both outputs, in output order.
pub const OUTPUT_COLUMNS: [&str; 4] = [
    "id",
    area::AREA_M2_COLUMN,
    area::AREA_HA_COLUMN,
    table::GEOMETRY_COLUMN,
];

/// Rows of the area columns printed after the calculation.
const HEAD_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub files: usize,
    pub rows: usize,
    pub output_csv_path: PathBuf,
    pub output_geojson_path: PathBuf,
}

/// Loads, merges and measures every input file, then writes both outputs.
/// Nothing is written unless every row has the output columns.
pub fn run(config: &Config) -> Result<RunSummary> {
    info!("=== Starting merge of {} ===", config.input_dir.display());

    let mut file_count = 0;
    let tables = loader::load_dir(&config.input_dir, &config.drop_columns)?
        .inspect(|_| file_count += 1);

    let merged = merger::merge(tables, config.source_crs.clone()).map_err(|e| match e {
        PipelineError::EmptyInput { dir: None } => PipelineError::EmptyInput {
            dir: Some(config.input_dir.clone()),
        },
        other => other,
    })?;

    let mut projected = area::reproject(&merged, &config.target_crs)?;
    area::add_area_columns(&mut projected)?;
    area::print_area_head(&projected, HEAD_ROWS)?;

    let output = projected.select(&OUTPUT_COLUMNS)?;
    writer::write_csv(&output, &config.output_csv_path)?;
    writer::write_geojson(&output, &config.output_geojson_path)?;

    info!("=== Processing Complete ===");
    Ok(RunSummary {
        files: file_count,
        rows: output.len(),
        output_csv_path: config.output_csv_path.clone(),
        output_geojson_path: config.output_geojson_path.clone(),
    })
}
