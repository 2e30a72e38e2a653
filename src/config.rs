use std::path::PathBuf;

use crate::crs::Crs;

/// Columns removed from every input file when present.
pub const DEFAULT_DROP_COLUMNS: [&str; 2] = ["start_date", "end_date"];
pub const DEFAULT_OUTPUT_CSV: &str = "geoJSONdata.csv";
pub const DEFAULT_OUTPUT_GEOJSON: &str = "geoJSONdata-geom.geojson";

/// Everything a run needs to know, passed in at the entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_dir: PathBuf,
    pub drop_columns: Vec<String>,
    pub output_csv_path: PathBuf,
    pub output_geojson_path: PathBuf,
    /// CRS the merged table is stamped with.
    pub source_crs: Crs,
    /// Metric CRS used for area calculation and for the GeoJSON output.
    pub target_crs: Crs,
}

impl Config {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Config {
            input_dir: input_dir.into(),
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|c| c.to_string()).collect(),
            output_csv_path: PathBuf::from(DEFAULT_OUTPUT_CSV),
            output_geojson_path: PathBuf::from(DEFAULT_OUTPUT_GEOJSON),
            source_crs: Crs::wgs84(),
            target_crs: Crs::british_national_grid(),
        }
    }

    pub fn with_outputs(mut self, csv: impl Into<PathBuf>, geojson: impl Into<PathBuf>) -> Self {
        self.output_csv_path = csv.into();
        self.output_geojson_path = geojson.into();
        self
    }
}
