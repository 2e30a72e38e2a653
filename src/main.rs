use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use gis_area_merger::{run, Config, Crs, PipelineError};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("GIS Area Merger")
        .version("1.0")
        .author("Jesper Fjellin")
        .about("Merges a folder of GeoJSON files and computes feature areas in a projected CRS")
        .arg(
            Arg::new("input-dir")
                .short('d')
                .long("input-dir")
                .env("GEOJSON_DIR")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Directory containing the *.geojson files to merge"),
        )
        .arg(
            Arg::new("drop")
                .long("drop")
                .num_args(0..)
                .action(ArgAction::Set)
                .default_values(["start_date", "end_date"])
                .help("Columns to drop from each file when present"),
        )
        .arg(
            Arg::new("csv")
                .long("csv")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("geoJSONdata.csv")
                .help("Output path for the attribute CSV"),
        )
        .arg(
            Arg::new("geojson")
                .long("geojson")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("geoJSONdata-geom.geojson")
                .help("Output path for the GeoJSON with geometry"),
        )
        .arg(
            Arg::new("target-crs")
                .long("target-crs")
                .default_value("EPSG:27700")
                .help("Projected CRS used for area calculation and the GeoJSON output"),
        )
        .get_matches();

    let input_dir = matches
        .get_one::<PathBuf>("input-dir")
        .cloned()
        .unwrap();

    if !input_dir.is_dir() {
        eprintln!("Error: Directory not found: {}", input_dir.display());
        std::process::exit(1);
    }

    let target_crs = match matches
        .get_one::<String>("target-crs")
        .map(|s| s.parse::<Crs>())
    {
        Some(Ok(crs)) => crs,
        Some(Err(e)) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        None => Crs::british_national_grid(),
    };

    let mut config = Config::new(input_dir);
    config.drop_columns = matches
        .get_many::<String>("drop")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if let Some(csv) = matches.get_one::<PathBuf>("csv") {
        config.output_csv_path = csv.clone();
    }
    if let Some(geojson) = matches.get_one::<PathBuf>("geojson") {
        config.output_geojson_path = geojson.clone();
    }
    config.target_crs = target_crs;

    match run(&config) {
        Ok(summary) => {
            println!(
                "Merged {} rows from {} files into {} and {}",
                summary.rows,
                summary.files,
                summary.output_csv_path.display(),
                summary.output_geojson_path.display()
            );
            println!("Processing completed successfully");
        }
        Err(e) => {
            eprintln!("Error processing files: {}", e);
            match &e {
                PipelineError::Schema(msg) if msg.contains("CRS mismatch") => {
                    eprintln!("Please ensure all input files use the same coordinate reference system.");
                }
                PipelineError::MissingColumn { column, .. } => {
                    eprintln!("Every input file must provide a `{}` column.", column);
                }
                _ => {}
            }
            std::process::exit(1);
        }
    }
}
