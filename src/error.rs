use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by any stage of the merge pipeline.
/// Each variant identifies the stage and the input that failed, so callers can
/// tell an unreadable directory apart from a bad file or a missing column.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },

    #[error("schema conflict: {0}")]
    Schema(String),

    #[error("no input tables to merge{}", .dir.as_ref().map(|d| format!(": no *.geojson files in {}", d.display())).unwrap_or_default())]
    EmptyInput { dir: Option<PathBuf> },

    #[error("column `{column}` is missing{}", .source_file.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    MissingColumn {
        column: String,
        source_file: Option<PathBuf>,
    },

    #[error("cannot build projection from {from} to {to}: {source}")]
    ProjectionSetup {
        from: String,
        to: String,
        #[source]
        source: proj::ProjCreateError,
    },

    #[error("failed to reproject row {row}: {source}")]
    Projection {
        row: usize,
        #[source]
        source: proj::ProjError,
    },

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Pattern(#[from] glob::PatternError),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
