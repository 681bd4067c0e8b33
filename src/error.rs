//! Error taxonomy for boundary loading and region matching.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Crs;

pub type Result<T> = std::result::Result<T, GeoError>;

#[derive(Debug, Error)]
pub enum GeoError {
    /// Boundary or catalog source could not be read
    #[error("failed to read data source {path}: {source}")]
    DataSource {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Expected columns are absent from the source
    #[error("schema error: {0}")]
    Schema(String),

    /// A single record's coordinates are missing or malformed.
    ///
    /// Always recovered locally by skipping the record.
    #[error("could not extract coordinates: {0}")]
    CoordinateExtraction(String),

    #[error("no transform available from {from} to {to}")]
    UnsupportedProjection { from: Crs, to: Crs },
}

impl GeoError {
    pub(crate) fn data_source(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        GeoError::DataSource {
            path: path.into(),
            source,
        }
    }
}
