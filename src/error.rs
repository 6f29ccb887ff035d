use std::path::PathBuf;
use thiserror::Error;

use crate::grid::GridCode;

pub type Result<T> = std::result::Result<T, TransformError>;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Unsupported grid code: {0} (expected 27700 or 9300)")]
    UnsupportedGridCode(String),
    #[error("Datum grid file for {grid} not found at {}", .path.display())]
    GridFileMissing { grid: GridCode, path: PathBuf },
    #[error(
        "Datum grid file for {grid} at {} contains whitespace, which PROJ cannot read",
        .path.display()
    )]
    UnusableGridPath { grid: GridCode, path: PathBuf },
    #[error("Could not build transformer from {source_grid} to {dest_grid}: {reason}")]
    TransformerConstructionFailed {
        source_grid: GridCode,
        dest_grid: GridCode,
        reason: String,
    },
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometryType(String),
    #[error("Malformed coordinate row {row}: {content:?}")]
    MalformedCoordinateRow { row: usize, content: String },
    #[error("Failed to transform ({x}, {y}): {reason}")]
    PointTransformFailed { x: f64, y: f64, reason: String },
    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TransformError {
    /// True for faults that need a deployment fix rather than different input.
    pub fn is_deployment_fault(&self) -> bool {
        matches!(
            self,
            TransformError::GridFileMissing { .. }
                | TransformError::UnusableGridPath { .. }
                | TransformError::TransformerConstructionFailed { .. }
        )
    }
}
