use std::path::Path;

pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod grid;
pub mod transformer;
pub mod walker;

pub use batch::{transform_coordinates, CoordinateBatch, TransformedRow};
pub use config::GridFiles;
pub use error::{Result, TransformError};
pub use grid::{GridCode, GridDefinition};
pub use transformer::{create_transformer, CoordinateTransform, GridTransformer};
pub use walker::{transform_geometries, transform_geometry};

pub enum InputFormat {
    GeoJSON,
}

pub fn process_file(
    input: &Path,
    output: &Path,
    format: InputFormat,
    source: GridCode,
    dest: GridCode,
    grid_files: &GridFiles,
) -> Result<usize> {
    match format {
        InputFormat::GeoJSON => features::transform_file(input, output, source, dest, grid_files),
    }
}

pub fn process_coordinates(
    text: &str,
    source: GridCode,
    dest: GridCode,
    grid_files: &GridFiles,
) -> Result<Vec<TransformedRow>> {
    let batch = CoordinateBatch::parse(text);
    batch::transform_coordinates(&batch, source, dest, grid_files)
}
