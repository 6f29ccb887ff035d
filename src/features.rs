use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use geo::Geometry;
use geojson::{
    Feature, FeatureCollection, GeoJson, Geometry as GeoJsonGeometry, Value as GeoJsonValue,
};
use log::info;
use serde_json::json;

use crate::config::GridFiles;
use crate::error::{Result, TransformError};
use crate::grid::GridCode;
use crate::transformer::{create_transformer, CoordinateTransform};
use crate::walker::transform_geometry;

// Load a GeoJSON file as a feature collection; a bare Feature or Geometry is wrapped.
pub fn load_features(file_path: &Path) -> Result<FeatureCollection> {
    info!("Loading file: {}", file_path.display());
    let file = File::open(file_path)?;
    let reader = BufReader::new(file);

    let collection = match GeoJson::from_reader(reader)? {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(feature) => FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        },
        GeoJson::Geometry(geometry) => FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            foreign_members: None,
        },
    };
    info!("Found {} features in file", collection.features.len());
    Ok(collection)
}

fn check_position(kind: &str, coord: &[f64]) -> Result<()> {
    match coord.len() {
        2 => Ok(()),
        n if n > 2 => Err(TransformError::UnsupportedGeometryType(format!("{} Z", kind))),
        n => Err(TransformError::InvalidGeoJson(format!(
            "{} position has {} ordinates",
            kind, n
        ))),
    }
}

fn check_positions<'a>(kind: &str, coords: impl IntoIterator<Item = &'a Vec<f64>>) -> Result<()> {
    coords
        .into_iter()
        .try_for_each(|coord| check_position(kind, coord))
}

// geo is 2D only, so anything carrying a third ordinate is refused up front
// instead of having its z silently dropped by the conversion.
fn check_2d(value: &GeoJsonValue) -> Result<()> {
    match value {
        GeoJsonValue::Point(coord) => check_position("Point", coord),
        GeoJsonValue::MultiPoint(coords) => check_positions("MultiPoint", coords),
        GeoJsonValue::LineString(coords) => check_positions("LineString", coords),
        GeoJsonValue::MultiLineString(lines) => {
            check_positions("MultiLineString", lines.iter().flatten())
        }
        GeoJsonValue::Polygon(rings) => check_positions("Polygon", rings.iter().flatten()),
        GeoJsonValue::MultiPolygon(polygons) => {
            check_positions("MultiPolygon", polygons.iter().flatten().flatten())
        }
        GeoJsonValue::GeometryCollection(members) => {
            members.iter().try_for_each(|member| check_2d(&member.value))
        }
    }
}

/// Converts a GeoJSON geometry of any kind into a 2D `geo` geometry.
pub fn feature_geometry(geometry: &GeoJsonGeometry) -> Result<Geometry<f64>> {
    check_2d(&geometry.value)?;
    Ok(Geometry::try_from(geometry.value.clone())?)
}

/// Returns a new collection with every feature geometry transformed.
///
/// Properties, ids and foreign members are carried over; bounding boxes are
/// dropped since they no longer apply. The first failing feature aborts the
/// whole collection.
pub fn transform_feature_collection<T>(
    collection: &FeatureCollection,
    transform: &T,
) -> Result<FeatureCollection>
where
    T: CoordinateTransform + ?Sized,
{
    let total_features = collection.features.len();
    let mut features = Vec::with_capacity(total_features);

    for (feature_count, feature) in collection.features.iter().enumerate() {
        if (feature_count + 1) % 1000 == 0 {
            info!("Processing feature {}/{}", feature_count + 1, total_features);
        }
        let geometry = match &feature.geometry {
            Some(geometry) => {
                let transformed = transform_geometry(&feature_geometry(geometry)?, transform)?;
                let mut out = GeoJsonGeometry::new(GeoJsonValue::from(&transformed));
                out.foreign_members = geometry.foreign_members.clone();
                Some(out)
            }
            None => None,
        };
        features.push(Feature {
            bbox: None,
            geometry,
            id: feature.id.clone(),
            properties: feature.properties.clone(),
            foreign_members: feature.foreign_members.clone(),
        });
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: collection.foreign_members.clone(),
    })
}

/// Legacy GeoJSON `crs` member naming `grid`.
pub fn crs_member(grid: GridCode) -> serde_json::Value {
    json!({
        "type": "name",
        "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", grid.epsg()) }
    })
}

pub fn default_output_path(input: &Path) -> PathBuf {
    let file_stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    Path::new("output").join(format!("transformed_{}.geojson", file_stem))
}

/// Tags `collection` with the legacy `crs` member for `grid`.
pub fn set_crs(collection: &mut FeatureCollection, grid: GridCode) {
    collection
        .foreign_members
        .get_or_insert_with(serde_json::Map::new)
        .insert("crs".to_string(), crs_member(grid));
}

/// Writes `collection` as pretty-printed GeoJSON and flushes `writer`.
pub fn write_features<W: Write>(collection: &FeatureCollection, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, collection)?;
    writer.flush()?;
    Ok(())
}

/// Transforms every geometry in the GeoJSON file at `input` and writes the
/// result to `output`. Returns the number of features written.
pub fn transform_file(
    input: &Path,
    output: &Path,
    source: GridCode,
    dest: GridCode,
    grid_files: &GridFiles,
) -> Result<usize> {
    let transformer = create_transformer(source, dest, grid_files)?;
    let collection = load_features(input)?;

    let mut transformed = transform_feature_collection(&collection, &transformer)?;
    set_crs(&mut transformed, transformer.dest());

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    write_features(&transformed, BufWriter::new(File::create(output)?))?;

    info!(
        "Wrote {} features in {} (from {}) to {}",
        transformed.features.len(),
        transformer.dest(),
        transformer.source(),
        output.display()
    );
    Ok(transformed.features.len())
}
