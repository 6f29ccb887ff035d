use geo::{Coord, Geometry, HasDimensions, LineString, MultiLineString, Point, Polygon};

use crate::error::{Result, TransformError};
use crate::transformer::CoordinateTransform;

/// Rebuilds `geometry` with every vertex passed through `transform`.
///
/// Empty geometries of any kind come back unchanged. Point, LineString,
/// Polygon and MultiLineString keep their part and ring structure; every
/// other kind is rejected with [`TransformError::UnsupportedGeometryType`].
pub fn transform_geometry<T>(geometry: &Geometry<f64>, transform: &T) -> Result<Geometry<f64>>
where
    T: CoordinateTransform + ?Sized,
{
    if geometry.is_empty() {
        return Ok(geometry.clone());
    }

    match geometry {
        Geometry::Point(point) => transform_point(point, transform).map(Geometry::Point),
        Geometry::LineString(line) => {
            transform_linestring(line, transform).map(Geometry::LineString)
        }
        Geometry::Polygon(polygon) => transform_polygon(polygon, transform).map(Geometry::Polygon),
        Geometry::MultiLineString(lines) => {
            let parts = lines
                .iter()
                .map(|line| transform_linestring(line, transform))
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiLineString(MultiLineString::new(parts)))
        }
        Geometry::Line(_) => Err(unsupported("Line")),
        Geometry::MultiPoint(_) => Err(unsupported("MultiPoint")),
        Geometry::MultiPolygon(_) => Err(unsupported("MultiPolygon")),
        Geometry::GeometryCollection(_) => Err(unsupported("GeometryCollection")),
        Geometry::Rect(_) => Err(unsupported("Rect")),
        Geometry::Triangle(_) => Err(unsupported("Triangle")),
    }
}

/// Applies [`transform_geometry`] to each geometry, stopping at the first failure.
pub fn transform_geometries<T>(
    geometries: &[Geometry<f64>],
    transform: &T,
) -> Result<Vec<Geometry<f64>>>
where
    T: CoordinateTransform + ?Sized,
{
    geometries
        .iter()
        .map(|geometry| transform_geometry(geometry, transform))
        .collect()
}

fn unsupported(kind: &str) -> TransformError {
    TransformError::UnsupportedGeometryType(kind.to_string())
}

fn transform_coord<T>(coord: &Coord<f64>, transform: &T) -> Result<Coord<f64>>
where
    T: CoordinateTransform + ?Sized,
{
    let (x, y) = transform.transform(coord.x, coord.y)?;
    Ok(Coord { x, y })
}

fn transform_point<T>(point: &Point<f64>, transform: &T) -> Result<Point<f64>>
where
    T: CoordinateTransform + ?Sized,
{
    transform_coord(&point.0, transform).map(Point::from)
}

fn transform_linestring<T>(line: &LineString<f64>, transform: &T) -> Result<LineString<f64>>
where
    T: CoordinateTransform + ?Sized,
{
    line.coords()
        .map(|coord| transform_coord(coord, transform))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn transform_polygon<T>(polygon: &Polygon<f64>, transform: &T) -> Result<Polygon<f64>>
where
    T: CoordinateTransform + ?Sized,
{
    let exterior = transform_linestring(polygon.exterior(), transform)?;
    let interiors = polygon
        .interiors()
        .iter()
        .map(|ring| transform_linestring(ring, transform))
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}
