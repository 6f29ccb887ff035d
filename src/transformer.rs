use log::{debug, info};
use proj::Proj;

use crate::config::GridFiles;
use crate::error::{Result, TransformError};
use crate::grid::GridCode;

/// A 2D coordinate mapping between two fixed grids.
///
/// The walker and the batch path only ever see this trait, so the PROJ-backed
/// [`GridTransformer`] can be swapped for any other engine (or a closure in tests).
pub trait CoordinateTransform {
    fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)>;
}

impl<F> CoordinateTransform for F
where
    F: Fn(f64, f64) -> Result<(f64, f64)>,
{
    fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        self(x, y)
    }
}

/// PROJ pipeline from one grid to another, easting/northing on both sides.
pub struct GridTransformer {
    proj: Proj,
    source: GridCode,
    dest: GridCode,
}

impl GridTransformer {
    pub fn source(&self) -> GridCode {
        self.source
    }

    pub fn dest(&self) -> GridCode {
        self.dest
    }
}

impl CoordinateTransform for GridTransformer {
    fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let (tx, ty) = self
            .proj
            .convert((x, y))
            .map_err(|e| TransformError::PointTransformFailed {
                x,
                y,
                reason: e.to_string(),
            })?;
        if !tx.is_finite() || !ty.is_finite() {
            return Err(TransformError::PointTransformFailed {
                x,
                y,
                reason: "result outside the grid coverage".to_string(),
            });
        }
        Ok((tx, ty))
    }
}

/// Builds the transformer for `source` -> `dest`.
///
/// Both NTv2 files must be present in `grid_files`. The same grid on both
/// sides is allowed and goes through the full inverse/forward pipeline.
pub fn create_transformer(
    source: GridCode,
    dest: GridCode,
    grid_files: &GridFiles,
) -> Result<GridTransformer> {
    let source_def = source.definition();
    let dest_def = dest.definition();

    let source_grid = grid_files.check(source_def)?;
    let dest_grid = grid_files.check(dest_def)?;

    let from = source_def.proj_string(&source_grid);
    let to = dest_def.proj_string(&dest_grid);
    debug!("Source CRS: {}", from);
    debug!("Destination CRS: {}", to);

    // new_known_crs normalises both ends to (x, y) axis order.
    let proj = Proj::new_known_crs(&from, &to, None).map_err(|e| {
        TransformError::TransformerConstructionFailed {
            source_grid: source,
            dest_grid: dest,
            reason: e.to_string(),
        }
    })?;

    info!(
        "Created transformer {} ({}) -> {} ({})",
        source, source_def.name, dest, dest_def.name
    );
    Ok(GridTransformer { proj, source, dest })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs::{self, File};
    use std::path::Path;

    fn label(buf: &mut Vec<u8>, name: &str) {
        buf.extend_from_slice(format!("{:<8}", name).as_bytes());
    }

    fn text_record(buf: &mut Vec<u8>, name: &str, value: &str) {
        label(buf, name);
        label(buf, value);
    }

    fn int_record(buf: &mut Vec<u8>, name: &str, value: i32) {
        label(buf, name);
        buf.extend_from_slice(&value.to_le_bytes());
        buf.extend_from_slice(&[0; 4]);
    }

    fn float_record(buf: &mut Vec<u8>, name: &str, value: f64) {
        label(buf, name);
        buf.extend_from_slice(&value.to_le_bytes());
    }

    /// NTv2 grid over 49..61N, 9W..2E at 1 degree spacing with every shift zero.
    fn write_zero_shift_grid(path: &Path) {
        let (rows, cols) = (13, 12);
        let mut buf = Vec::new();
        int_record(&mut buf, "NUM_OREC", 11);
        int_record(&mut buf, "NUM_SREC", 11);
        int_record(&mut buf, "NUM_FILE", 1);
        text_record(&mut buf, "GS_TYPE", "SECONDS");
        text_record(&mut buf, "VERSION", "NTv2.0");
        text_record(&mut buf, "SYSTEM_F", "OSGB36");
        text_record(&mut buf, "SYSTEM_T", "ETRS89");
        float_record(&mut buf, "MAJOR_F", 6377563.396);
        float_record(&mut buf, "MINOR_F", 6356256.909);
        float_record(&mut buf, "MAJOR_T", 6378137.0);
        float_record(&mut buf, "MINOR_T", 6356752.314);

        // longitudes are positive west, all values in arc seconds
        text_record(&mut buf, "SUB_NAME", "ZERO");
        text_record(&mut buf, "PARENT", "NONE");
        text_record(&mut buf, "CREATED", "");
        text_record(&mut buf, "UPDATED", "");
        float_record(&mut buf, "S_LAT", 49.0 * 3600.0);
        float_record(&mut buf, "N_LAT", 61.0 * 3600.0);
        float_record(&mut buf, "E_LONG", -2.0 * 3600.0);
        float_record(&mut buf, "W_LONG", 9.0 * 3600.0);
        float_record(&mut buf, "LAT_INC", 3600.0);
        float_record(&mut buf, "LONG_INC", 3600.0);
        int_record(&mut buf, "GS_COUNT", rows * cols);
        for _ in 0..rows * cols {
            for value in [0f32; 4] {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }
        text_record(&mut buf, "END", "");

        fs::write(path, buf).unwrap();
    }

    fn zero_shift_grid_files() -> (tempfile::TempDir, GridFiles) {
        let dir = tempfile::tempdir().unwrap();
        for grid in GridCode::ALL {
            write_zero_shift_grid(&dir.path().join(grid.definition().grid_file));
        }
        let files = GridFiles::new(dir.path());
        (dir, files)
    }

    #[test]
    fn missing_grid_file_is_reported_before_proj_is_touched() {
        let dir = tempfile::tempdir().unwrap();
        let result = create_transformer(
            GridCode::BritishNationalGrid,
            GridCode::Hs2SnakeGrid,
            &GridFiles::new(dir.path()),
        );
        match result {
            Err(TransformError::GridFileMissing { grid, .. }) => {
                assert_eq!(grid, GridCode::BritishNationalGrid)
            }
            Err(other) => panic!("expected GridFileMissing, got {other:?}"),
            Ok(_) => panic!("expected GridFileMissing, got a transformer"),
        }
    }

    #[test]
    fn destination_grid_file_is_checked_too() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("OSTN15_NTv2_OSGBtoETRS.gsb")).unwrap();
        let result = create_transformer(
            GridCode::BritishNationalGrid,
            GridCode::Hs2SnakeGrid,
            &GridFiles::new(dir.path()),
        );
        assert!(matches!(
            result,
            Err(TransformError::GridFileMissing {
                grid: GridCode::Hs2SnakeGrid,
                ..
            })
        ));
    }

    #[test]
    fn closures_are_transforms() {
        let shift = |x: f64, y: f64| -> Result<(f64, f64)> { Ok((x + 1.0, y - 1.0)) };
        assert_eq!(shift.transform(2.0, 2.0).unwrap(), (3.0, 1.0));
    }

    #[test]
    fn national_grid_to_itself_is_near_identity() {
        let (_dir, files) = zero_shift_grid_files();
        let transformer = create_transformer(
            GridCode::BritishNationalGrid,
            GridCode::BritishNationalGrid,
            &files,
        )
        .unwrap();
        assert_eq!(transformer.source(), GridCode::BritishNationalGrid);
        assert_eq!(transformer.dest(), GridCode::BritishNationalGrid);

        let (x, y) = transformer.transform(450000.0, 200000.0).unwrap();
        assert_relative_eq!(x, 450000.0, epsilon = 1e-3);
        assert_relative_eq!(y, 200000.0, epsilon = 1e-3);
    }

    #[test]
    fn output_is_easting_then_northing() {
        let (_dir, files) = zero_shift_grid_files();
        let transformer =
            create_transformer(GridCode::BritishNationalGrid, GridCode::Hs2SnakeGrid, &files)
                .unwrap();
        assert_eq!(transformer.dest(), GridCode::Hs2SnakeGrid);

        // roughly 1.28W 51.7N, east of and south of the snake grid origin
        let (x, y) = transformer.transform(450000.0, 200000.0).unwrap();
        assert!((200000.0..230000.0).contains(&x), "easting {x}");
        assert!((290000.0..330000.0).contains(&y), "northing {y}");
    }

    #[test]
    fn zero_shift_round_trip() {
        let (_dir, files) = zero_shift_grid_files();
        let forward =
            create_transformer(GridCode::BritishNationalGrid, GridCode::Hs2SnakeGrid, &files)
                .unwrap();
        let back =
            create_transformer(GridCode::Hs2SnakeGrid, GridCode::BritishNationalGrid, &files)
                .unwrap();

        let (sx, sy) = forward.transform(450000.0, 250000.0).unwrap();
        let (x, y) = back.transform(sx, sy).unwrap();
        assert_relative_eq!(x, 450000.0, epsilon = 1e-3);
        assert_relative_eq!(y, 250000.0, epsilon = 1e-3);
    }

    #[test]
    #[ignore = "needs the OSTN15 and HS2TN15 NTv2 files in SNAKE_GRID_GSB_DIR"]
    fn same_grid_is_near_identity() {
        let transformer = create_transformer(
            GridCode::BritishNationalGrid,
            GridCode::BritishNationalGrid,
            &GridFiles::from_env(),
        )
        .unwrap();
        let (x, y) = transformer.transform(450000.0, 200000.0).unwrap();
        assert_relative_eq!(x, 450000.0, epsilon = 1e-3);
        assert_relative_eq!(y, 200000.0, epsilon = 1e-3);
    }

    #[test]
    #[ignore = "needs the OSTN15 and HS2TN15 NTv2 files in SNAKE_GRID_GSB_DIR"]
    fn round_trip_between_grids() {
        let files = GridFiles::from_env();
        for (a, b) in [
            (GridCode::BritishNationalGrid, GridCode::Hs2SnakeGrid),
            (GridCode::Hs2SnakeGrid, GridCode::BritishNationalGrid),
            (GridCode::Hs2SnakeGrid, GridCode::Hs2SnakeGrid),
        ] {
            let forward = create_transformer(a, b, &files).unwrap();
            let back = create_transformer(b, a, &files).unwrap();
            let start = match a {
                GridCode::BritishNationalGrid => (450000.0, 250000.0),
                GridCode::Hs2SnakeGrid => (180000.0, 300000.0),
            };
            let (bx, by) = forward.transform(start.0, start.1).unwrap();
            let (x, y) = back.transform(bx, by).unwrap();
            assert_relative_eq!(x, start.0, epsilon = 1e-3);
            assert_relative_eq!(y, start.1, epsilon = 1e-3);
        }
    }
}
