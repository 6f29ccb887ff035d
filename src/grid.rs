use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, TransformError};

/// The two projected grids this tool knows how to move between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridCode {
    /// OSGB36 / British National Grid.
    BritishNationalGrid,
    /// HS2 Snake Grid (HS2-TM / HS2SG).
    Hs2SnakeGrid,
}

impl GridCode {
    pub const ALL: [GridCode; 2] = [GridCode::BritishNationalGrid, GridCode::Hs2SnakeGrid];

    pub fn epsg(self) -> u32 {
        match self {
            GridCode::BritishNationalGrid => 27700,
            GridCode::Hs2SnakeGrid => 9300,
        }
    }

    pub fn definition(self) -> &'static GridDefinition {
        match self {
            GridCode::BritishNationalGrid => &GRID_DEFINITIONS[0],
            GridCode::Hs2SnakeGrid => &GRID_DEFINITIONS[1],
        }
    }
}

impl fmt::Display for GridCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl TryFrom<u32> for GridCode {
    type Error = TransformError;

    fn try_from(code: u32) -> Result<Self> {
        GridCode::ALL
            .into_iter()
            .find(|grid| grid.epsg() == code)
            .ok_or_else(|| TransformError::UnsupportedGridCode(code.to_string()))
    }
}

impl FromStr for GridCode {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = match trimmed.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("epsg:") => &trimmed[5..],
            _ => trimmed,
        };
        digits
            .parse::<u32>()
            .map_err(|_| TransformError::UnsupportedGridCode(s.to_string()))
            .and_then(GridCode::try_from)
    }
}

/// Fixed parameters of a transverse Mercator grid plus its NTv2 correction file.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDefinition {
    pub code: GridCode,
    pub name: &'static str,
    pub lat_0: f64,
    pub lon_0: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    pub ellipsoid: &'static str,
    pub grid_file: &'static str,
}

pub static GRID_DEFINITIONS: [GridDefinition; 2] = [
    GridDefinition {
        code: GridCode::BritishNationalGrid,
        name: "British National Grid",
        lat_0: 49.0,
        lon_0: -2.0,
        scale_factor: 0.9996012717,
        false_easting: 400000.0,
        false_northing: -100000.0,
        ellipsoid: "airy",
        grid_file: "OSTN15_NTv2_OSGBtoETRS.gsb",
    },
    GridDefinition {
        code: GridCode::Hs2SnakeGrid,
        name: "HS2 Snake Grid",
        lat_0: 52.3,
        lon_0: -1.5,
        scale_factor: 1.0,
        false_easting: 198873.0046,
        false_northing: 375064.3871,
        ellipsoid: "GRS80",
        grid_file: "HS2TN15_NTv2.gsb",
    },
];

impl GridDefinition {
    /// PROJ CRS string for this grid, with `grid_path` as the `+nadgrids` file.
    pub fn proj_string(&self, grid_path: &Path) -> String {
        format!(
            "+proj=tmerc +lat_0={} +lon_0={} +k={} +x_0={} +y_0={} +ellps={} \
             +nadgrids={} +units=m +no_defs +type=crs",
            self.lat_0,
            self.lon_0,
            self.scale_factor,
            self.false_easting,
            self.false_northing,
            self.ellipsoid,
            grid_path.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_prefixed_codes() {
        assert_eq!("27700".parse::<GridCode>().unwrap(), GridCode::BritishNationalGrid);
        assert_eq!("EPSG:9300".parse::<GridCode>().unwrap(), GridCode::Hs2SnakeGrid);
        assert_eq!(" epsg:27700 ".parse::<GridCode>().unwrap(), GridCode::BritishNationalGrid);
        assert_eq!(GridCode::try_from(9300).unwrap(), GridCode::Hs2SnakeGrid);
    }

    #[test]
    fn rejects_codes_outside_the_table() {
        for input in ["4326", "EPSG:3857", "snake", ""] {
            match input.parse::<GridCode>() {
                Err(TransformError::UnsupportedGridCode(code)) => assert_eq!(code, input),
                other => panic!("expected UnsupportedGridCode for {input:?}, got {other:?}"),
            }
        }
        assert!(GridCode::try_from(2770).is_err());
    }

    #[test]
    fn each_code_resolves_to_its_own_row() {
        for grid in GridCode::ALL {
            assert_eq!(grid.definition().code, grid);
        }
    }

    #[test]
    fn renders_proj_string() {
        let def = GridCode::BritishNationalGrid.definition();
        let rendered = def.proj_string(Path::new("./gsb_files/OSTN15_NTv2_OSGBtoETRS.gsb"));
        assert_eq!(
            rendered,
            "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 \
             +ellps=airy +nadgrids=./gsb_files/OSTN15_NTv2_OSGBtoETRS.gsb \
             +units=m +no_defs +type=crs"
        );

        let snake = GridCode::Hs2SnakeGrid
            .definition()
            .proj_string(Path::new("HS2TN15_NTv2.gsb"));
        assert!(snake.contains("+lat_0=52.3 +lon_0=-1.5 +k=1 +x_0=198873.0046 +y_0=375064.3871"));
        assert!(snake.contains("+ellps=GRS80"));
    }
}
