use std::io::Write;

use log::{debug, info, warn};

use crate::config::GridFiles;
use crate::error::{Result, TransformError};
use crate::grid::GridCode;
use crate::transformer::{create_transformer, CoordinateTransform};

/// One input line. A cell that did not parse as a finite number is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateRow {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub raw: String,
}

impl CoordinateRow {
    pub fn from_line(line: &str) -> Self {
        let fields: Vec<&str> = line.split(',').collect();
        let (x, y) = match fields.as_slice() {
            [x, y] => (parse_cell(x), parse_cell(y)),
            _ => (None, None),
        };
        CoordinateRow {
            x,
            y,
            raw: line.to_string(),
        }
    }

    pub fn coordinate(&self) -> Option<(f64, f64)> {
        self.x.zip(self.y)
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Ordered rows of `x,y` text; row `i` of the output always matches row `i` here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateBatch {
    pub rows: Vec<CoordinateRow>,
}

impl CoordinateBatch {
    /// Splits `text` into one row per line. Never fails: bad lines become
    /// rows with missing cells.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return CoordinateBatch::default();
        }
        CoordinateBatch {
            rows: trimmed.lines().map(CoordinateRow::from_line).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Output row; `None` coordinates are the missing-value marker and `issue`
/// says why.
#[derive(Debug)]
pub struct TransformedRow {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub issue: Option<TransformError>,
}

impl TransformedRow {
    fn missing(issue: TransformError) -> Self {
        TransformedRow {
            x: None,
            y: None,
            issue: Some(issue),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.x.is_none() || self.y.is_none()
    }

    pub fn display_x(&self) -> String {
        format_value(self.x)
    }

    pub fn display_y(&self) -> String {
        format_value(self.y)
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "NaN".to_string(),
    }
}

/// Transforms every row with an already-built transform.
pub fn transform_rows<T>(batch: &CoordinateBatch, transform: &T) -> Vec<TransformedRow>
where
    T: CoordinateTransform + ?Sized,
{
    batch
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let Some((x, y)) = row.coordinate() else {
                warn!("Row {} is not a numeric x,y pair: {:?}", index + 1, row.raw);
                return TransformedRow::missing(TransformError::MalformedCoordinateRow {
                    row: index + 1,
                    content: row.raw.clone(),
                });
            };
            match transform.transform(x, y) {
                Ok((tx, ty)) => TransformedRow {
                    x: Some(tx),
                    y: Some(ty),
                    issue: None,
                },
                Err(e) => {
                    debug!("Row {} could not be transformed: {}", index + 1, e);
                    TransformedRow::missing(e)
                }
            }
        })
        .collect()
}

/// Builds one transformer for `source` -> `dest` and runs the whole batch through it.
pub fn transform_coordinates(
    batch: &CoordinateBatch,
    source: GridCode,
    dest: GridCode,
    grid_files: &GridFiles,
) -> Result<Vec<TransformedRow>> {
    let transformer = create_transformer(source, dest, grid_files)?;
    let rows = transform_rows(batch, &transformer);
    let missing = rows.iter().filter(|row| row.is_missing()).count();
    info!(
        "Transformed {} of {} coordinate rows from {} to {}",
        rows.len() - missing,
        rows.len(),
        transformer.source(),
        transformer.dest()
    );
    Ok(rows)
}

/// Writes `transformed_x,transformed_y` rows at display precision.
pub fn write_csv<W: Write>(rows: &[TransformedRow], mut writer: W) -> Result<()> {
    writeln!(writer, "transformed_x,transformed_y")?;
    for row in rows {
        writeln!(writer, "{},{}", row.display_x(), row.display_y())?;
    }
    writer.flush()?;
    Ok(())
}
