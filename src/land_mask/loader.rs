use crate::land_mask::error::LandMaskError;
use crate::types::grid_point::GridPoint;
use polars::prelude::*;
use std::path::Path;

/// Reads `(point, is_land)` pairs from a CSV file. Blocking; run it on a
/// blocking task.
pub(crate) fn read_entries(path: &Path) -> Result<Vec<(GridPoint, bool)>, LandMaskError> {
    let path_buf = path.to_path_buf();

    // Every column as a string, so booleans written as `True` survive and
    // coordinate errors can be reported per row.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path_buf.clone()))
        .map_err(|e| LandMaskError::CsvRead(path_buf.clone(), e))?
        .finish()
        .map_err(|e| LandMaskError::CsvRead(path_buf.clone(), e))?;

    let columns = df.get_columns();
    if columns.len() < 3 {
        return Err(LandMaskError::ColumnCount {
            path: path_buf,
            found: columns.len(),
        });
    }

    let latitudes = string_column(&columns[0], &path_buf)?;
    let longitudes = string_column(&columns[1], &path_buf)?;
    let land_flags = string_column(&columns[2], &path_buf)?;

    let parse_coordinate = |value: Option<&str>, row: usize| -> Result<f64, LandMaskError> {
        let value = value.ok_or_else(|| LandMaskError::MissingValue {
            path: path_buf.clone(),
            row,
        })?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| LandMaskError::InvalidCoordinate {
                path: path_buf.clone(),
                row,
                value: value.to_string(),
            })
    };

    latitudes
        .into_iter()
        .zip(longitudes.into_iter())
        .zip(land_flags.into_iter())
        .enumerate()
        .map(|(i, ((lat, lon), is_land))| {
            let row = i + 1;
            let point = GridPoint::new(parse_coordinate(lat, row)?, parse_coordinate(lon, row)?);
            let is_land = is_land.is_some_and(|flag| flag.trim().eq_ignore_ascii_case("true"));
            Ok((point, is_land))
        })
        .collect()
}

fn string_column<'a>(column: &'a Column, path: &Path) -> Result<&'a StringChunked, LandMaskError> {
    column
        .str()
        .map_err(|e| LandMaskError::ColumnOperation(path.to_path_buf(), e))
}
