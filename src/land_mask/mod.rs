//! Precomputed land/water lookup for grid points.

pub mod error;
mod loader;

use crate::types::grid_point::{GridPoint, PointKey};
use error::LandMaskError;
use log::info;
use std::collections::HashMap;
use std::path::Path;

/// Immutable table answering "is this grid point on land?".
///
/// Built once before scheduling and shared read-only afterwards. Points absent
/// from the table are treated as water so that no request is wasted on them.
#[derive(Debug, Clone, Default)]
pub struct LandMask {
    table: HashMap<PointKey, bool>,
}

impl LandMask {
    /// Loads the mask from a CSV file with a header row and the columns
    /// `latitude, longitude, is_land` (by position).
    ///
    /// `is_land` is compared case-insensitively against `true`, so files
    /// written as `True`/`False` load as expected.
    ///
    /// # Errors
    ///
    /// Returns [`LandMaskError`] when the file can't be read, has fewer than three
    /// columns, or contains a row whose coordinates don't parse.
    pub async fn from_csv(path: &Path) -> Result<Self, LandMaskError> {
        let path_buf = path.to_path_buf();
        let entries =
            tokio::task::spawn_blocking(move || loader::read_entries(&path_buf)).await??;
        let mask = Self::from_entries(entries);
        info!(
            "Loaded land mask from {} ({} entries, {} on land)",
            path.display(),
            mask.len(),
            mask.land_count()
        );
        Ok(mask)
    }

    /// Builds a mask from `(point, is_land)` pairs. Later pairs win on duplicates.
    pub fn from_entries(entries: impl IntoIterator<Item = (GridPoint, bool)>) -> Self {
        Self {
            table: entries
                .into_iter()
                .map(|(point, is_land)| (point.key(), is_land))
                .collect(),
        }
    }

    pub fn is_land(&self, point: &GridPoint) -> bool {
        self.table.get(&point.key()).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn land_count(&self) -> usize {
        self.table.values().filter(|is_land| **is_land).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_unknown_point_is_water() {
        let mask = LandMask::from_entries([(GridPoint::new(40.0, -100.0), true)]);
        assert!(mask.is_land(&GridPoint::new(40.0, -100.0)));
        assert!(!mask.is_land(&GridPoint::new(40.5, -100.0)));
        assert!(!LandMask::default().is_land(&GridPoint::new(0.0, 0.0)));
    }

    #[test]
    fn test_later_entries_win() {
        let point = GridPoint::new(1.0, 2.0);
        let mask = LandMask::from_entries([(point, true), (point, false)]);
        assert!(!mask.is_land(&point));
        assert_eq!(mask.len(), 1);
    }

    #[tokio::test]
    async fn test_from_csv_parses_python_style_booleans() -> Result<(), Box<dyn std::error::Error>> {
        let file = write_csv(
            "Latitude,Longitude,Is_Land\n\
             24.0,-125.0,False\n\
             24.0,-124.5,True\n\
             39.5,-105.0,true\n\
             45.0,-70.0,TRUE\n",
        );
        let mask = LandMask::from_csv(file.path()).await?;

        assert_eq!(mask.len(), 4);
        assert_eq!(mask.land_count(), 3);
        assert!(!mask.is_land(&GridPoint::new(24.0, -125.0)));
        assert!(mask.is_land(&GridPoint::new(24.0, -124.5)));
        assert!(mask.is_land(&GridPoint::new(39.5, -105.0)));
        assert!(mask.is_land(&GridPoint::new(45.0, -70.0)));
        Ok(())
    }

    #[tokio::test]
    async fn test_from_csv_matches_generated_grid_points() -> Result<(), Box<dyn std::error::Error>> {
        let file = write_csv("latitude,longitude,is_land\n24.5,-67.0,true\n");
        let mask = LandMask::from_csv(file.path()).await?;
        let land: Vec<GridPoint> = crate::GridSpec::CONTINENTAL_US
            .points()
            .filter(|p| mask.is_land(p))
            .collect();
        assert_eq!(land, vec![GridPoint::new(24.5, -67.0)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_from_csv_rejects_bad_coordinate() {
        let file = write_csv("latitude,longitude,is_land\n24.0,-125.0,true\nabc,-124.5,true\n");
        let err = LandMask::from_csv(file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            LandMaskError::InvalidCoordinate { row: 2, ref value, .. } if value == "abc"
        ));
    }

    #[tokio::test]
    async fn test_from_csv_rejects_too_few_columns() {
        let file = write_csv("latitude,longitude\n24.0,-125.0\n");
        let err = LandMask::from_csv(file.path()).await.unwrap_err();
        assert!(matches!(err, LandMaskError::ColumnCount { found: 2, .. }));
    }

    #[tokio::test]
    async fn test_from_csv_missing_file() {
        let err = LandMask::from_csv(Path::new("/nonexistent/land.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, LandMaskError::CsvRead(..)));
    }
}
