//! Generation of the rectangular grid of sample points.

use crate::error::AqGridError;
use crate::types::grid_point::GridPoint;

// Absorbs float noise such as 0.3 / 0.1 = 2.9999999999999996.
const INDEX_EPSILON: f64 = 1e-9;

const MAX_AXIS_POINTS: f64 = u32::MAX as f64;

// Integers up to 2^53 are exact in an f64.
const MAX_EXACT_INDEX: f64 = 9_007_199_254_740_992.0;

/// Bounding box plus step size describing a rectangular sampling grid.
///
/// Each axis starts at its minimum and advances by `step` while it stays within
/// the maximum. When a minimum is a whole multiple of `step`, coordinates are
/// computed as `index × step`, so a point produced here compares equal to the
/// same point parsed from a land mask built with the same step.
///
/// # Examples
///
/// ```
/// use aqgrid::GridSpec;
///
/// let grid = GridSpec::CONTINENTAL_US;
/// assert_eq!(grid.len(), 6201);
/// assert_eq!(grid.points().count(), 6201);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
    step: f64,
}

/// Positions along one axis.
#[derive(Debug, Clone, Copy)]
struct Axis {
    min: f64,
    step: f64,
    // Index of `min` in units of `step`, when `min` is a whole multiple.
    origin: Option<i64>,
    len: usize,
}

impl Axis {
    fn new(min: f64, max: f64, step: f64) -> Self {
        let scaled = min / step;
        let nearest = scaled.round();
        let aligned = nearest.abs() <= MAX_EXACT_INDEX && (scaled - nearest).abs() < INDEX_EPSILON;
        Self {
            min,
            step,
            origin: aligned.then_some(nearest as i64),
            len: steps_between(min, max, step) as usize + 1,
        }
    }

    fn value(&self, k: usize) -> f64 {
        match self.origin {
            Some(origin) => (origin + k as i64) as f64 * self.step,
            None => self.min + k as f64 * self.step,
        }
    }
}

fn steps_between(min: f64, max: f64, step: f64) -> f64 {
    ((max - min) / step + INDEX_EPSILON).floor()
}

impl GridSpec {
    /// The contiguous United States at half-degree resolution.
    pub const CONTINENTAL_US: GridSpec = GridSpec {
        lat_min: 24.0,
        lat_max: 50.0,
        lon_min: -125.0,
        lon_max: -67.0,
        step: 0.5,
    };

    /// Creates a grid over the inclusive ranges `[lat_min, lat_max]` and
    /// `[lon_min, lon_max]`.
    ///
    /// # Errors
    ///
    /// Returns [`AqGridError::InvalidGrid`] when `step` is not a positive finite
    /// number, a bound is not finite or lies outside `[-90, 90]` (latitude) or
    /// `[-180, 180]` (longitude), a minimum exceeds its maximum, or the step is
    /// so fine that the grid can't be counted.
    pub fn new(
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
        step: f64,
    ) -> Result<Self, AqGridError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(AqGridError::InvalidGrid(format!(
                "step must be positive, got {step}"
            )));
        }
        let bounds = [lat_min, lat_max, lon_min, lon_max];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(AqGridError::InvalidGrid("bounds must be finite".into()));
        }
        if !(-90.0..=90.0).contains(&lat_min) || !(-90.0..=90.0).contains(&lat_max) {
            return Err(AqGridError::InvalidGrid(format!(
                "latitude must be within -90..90, got {lat_min}..{lat_max}"
            )));
        }
        if !(-180.0..=180.0).contains(&lon_min) || !(-180.0..=180.0).contains(&lon_max) {
            return Err(AqGridError::InvalidGrid(format!(
                "longitude must be within -180..180, got {lon_min}..{lon_max}"
            )));
        }
        if lat_min > lat_max || lon_min > lon_max {
            return Err(AqGridError::InvalidGrid(format!(
                "empty bounding box: lat {lat_min}..{lat_max}, lon {lon_min}..{lon_max}"
            )));
        }
        let too_fine = || AqGridError::InvalidGrid(format!("step {step} yields too many points"));
        if steps_between(lat_min, lat_max, step) >= MAX_AXIS_POINTS
            || steps_between(lon_min, lon_max, step) >= MAX_AXIS_POINTS
        {
            return Err(too_fine());
        }
        let grid = Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
            step,
        };
        if grid.lat_axis().len.checked_mul(grid.lon_axis().len).is_none() {
            return Err(too_fine());
        }
        Ok(grid)
    }

    fn lat_axis(&self) -> Axis {
        Axis::new(self.lat_min, self.lat_max, self.step)
    }

    fn lon_axis(&self) -> Axis {
        Axis::new(self.lon_min, self.lon_max, self.step)
    }

    /// Number of points the grid yields.
    pub fn len(&self) -> usize {
        self.lat_axis().len * self.lon_axis().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazily yields every point, ordered by ascending latitude then ascending
    /// longitude. Call again to restart.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + Clone {
        let lat = self.lat_axis();
        let lon = self.lon_axis();
        (0..lat.len).flat_map(move |i| {
            let latitude = lat.value(i);
            (0..lon.len).map(move |j| GridPoint::new(latitude, lon.value(j)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continental_us_point_count() {
        let grid = GridSpec::CONTINENTAL_US;
        assert_eq!(grid.len(), 53 * 117);
        assert_eq!(grid.points().count(), 6201);
    }

    #[test]
    fn test_points_are_ordered_lat_then_lon() {
        let points: Vec<GridPoint> = GridSpec::CONTINENTAL_US.points().collect();
        assert_eq!(points.first(), Some(&GridPoint::new(24.0, -125.0)));
        assert_eq!(points[1], GridPoint::new(24.0, -124.5));
        assert_eq!(points[117], GridPoint::new(24.5, -125.0));
        assert_eq!(points.last(), Some(&GridPoint::new(50.0, -67.0)));
        assert!(points.windows(2).all(|w| {
            let (a, b) = (w[0], w[1]);
            a.latitude < b.latitude || (a.latitude == b.latitude && a.longitude < b.longitude)
        }));
    }

    #[test]
    fn test_points_are_restartable() {
        let grid = GridSpec::new(0.0, 1.0, 0.0, 1.0, 0.5).unwrap();
        let first: Vec<_> = grid.points().collect();
        let second: Vec<_> = grid.points().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 9);
    }

    #[test]
    fn test_fractional_step_keeps_inclusive_upper_bound() {
        let grid = GridSpec::new(0.0, 0.3, 0.0, 0.0, 0.1).unwrap();
        assert_eq!(grid.len(), 4);
        let lats: Vec<f64> = grid.points().map(|p| p.latitude).collect();
        assert_eq!(lats.len(), 4);
        assert!((lats[3] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_single_point_grid() {
        let grid = GridSpec::new(10.0, 10.0, 20.0, 20.0, 1.0).unwrap();
        assert_eq!(grid.points().collect::<Vec<_>>(), vec![GridPoint::new(10.0, 20.0)]);
    }

    #[test]
    fn test_invalid_grids_are_rejected() {
        assert!(GridSpec::new(0.0, 1.0, 0.0, 1.0, 0.0).is_err());
        assert!(GridSpec::new(0.0, 1.0, 0.0, 1.0, -0.5).is_err());
        assert!(GridSpec::new(2.0, 1.0, 0.0, 1.0, 0.5).is_err());
        assert!(GridSpec::new(0.0, f64::NAN, 0.0, 1.0, 0.5).is_err());
    }

    #[test]
    fn test_unaligned_bounds_start_at_minimum() {
        let grid = GridSpec::new(0.25, 1.25, 0.0, 0.0, 0.5).unwrap();
        let lats: Vec<f64> = grid.points().map(|p| p.latitude).collect();
        assert_eq!(lats, vec![0.25, 0.75, 1.25]);
        assert_eq!(grid.len(), 3);

        let grid = GridSpec::new(10.0, 10.0, -3.3, -2.0, 0.5).unwrap();
        assert_eq!(grid.len(), 3);
        let first = grid.points().next().unwrap();
        assert!((first.longitude + 3.3).abs() < 1e-12);
    }

    #[test]
    fn test_aligned_bounds_use_index_times_step() {
        let grid = GridSpec::new(-0.3, 0.3, 0.0, 0.0, 0.1).unwrap();
        let lats: Vec<f64> = grid.points().map(|p| p.latitude).collect();
        let expected: Vec<f64> = (-3..=3).map(|i| i as f64 * 0.1).collect();
        assert_eq!(lats, expected);
    }

    #[test]
    fn test_out_of_range_bounds_are_rejected() {
        assert!(matches!(
            GridSpec::new(-1e300, 1e300, 0.0, 0.0, 1.0),
            Err(AqGridError::InvalidGrid(_))
        ));
        assert!(GridSpec::new(-91.0, 0.0, 0.0, 0.0, 1.0).is_err());
        assert!(GridSpec::new(0.0, 0.0, 0.0, 180.5, 1.0).is_err());
        assert_eq!(GridSpec::new(-90.0, 90.0, -180.0, 180.0, 1.0).unwrap().len(), 181 * 361);
    }

    #[test]
    fn test_too_fine_step_is_rejected() {
        assert!(matches!(
            GridSpec::new(-90.0, 90.0, 0.0, 0.0, 1e-300),
            Err(AqGridError::InvalidGrid(_))
        ));
        let single = GridSpec::new(45.0, 45.0, 10.0, 10.0, 1e-300).unwrap();
        assert_eq!(single.points().collect::<Vec<_>>(), vec![GridPoint::new(45.0, 10.0)]);
    }
}
