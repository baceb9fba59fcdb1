//! Geographic sample locations visited by the fetcher.

use ordered_float::OrderedFloat;
use std::fmt;

/// One `(latitude, longitude)` sample location of the grid.
///
/// Grid points are produced by [`crate::GridSpec`] and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use aqgrid::GridPoint;
///
/// let denver = GridPoint::new(39.5, -105.0);
/// assert_eq!(denver.latitude, 39.5);
/// assert_eq!(denver.longitude, -105.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Hashable identity of a [`GridPoint`], used for the land mask table and
/// for de-duplicating requests.
pub(crate) type PointKey = (OrderedFloat<f64>, OrderedFloat<f64>);

impl GridPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub(crate) fn key(&self) -> PointKey {
        (OrderedFloat(self.latitude), OrderedFloat(self.longitude))
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}
