pub mod air_quality;
pub mod credential;
pub mod grid_point;
