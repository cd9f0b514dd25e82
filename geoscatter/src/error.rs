//! Geometry errors

use thiserror::Error;

/// Geometry result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the distance, aspect, grid and projection computations.
///
/// Floating-point rounding that pushes the law-of-cosines argument outside
/// [-1, 1] is not an error; it is clamped inside the distance computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid bounding box (left={left}, right={right}, top={top}, bottom={bottom}): {reason}")]
    InvalidBoundingBox {
        left: f64,
        right: f64,
        top: f64,
        bottom: f64,
        reason: &'static str,
    },

    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("degenerate grid: {columns} columns x {rows} rows")]
    DegenerateGrid { columns: usize, rows: usize },

    #[error("grid too large: {columns} columns x {rows} rows")]
    GridTooLarge { columns: usize, rows: usize },

    #[error("degenerate raster: {width} x {height} pixels")]
    DegenerateRaster { width: u32, height: u32 },
}
