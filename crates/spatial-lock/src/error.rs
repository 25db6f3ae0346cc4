//! Grid construction error types.

use thiserror::Error;

use crate::Axis;

/// Error returned when a grid cannot be built from its configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    /// Resolution must be at least one cell per axis.
    #[error("grid resolution must be at least 1")]
    ZeroResolution,

    /// Bounding box has zero, negative, or non-finite extent on an axis.
    #[error("degenerate bounding box on {axis} axis: [{min}, {max}]")]
    DegenerateBounds { axis: Axis, min: f64, max: f64 },

    /// `resolution³` does not fit in a [`CellId`](crate::CellId).
    #[error("resolution {resolution} yields more cells than a cell id can address")]
    TooManyCells { resolution: u32 },
}

/// Result type for grid construction.
pub type GridResult<T> = Result<T, GridError>;
