use thiserror::Error;
use trellis_common::table::ColumnType;
use trellis_scales::error::ScaleError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Column {index} has role `{role}` but no preceding column it can attach to")]
    InvalidRoleSequence { index: usize, role: String },

    #[error("Column `{column}` has type {found:?}, expected {expected:?}")]
    MixedColumnTypes {
        column: String,
        expected: ColumnType,
        found: ColumnType,
    },

    #[error("Orientation `{orientation}` is not supported for {series_type} series")]
    UnsupportedOrientation {
        orientation: String,
        series_type: String,
    },

    #[error("focusTarget `{focus_target}` is not compatible with {series_type} series")]
    IncompatibleFocusTarget {
        focus_target: String,
        series_type: String,
    },

    #[error("{series_type} series needs {needed} data columns, found {found}")]
    MissingSeriesColumns {
        series_type: String,
        needed: usize,
        found: usize,
    },

    #[error("Invalid timezone: `{0}`")]
    InvalidTimezone(String),

    #[error("Cannot position non-finite value {0}")]
    NonFiniteValue(f64),

    #[error("Scale error: `{0}`")]
    ScaleError(#[from] ScaleError),
}
