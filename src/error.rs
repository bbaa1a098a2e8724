//! Error types for the qplot library.

use std::io;

use thiserror::Error;

/// The main error type for qplot operations.
///
/// Most translation steps never fail: malformed style strings, unknown legend
/// locations and a missing gradient all degrade to defaults. What remains are
/// argument validation, panel lookup and export.
#[derive(Debug, Error)]
pub enum PlotError {
    /// A plotting call received an unusable positional argument list.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Data that cannot be turned into a trace.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// Panel lookup outside the figure grid.
    #[error("no panel at row {row}, column {col} (grid is {nrows}x{ncols})")]
    NoSuchPanel {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
    /// Export target whose suffix no renderer handles.
    #[error("unsupported output format: {0:?}")]
    UnsupportedFormat(String),
    /// Failure inside the raster renderer.
    #[error("render error: {0}")]
    Render(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for qplot operations.
pub type Result<T> = std::result::Result<T, PlotError>;
