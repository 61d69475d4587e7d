//! Error types for grid, algebra and solver operations.

use thiserror::Error;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or driving a simulation.
///
/// Out-of-bounds reads are not errors: [`crate::Grid::get`] returns `None`.
/// Only writes outside the grid fail.
#[derive(Error, Debug)]
pub enum Error {
    /// Grid constructed with a zero extent or an unallocatable cell count.
    #[error("invalid grid dimensions: {columns} columns x {rows} rows")]
    InvalidDimensions { columns: usize, rows: usize },

    /// Write to a cell outside the grid.
    #[error("cell ({x}, {y}) out of bounds for {columns}x{rows} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        columns: usize,
        rows: usize,
    },

    /// Axis tag other than `x` or `y`.
    #[error("invalid axis: {0:?}")]
    InvalidAxis(String),

    /// Stress tensors must satisfy xy == yx.
    #[error("tensor is not symmetric (xy = {xy}, yx = {yx})")]
    AsymmetricTensor { xy: f64, yx: f64 },

    /// Invalid material properties.
    #[error("invalid material: {0}")]
    InvalidMaterial(String),

    /// Co-registered grids disagree on their dimensions.
    #[error("topology mismatch: {0}")]
    TopologyMismatch(String),

    /// Invalid simulation parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Worker pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// I/O errors (configuration files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
