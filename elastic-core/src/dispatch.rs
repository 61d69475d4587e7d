//! Parallel column decomposition for grid updates.
//!
//! A phase update computes every cell of a target grid from stencils over
//! other grids. Stencils reach one column past a worker's range, so workers
//! must never read a grid that a peer is writing. The dispatcher enforces
//! this by construction:
//!
//! 1. the caller's grids are borrowed immutably for the whole phase (snapshot),
//! 2. the target is cloned into a fresh output buffer,
//! 3. the buffer is split into disjoint column-range slices, one per worker,
//! 4. the finished buffer is returned and the caller publishes it.
//!
//! Results are therefore independent of worker count and scheduling order.

use crate::error::Result;
use crate::grid::Grid;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;

/// Split `0..columns` into at most `workers` contiguous, non-empty ranges.
///
/// Range lengths differ by at most one; earlier ranges take the remainder.
/// A worker count of zero is treated as one.
pub fn partition_columns(columns: usize, workers: usize) -> Vec<Range<usize>> {
    if columns == 0 {
        return Vec::new();
    }
    let parts = workers.clamp(1, columns);
    let base = columns / parts;
    let extra = columns % parts;

    let mut start = 0;
    (0..parts)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Runs column-partitioned grid updates on a fixed-size worker pool.
#[derive(Debug)]
pub struct ColumnDispatcher {
    pool: ThreadPool,
    workers: usize,
}

impl ColumnDispatcher {
    /// Create a dispatcher with `workers` threads (0 = rayon default).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ThreadPool`] if the pool cannot be started.
    pub fn new(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
        let workers = pool.current_num_threads();
        Ok(Self { pool, workers })
    }

    /// Number of worker threads (and column ranges per phase).
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Compute the next state of `grid` cell by cell.
    ///
    /// `update(x, y, old)` receives the cell's previous payload and must read
    /// every other input through shared references captured from the caller.
    /// Writes go only to the worker's own slice of the output buffer; the
    /// input grid is left untouched and the new grid is returned once all
    /// workers have joined.
    pub fn evolve<T, F>(&self, grid: &Grid<T>, update: F) -> Grid<T>
    where
        T: Clone + Send + Sync,
        F: Fn(usize, usize, &T) -> T + Sync,
    {
        let mut next = grid.clone();
        let ranges = partition_columns(grid.columns(), self.workers);
        let chunks = next.column_chunks_mut(&ranges);

        self.pool.install(|| {
            chunks.into_par_iter().for_each(|chunk| {
                for cell in chunk.iter_mut() {
                    let value = update(cell.x(), cell.y(), cell.data());
                    cell.set(value);
                }
            });
        });

        next
    }
}
