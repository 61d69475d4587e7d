//! Structured 2D grid of cells.
//!
//! Cells are addressed by integer `(x, y)` = (column, row) with
//! `0 <= x < columns` and `0 <= y < rows`. Storage is column-major so that a
//! contiguous range of columns is a contiguous slice of cells, which is what
//! the column dispatcher partitions.

use crate::error::{Error, Result};
use std::ops::Range;

/// One addressable grid cell: fixed position, mutable payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell<T> {
    x: usize,
    y: usize,
    data: T,
}

impl<T> Cell<T> {
    /// Column index.
    pub fn x(&self) -> usize {
        self.x
    }

    /// Row index.
    pub fn y(&self) -> usize {
        self.y
    }

    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Overwrite the payload, returning the previous one.
    pub fn set(&mut self, data: T) -> T {
        std::mem::replace(&mut self.data, data)
    }
}

/// Fixed-size rectangular grid with one cell per coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    columns: usize,
    rows: usize,
    /// Column-major: index = x * rows + y.
    cells: Vec<Cell<T>>,
}

/// 3x3 neighbor window; out-of-bounds positions are `None`.
///
/// Window position `(1, 1)` is the centre cell, `(0, 1)` its left neighbour
/// and `(1, 2)` the neighbour in the next row.
pub type Neighborhood<'a, T> = Grid<Option<&'a T>>;

impl<T> Grid<T> {
    /// Create a grid, calling `init(x, y)` once per coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either extent is zero or the
    /// cell count cannot be allocated.
    pub fn new(columns: usize, rows: usize, init: impl FnMut(usize, usize) -> T) -> Result<Self> {
        let invalid = || Error::InvalidDimensions { columns, rows };
        let count = columns
            .checked_mul(rows)
            .filter(|&n| n > 0)
            .ok_or_else(invalid)?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(count).map_err(|_| invalid())?;
        Ok(Self::fill(columns, rows, cells, init))
    }

    /// Create a grid with every payload set to `value`.
    pub fn filled(columns: usize, rows: usize, value: T) -> Result<Self>
    where
        T: Clone,
    {
        Self::new(columns, rows, |_, _| value.clone())
    }

    /// Small fixed-size grid, e.g. a neighbour window.
    fn build(columns: usize, rows: usize, init: impl FnMut(usize, usize) -> T) -> Self {
        Self::fill(columns, rows, Vec::with_capacity(columns * rows), init)
    }

    fn fill(
        columns: usize,
        rows: usize,
        mut cells: Vec<Cell<T>>,
        mut init: impl FnMut(usize, usize) -> T,
    ) -> Self {
        for x in 0..columns {
            for y in 0..rows {
                cells.push(Cell {
                    x,
                    y,
                    data: init(x, y),
                });
            }
        }
        Self {
            columns,
            rows,
            cells,
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        self.contains(x, y).then(|| x * self.rows + y)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Index of the last column.
    pub fn column_end(&self) -> usize {
        self.columns - 1
    }

    /// Index of the last row.
    pub fn row_end(&self) -> usize {
        self.rows - 1
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: grids have at least one cell.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.columns && y < self.rows
    }

    /// Cell at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell<T>> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Mutable cell at `(x, y)`. Only the payload can be changed.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell<T>> {
        self.index(x, y).map(move |i| &mut self.cells[i])
    }

    /// Payload at `(x, y)`, or `None` outside the grid.
    pub fn value(&self, x: usize, y: usize) -> Option<&T> {
        self.get(x, y).map(Cell::data)
    }

    /// Payload at `(x + dx, y + dy)`, or `None` if that falls outside the grid.
    pub fn offset(&self, x: usize, y: usize, dx: isize, dy: isize) -> Option<&T> {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.value(nx, ny)
    }

    /// Overwrite the payload at `(x, y)`, returning the previous payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] outside the grid.
    pub fn replace(&mut self, x: usize, y: usize, data: T) -> Result<T> {
        let (columns, rows) = (self.columns, self.rows);
        self.get_mut(x, y)
            .map(|cell| cell.set(data))
            .ok_or(Error::OutOfBounds {
                x,
                y,
                columns,
                rows,
            })
    }

    /// 3x3 window centred on `(x, y)`.
    ///
    /// Positions outside this grid are `None`; nothing is wrapped or clamped.
    pub fn neighbors(&self, x: usize, y: usize) -> Neighborhood<'_, T> {
        Grid::build(3, 3, |i, j| self.offset(x, y, i as isize - 1, j as isize - 1))
    }

    /// New grid of the same topology with `f` applied to every payload.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            columns: self.columns,
            rows: self.rows,
            cells: self
                .cells
                .iter()
                .map(|c| Cell {
                    x: c.x,
                    y: c.y,
                    data: f(&c.data),
                })
                .collect(),
        }
    }

    /// All cells in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell<T>> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell<T>> {
        self.cells.iter_mut()
    }

    /// Cells of column `x`, ordered by row.
    pub fn column(&self, x: usize) -> Option<&[Cell<T>]> {
        (x < self.columns).then(|| &self.cells[x * self.rows..(x + 1) * self.rows])
    }

    /// Cells of row `y`, ordered by column.
    pub fn row(&self, y: usize) -> Option<Vec<&Cell<T>>> {
        (y < self.rows).then(|| {
            (0..self.columns)
                .map(|x| &self.cells[x * self.rows + y])
                .collect()
        })
    }

    /// Whether `other` has the same dimensions.
    pub fn same_topology<U>(&self, other: &Grid<U>) -> bool {
        self.columns == other.columns && self.rows == other.rows
    }

    /// Split the cells into disjoint mutable slices, one per column range.
    ///
    /// `ranges` must be contiguous, ascending and cover `0..columns`.
    pub(crate) fn column_chunks_mut(&mut self, ranges: &[Range<usize>]) -> Vec<&mut [Cell<T>]> {
        debug_assert_eq!(ranges.first().map(|r| r.start), Some(0));
        debug_assert_eq!(ranges.last().map(|r| r.end), Some(self.columns));

        let rows = self.rows;
        let mut rest: &mut [Cell<T>] = &mut self.cells;
        let mut chunks = Vec::with_capacity(ranges.len());
        for range in ranges {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * rows);
            chunks.push(head);
            rest = tail;
        }
        chunks
    }
}
