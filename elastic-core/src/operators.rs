//! Finite-difference differential operators on structured grids.
//!
//! All operators share one stencil policy:
//! - interior points: second-order central difference `(f[+1] - f[-1]) / (2·dx)`
//! - first index along the axis: forward difference `(f[+1] - f[0]) / dx`
//! - last index along the axis: backward difference `(f[0] - f[-1]) / dx`
//!
//! The first-order edges lose accuracy at the boundary; this is the accepted
//! approximation, not something to correct locally.
//!
//! Operators read neighbours straight from the source grid through
//! [`Grid::offset`] instead of materialising per-component auxiliary grids.
//! They return `None` only when `(x, y)` itself lies outside the grid.

use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::types::{Tensor, Vec2};
use std::fmt;
use std::str::FromStr;

/// Differentiation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Along columns (x index).
    X,
    /// Along rows (y index).
    Y,
}

impl Axis {
    /// Unit grid offset along this axis.
    fn step(self) -> (isize, isize) {
        match self {
            Axis::X => (1, 0),
            Axis::Y => (0, 1),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            other => Err(Error::InvalidAxis(other.to_string())),
        }
    }
}

impl TryFrom<char> for Axis {
    type Error = Error;

    fn try_from(c: char) -> Result<Self> {
        match c {
            'x' => Ok(Axis::X),
            'y' => Ok(Axis::Y),
            other => Err(Error::InvalidAxis(other.to_string())),
        }
    }
}

/// Partial derivative of a scalar component extracted from each payload.
///
/// `component` maps a cell payload to the scalar being differentiated, so a
/// vector or tensor field can be differentiated component-wise without
/// copying it into a scalar grid first.
///
/// An axis with a single cell carries no resolvable variation and yields 0.
pub fn partial_derivative_by<T>(
    grid: &Grid<T>,
    dx: f64,
    x: usize,
    y: usize,
    axis: Axis,
    component: impl Fn(&T) -> f64,
) -> Option<f64> {
    let center = component(grid.value(x, y)?);
    let (index, end) = match axis {
        Axis::X => (x, grid.column_end()),
        Axis::Y => (y, grid.row_end()),
    };
    if end == 0 {
        return Some(0.0);
    }

    let (sx, sy) = axis.step();
    let ahead = || grid.offset(x, y, sx, sy).map(&component);
    let behind = || grid.offset(x, y, -sx, -sy).map(&component);

    let derivative = if index == 0 {
        (ahead()? - center) / dx
    } else if index == end {
        (center - behind()?) / dx
    } else {
        (ahead()? - behind()?) / (2.0 * dx)
    };
    Some(derivative)
}

/// Partial derivative of a scalar field along `axis` at `(x, y)`.
pub fn partial_derivative(
    grid: &Grid<f64>,
    dx: f64,
    x: usize,
    y: usize,
    axis: Axis,
) -> Option<f64> {
    partial_derivative_by(grid, dx, x, y, axis, |v| *v)
}

/// Gradient of a vector field at `(x, y)`.
///
/// Rows index the differentiated component, columns the axis:
///
/// ```text
/// [∂u_x/∂x, ∂u_x/∂y]
/// [∂u_y/∂x, ∂u_y/∂y]
/// ```
pub fn vector_gradient(grid: &Grid<Vec2>, dx: f64, x: usize, y: usize) -> Option<Tensor> {
    let d = |axis, component: fn(&Vec2) -> f64| {
        partial_derivative_by(grid, dx, x, y, axis, component)
    };
    Some(Tensor::new(
        d(Axis::X, |v: &Vec2| v.x)?,
        d(Axis::Y, |v: &Vec2| v.x)?,
        d(Axis::X, |v: &Vec2| v.y)?,
        d(Axis::Y, |v: &Vec2| v.y)?,
    ))
}

/// Divergence of a vector field: the trace of its gradient.
pub fn vector_divergence(grid: &Grid<Vec2>, dx: f64, x: usize, y: usize) -> Option<f64> {
    vector_gradient(grid, dx, x, y).map(|g| g.trace())
}

/// Small-strain tensor ½(∇u + ∇uᵀ) of a displacement field.
pub fn symmetric_gradient(grid: &Grid<Vec2>, dx: f64, x: usize, y: usize) -> Option<Tensor> {
    vector_gradient(grid, dx, x, y).map(|g| g.symmetric_part())
}

/// Divergence of a tensor field, taken row by row.
///
/// Returns `(∂σxx/∂x + ∂σxy/∂y, ∂σyx/∂x + ∂σyy/∂y)`.
pub fn tensor_divergence<T: AsRef<Tensor>>(
    grid: &Grid<T>,
    dx: f64,
    x: usize,
    y: usize,
) -> Option<Vec2> {
    let d = |axis, component: fn(&Tensor) -> f64| {
        partial_derivative_by(grid, dx, x, y, axis, |t: &T| component(t.as_ref()))
    };
    let div_x = d(Axis::X, Tensor::xx)? + d(Axis::Y, Tensor::xy)?;
    let div_y = d(Axis::X, Tensor::yx)? + d(Axis::Y, Tensor::yy)?;
    Some(Vec2::new(div_x, div_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StressTensor;
    use approx::assert_relative_eq;

    const DX: f64 = 0.5;

    fn scalar_field(columns: usize, rows: usize, f: impl Fn(f64, f64) -> f64) -> Grid<f64> {
        Grid::new(columns, rows, |x, y| f(x as f64 * DX, y as f64 * DX)).unwrap()
    }

    #[test]
    fn test_axis_parsing() {
        assert_eq!("x".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!("y".parse::<Axis>().unwrap(), Axis::Y);
        assert_eq!(Axis::try_from('y').unwrap(), Axis::Y);
        assert!(matches!("z".parse::<Axis>(), Err(Error::InvalidAxis(s)) if s == "z"));
        assert!(Axis::try_from('X').is_err());
        assert_eq!(Axis::X.to_string(), "x");
    }

    #[test]
    fn test_linear_field_exact_everywhere() {
        // f = 3x - 2y: central and one-sided differences are both exact
        let grid = scalar_field(5, 4, |x, y| 3.0 * x - 2.0 * y);
        for x in 0..5 {
            for y in 0..4 {
                let fx = partial_derivative(&grid, DX, x, y, Axis::X).unwrap();
                let fy = partial_derivative(&grid, DX, x, y, Axis::Y).unwrap();
                assert_relative_eq!(fx, 3.0, epsilon = 1e-12);
                assert_relative_eq!(fy, -2.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_boundary_stencils_are_one_sided() {
        // f = x² sampled at x = i·dx
        let grid = scalar_field(4, 1, |x, _| x * x);
        let n = 4.0;

        // Forward difference at the first column: (dx² - 0) / dx = dx
        let first = partial_derivative(&grid, DX, 0, 0, Axis::X).unwrap();
        assert_relative_eq!(first, DX, epsilon = 1e-12);

        // Backward difference at the last column: ((n-1)² - (n-2)²)·dx
        let last = partial_derivative(&grid, DX, 3, 0, Axis::X).unwrap();
        assert_relative_eq!(last, (2.0 * n - 3.0) * DX, epsilon = 1e-12);

        // Central difference is exact for a quadratic: 2x at x = dx
        let interior = partial_derivative(&grid, DX, 1, 0, Axis::X).unwrap();
        assert_relative_eq!(interior, 2.0 * DX, epsilon = 1e-12);
    }

    #[test]
    fn test_single_cell_axis_has_zero_derivative() {
        let grid = scalar_field(4, 1, |x, _| x);
        assert_eq!(partial_derivative(&grid, DX, 2, 0, Axis::Y), Some(0.0));
    }

    #[test]
    fn test_out_of_bounds_is_absent() {
        let grid = scalar_field(3, 3, |x, y| x + y);
        assert!(partial_derivative(&grid, DX, 3, 0, Axis::X).is_none());
        let vectors = Grid::filled(3, 3, Vec2::zeros()).unwrap();
        assert!(vector_gradient(&vectors, DX, 0, 7).is_none());
        assert!(vector_divergence(&vectors, DX, 9, 9).is_none());
        let tensors = Grid::filled(3, 3, Tensor::zero()).unwrap();
        assert!(tensor_divergence(&tensors, DX, 3, 3).is_none());
    }

    #[test]
    fn test_vector_gradient_convention() {
        // u = (a·x + b·y, c·x + d·y)
        let (a, b, c, d) = (1.5, -0.5, 2.0, 0.25);
        let grid = Grid::new(4, 4, |x, y| {
            let (px, py) = (x as f64 * DX, y as f64 * DX);
            Vec2::new(a * px + b * py, c * px + d * py)
        })
        .unwrap();

        for (x, y) in [(0, 0), (1, 2), (3, 3), (2, 0)] {
            let g = vector_gradient(&grid, DX, x, y).unwrap();
            assert_relative_eq!(g.xx(), a, epsilon = 1e-12);
            assert_relative_eq!(g.xy(), b, epsilon = 1e-12);
            assert_relative_eq!(g.yx(), c, epsilon = 1e-12);
            assert_relative_eq!(g.yy(), d, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_divergence_is_gradient_trace() {
        let grid = Grid::new(5, 4, |x, y| {
            let (px, py) = (x as f64, y as f64);
            Vec2::new(px * px * py, (px + 1.0).sin() * py * py)
        })
        .unwrap();

        for x in 0..5 {
            for y in 0..4 {
                let div = vector_divergence(&grid, DX, x, y).unwrap();
                let trace = vector_gradient(&grid, DX, x, y).unwrap().trace();
                assert_eq!(div, trace);
            }
        }
    }

    #[test]
    fn test_symmetric_gradient_of_rotation_vanishes() {
        // Rigid rotation u = (-y, x) has no strain
        let grid = Grid::new(3, 3, |x, y| Vec2::new(-(y as f64) * DX, x as f64 * DX)).unwrap();
        let strain = symmetric_gradient(&grid, DX, 1, 1).unwrap();
        assert_relative_eq!(strain.xx(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(strain.xy(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(strain.yx(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(strain.yy(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tensor_divergence_rows() {
        // σxx = 2x, σxy = 3y, σyx = -x, σyy = 5y
        let grid = Grid::new(4, 4, |x, y| {
            let (px, py) = (x as f64 * DX, y as f64 * DX);
            Tensor::new(2.0 * px, 3.0 * py, -px, 5.0 * py)
        })
        .unwrap();

        for (x, y) in [(0, 0), (1, 1), (3, 2)] {
            let div = tensor_divergence(&grid, DX, x, y).unwrap();
            assert_relative_eq!(div.x, 2.0 + 3.0, epsilon = 1e-12);
            assert_relative_eq!(div.y, -1.0 + 5.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tensor_divergence_of_stress_grid() {
        // Uniform stress has no divergence
        let grid = Grid::filled(3, 3, StressTensor::new(10.0, 4.0, -2.0)).unwrap();
        let div = tensor_divergence(&grid, DX, 1, 1).unwrap();
        assert_eq!(div, Vec2::zeros());
    }
}
