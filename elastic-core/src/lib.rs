//! Elastic Core - explicit finite-difference elastodynamics in 2D
//!
//! Time evolution of displacement, velocity, strain and stress for a
//! heterogeneous, linearly elastic medium on a structured grid:
//! - Generic structured grids with bounds-checked neighbour windows
//! - 2x2 tensor algebra with a symmetric stress specialisation
//! - Finite-difference gradient and divergence operators
//! - A four-phase explicit stepper with parallel column decomposition (Rayon)
//!
//! # Architecture
//!
//! The solver is designed around these core abstractions:
//!
//! - [`Grid`]: Fixed-size container of cells addressed by (column, row)
//! - [`Tensor`] / [`StressTensor`]: Rank-2 values carried by strain and stress grids
//! - [`operators`]: Stencils shared by every phase
//! - [`LinearElasticity`]: PDE state and time stepping
//! - [`ColumnDispatcher`]: Snapshot-read, partitioned-write parallel phases

pub mod types;
pub mod grid;
pub mod operators;
pub mod material;
pub mod dispatch;
pub mod config;
pub mod solver;
pub mod error;

pub use types::{StressInvariants, StressTensor, Tensor, Vec2};
pub use grid::{Cell, Grid, Neighborhood};
pub use operators::Axis;
pub use material::Material;
pub use dispatch::{partition_columns, ColumnDispatcher};
pub use config::SimulationConfig;
pub use solver::LinearElasticity;
pub use error::{Error, Result};
