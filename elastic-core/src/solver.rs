//! Explicit time integration of 2D linear elastodynamics.
//!
//! [`LinearElasticity`] owns six co-registered grids (material, external
//! force, displacement, velocity, strain, stress) and advances them one time
//! step at a time through four strictly ordered phases:
//!
//! 1. displacement += velocity · dt (velocity from before this step)
//! 2. velocity += acceleration · dt, with a = (∇·σ + f) / ρ, or 0 where ρ = 0
//! 3. strain = ½(∇u + ∇uᵀ)
//! 4. stress = 2μ·ε + λ·tr(ε)·I
//!
//! Phases 2 and 3 run on the [`ColumnDispatcher`]; phases 1 and 4 are
//! pointwise and run on the calling thread. No phase starts before the
//! previous one has been published for every cell.

use crate::config::SimulationConfig;
use crate::dispatch::ColumnDispatcher;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::material::Material;
use crate::operators::{symmetric_gradient, tensor_divergence, vector_divergence, vector_gradient};
use crate::types::{StressTensor, Tensor, Vec2};
use log::{debug, info, trace, warn};

/// Acceleration of the cell at `(x, y)` from the current stress and force.
///
/// Massless cells never accelerate.
fn acceleration_at(
    materials: &Grid<Material>,
    forces: &Grid<Vec2>,
    stress: &Grid<StressTensor>,
    dx: f64,
    x: usize,
    y: usize,
) -> Option<Vec2> {
    let material = materials.value(x, y)?;
    if !material.has_inertia() {
        return Some(Vec2::zeros());
    }
    let divergence = tensor_divergence(stress, dx, x, y)?;
    let force = forces.value(x, y)?;
    Some((divergence + force) / material.density())
}

/// Linear elasticity PDE state and explicit stepper.
#[derive(Debug)]
pub struct LinearElasticity {
    config: SimulationConfig,
    materials: Grid<Material>,
    forces: Grid<Vec2>,
    displacement: Grid<Vec2>,
    velocity: Grid<Vec2>,
    strain: Grid<Tensor>,
    stress: Grid<StressTensor>,
    dispatcher: ColumnDispatcher,
    current_time: f64,
    steps_taken: usize,
}

impl LinearElasticity {
    /// Create a solver at rest from material and force distributions.
    ///
    /// Displacement, velocity, strain and stress start at zero.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `config` does not validate
    /// - [`Error::TopologyMismatch`] if either grid differs from
    ///   `config.grid_dimensions()`
    /// - [`Error::ThreadPool`] if the worker pool cannot be started
    pub fn new(
        config: SimulationConfig,
        materials: Grid<Material>,
        forces: Grid<Vec2>,
    ) -> Result<Self> {
        config.validate()?;

        let (columns, rows) = config.grid_dimensions();
        if materials.columns() != columns || materials.rows() != rows {
            return Err(Error::TopologyMismatch(format!(
                "material grid is {}x{}, configuration requires {}x{}",
                materials.columns(),
                materials.rows(),
                columns,
                rows
            )));
        }
        if !forces.same_topology(&materials) {
            return Err(Error::TopologyMismatch(format!(
                "force grid is {}x{}, material grid is {}x{}",
                forces.columns(),
                forces.rows(),
                columns,
                rows
            )));
        }

        let dispatcher = ColumnDispatcher::new(config.workers)?;
        let solver = Self {
            displacement: materials.map(|_| Vec2::zeros()),
            velocity: materials.map(|_| Vec2::zeros()),
            strain: materials.map(|_| Tensor::zero()),
            stress: materials.map(|_| StressTensor::zero()),
            config,
            materials,
            forces,
            dispatcher,
            current_time: 0.0,
            steps_taken: 0,
        };

        let cfl = solver.cfl_number();
        if cfl > 1.0 {
            warn!(
                "CFL number {:.3} > 1 (dt = {}, dx = {}); explicit integration is likely unstable",
                cfl, solver.config.dt, solver.config.dx
            );
        }
        Ok(solver)
    }

    /// Create a solver by evaluating `material_at(x, y)` and `force_at(x, y)`
    /// over the grid described by `config`.
    pub fn build(
        config: SimulationConfig,
        material_at: impl FnMut(usize, usize) -> Material,
        force_at: impl FnMut(usize, usize) -> Vec2,
    ) -> Result<Self> {
        config.validate()?;
        let (columns, rows) = config.grid_dimensions();
        let materials = Grid::new(columns, rows, material_at)?;
        let forces = Grid::new(columns, rows, force_at)?;
        Self::new(config, materials, forces)
    }

    /// Advance all fields by one time step.
    ///
    /// A zero time step advances nothing and leaves every grid untouched.
    pub fn step(&mut self) {
        if self.config.dt != 0.0 {
            trace!("step {}: displacement", self.steps_taken + 1);
            self.update_displacement();
            trace!("step {}: velocity", self.steps_taken + 1);
            self.update_velocity();
            trace!("step {}: strain", self.steps_taken + 1);
            self.update_strain();
            trace!("step {}: stress", self.steps_taken + 1);
            self.update_stress();
        }

        self.current_time += self.config.dt;
        self.steps_taken += 1;
        debug!("completed step {} (t = {})", self.steps_taken, self.current_time);
    }

    /// Advance `steps` time steps.
    pub fn run_steps(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Run the configured number of steps, returning how many were taken.
    pub fn run(&mut self) -> usize {
        let steps = self.config.total_steps();
        info!(
            "running {} steps on {}x{} cells (dt = {}, dx = {}, workers = {})",
            steps,
            self.materials.columns(),
            self.materials.rows(),
            self.config.dt,
            self.config.dx,
            self.dispatcher.workers()
        );
        self.run_steps(steps);
        info!("finished at t = {} after {} steps", self.current_time, self.steps_taken);
        steps
    }

    /// Phase 1: u += v·dt.
    fn update_displacement(&mut self) {
        let dt = self.config.dt;
        for (u, v) in self.displacement.iter_mut().zip(self.velocity.iter()) {
            *u.data_mut() += *v.data() * dt;
        }
    }

    /// Phase 2: v += a·dt, reading the stress published by the previous step.
    fn update_velocity(&mut self) {
        let (dt, dx) = (self.config.dt, self.config.dx);
        let (materials, forces, stress) = (&self.materials, &self.forces, &self.stress);
        self.velocity = self.dispatcher.evolve(&self.velocity, |x, y, v| {
            // Coordinates come from the grid itself, so the lookup cannot miss
            let a = acceleration_at(materials, forces, stress, dx, x, y)
                .unwrap_or_else(Vec2::zeros);
            *v + a * dt
        });
    }

    /// Phase 3: ε = ½(∇u + ∇uᵀ), reading the displacement from phase 1.
    fn update_strain(&mut self) {
        let dx = self.config.dx;
        let displacement = &self.displacement;
        self.strain = self.dispatcher.evolve(&self.strain, |x, y, old| {
            symmetric_gradient(displacement, dx, x, y).unwrap_or(*old)
        });
    }

    /// Phase 4: σ from ε through each cell's constitutive law.
    fn update_stress(&mut self) {
        let cells = self
            .stress
            .iter_mut()
            .zip(self.strain.iter())
            .zip(self.materials.iter());
        for ((sigma, eps), material) in cells {
            sigma.set(material.data().stress(eps.data()));
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulated time after the completed steps.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Worker threads used by the parallel phases.
    pub fn workers(&self) -> usize {
        self.dispatcher.workers()
    }

    pub fn columns(&self) -> usize {
        self.materials.columns()
    }

    pub fn rows(&self) -> usize {
        self.materials.rows()
    }

    pub fn material(&self, x: usize, y: usize) -> Option<&Material> {
        self.materials.value(x, y)
    }

    pub fn external_force(&self, x: usize, y: usize) -> Option<&Vec2> {
        self.forces.value(x, y)
    }

    /// Instantaneous acceleration (∇·σ + f) / ρ from the current state.
    pub fn acceleration(&self, x: usize, y: usize) -> Option<Vec2> {
        acceleration_at(&self.materials, &self.forces, &self.stress, self.config.dx, x, y)
    }

    pub fn displacement(&self, x: usize, y: usize) -> Option<&Vec2> {
        self.displacement.value(x, y)
    }

    pub fn velocity(&self, x: usize, y: usize) -> Option<&Vec2> {
        self.velocity.value(x, y)
    }

    pub fn strain(&self, x: usize, y: usize) -> Option<&Tensor> {
        self.strain.value(x, y)
    }

    pub fn stress(&self, x: usize, y: usize) -> Option<&StressTensor> {
        self.stress.value(x, y)
    }

    pub fn materials(&self) -> &Grid<Material> {
        &self.materials
    }

    pub fn forces(&self) -> &Grid<Vec2> {
        &self.forces
    }

    pub fn displacements(&self) -> &Grid<Vec2> {
        &self.displacement
    }

    pub fn velocities(&self) -> &Grid<Vec2> {
        &self.velocity
    }

    pub fn strains(&self) -> &Grid<Tensor> {
        &self.strain
    }

    pub fn stresses(&self) -> &Grid<StressTensor> {
        &self.stress
    }

    /// Impose an initial displacement at `(x, y)`.
    ///
    /// Strain and stress are not recomputed until the next step.
    pub fn set_displacement(&mut self, x: usize, y: usize, value: Vec2) -> Result<()> {
        self.displacement.replace(x, y, value).map(|_| ())
    }

    /// Impose an initial velocity at `(x, y)`.
    pub fn set_velocity(&mut self, x: usize, y: usize, value: Vec2) -> Result<()> {
        self.velocity.replace(x, y, value).map(|_| ())
    }

    /// Displacement gradient ∇u at `(x, y)`.
    pub fn displacement_gradient(&self, x: usize, y: usize) -> Option<Tensor> {
        vector_gradient(&self.displacement, self.config.dx, x, y)
    }

    /// Displacement divergence ∇·u (volumetric strain) at `(x, y)`.
    pub fn displacement_divergence(&self, x: usize, y: usize) -> Option<f64> {
        vector_divergence(&self.displacement, self.config.dx, x, y)
    }

    /// Stress divergence ∇·σ at `(x, y)`.
    pub fn stress_divergence(&self, x: usize, y: usize) -> Option<Vec2> {
        tensor_divergence(&self.stress, self.config.dx, x, y)
    }

    /// Total kinetic energy Σ ½ρ|v|²·dx² per unit thickness.
    pub fn kinetic_energy(&self) -> f64 {
        let area = self.config.dx * self.config.dx;
        self.materials
            .iter()
            .zip(self.velocity.iter())
            .map(|(m, v)| 0.5 * m.data().density() * v.data().norm_squared() * area)
            .sum()
    }

    /// CFL number dt · c_max / dx with c_max the largest P-wave speed.
    pub fn cfl_number(&self) -> f64 {
        let c_max = self
            .materials
            .iter()
            .map(|m| m.data().p_wave_speed())
            .fold(0.0, f64::max);
        self.config.dt * c_max / self.config.dx
    }

    /// Cells whose stress reaches their material's yield strength.
    pub fn yielded_cells(&self) -> Vec<(usize, usize)> {
        self.stress
            .iter()
            .zip(self.materials.iter())
            .filter(|(sigma, material)| material.data().yields(sigma.data()))
            .map(|(sigma, _)| sigma.position())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_material() -> Material {
        Material::new("unit", 2.0, 0.0, 3.0, 1.5).unwrap()
    }

    #[test]
    fn test_new_starts_at_rest() {
        let config = SimulationConfig::for_grid(4, 3, 0.5, 0.01);
        let solver =
            LinearElasticity::build(config, |_, _| unit_material(), |_, _| Vec2::zeros()).unwrap();
        assert_eq!(solver.columns(), 4);
        assert_eq!(solver.rows(), 3);
        assert_eq!(solver.current_time(), 0.0);
        assert!(solver.displacements().iter().all(|c| *c.data() == Vec2::zeros()));
        assert!(solver.stresses().iter().all(|c| *c.data() == StressTensor::zero()));
        assert!(solver.displacements().same_topology(solver.materials()));
    }

    #[test]
    fn test_topology_mismatch() {
        let config = SimulationConfig::for_grid(4, 3, 0.5, 0.01);
        let materials = Grid::filled(4, 3, unit_material()).unwrap();
        let forces = Grid::filled(3, 3, Vec2::zeros()).unwrap();
        let err = LinearElasticity::new(config.clone(), materials, forces).unwrap_err();
        assert!(matches!(err, Error::TopologyMismatch(_)));

        let materials = Grid::filled(5, 3, unit_material()).unwrap();
        let forces = Grid::filled(5, 3, Vec2::zeros()).unwrap();
        let err = LinearElasticity::new(config, materials, forces).unwrap_err();
        assert!(matches!(err, Error::TopologyMismatch(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimulationConfig {
            dx: -0.5,
            ..SimulationConfig::default()
        };
        let result = LinearElasticity::build(config, |_, _| unit_material(), |_, _| Vec2::zeros());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let config = SimulationConfig {
            length: 1e30,
            height: 1e30,
            dx: 1.0,
            ..SimulationConfig::default()
        };
        let result = LinearElasticity::build(config, |_, _| unit_material(), |_, _| Vec2::zeros());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_massless_cell_never_accelerates() {
        let config = SimulationConfig::for_grid(3, 3, 1.0, 0.1);
        let solver = LinearElasticity::build(
            config,
            |x, _| if x == 1 { Material::air() } else { unit_material() },
            |_, _| Vec2::new(0.0, -10.0),
        )
        .unwrap();
        assert_eq!(solver.acceleration(1, 1), Some(Vec2::zeros()));
        let a = solver.acceleration(0, 1).unwrap();
        assert_relative_eq!(a.y, -5.0);
        assert!(solver.acceleration(3, 0).is_none());
    }

    #[test]
    fn test_displacement_updates_before_velocity() {
        let (dt, g) = (0.1, Vec2::new(0.0, -4.0));
        let config = SimulationConfig::for_grid(3, 3, 1.0, dt);
        let mut solver =
            LinearElasticity::build(config, |_, _| unit_material(), |_, _| g * 2.0).unwrap();

        // Step 1: u uses v = 0, then v = g·dt
        solver.step();
        let u = solver.displacement(1, 1).unwrap();
        let v = solver.velocity(1, 1).unwrap();
        assert_eq!(*u, Vec2::zeros());
        assert_relative_eq!(v.y, g.y * dt, epsilon = 1e-12);

        // Step 2: u = g·dt², v = 2g·dt (uniform fields carry no stress)
        solver.step();
        let u = solver.displacement(1, 1).unwrap();
        let v = solver.velocity(1, 1).unwrap();
        assert_relative_eq!(u.y, g.y * dt * dt, epsilon = 1e-12);
        assert_relative_eq!(v.y, 2.0 * g.y * dt, epsilon = 1e-12);
        assert_eq!(*solver.stress(1, 1).unwrap(), StressTensor::zero());
        assert_relative_eq!(solver.current_time(), 2.0 * dt, epsilon = 1e-15);
        assert_eq!(solver.steps_taken(), 2);
    }

    #[test]
    fn test_velocity_reads_stress_from_previous_step() {
        let dt = 0.1;
        let config = SimulationConfig::for_grid(5, 5, 1.0, dt);
        let density = unit_material().density();
        let mut solver =
            LinearElasticity::build(config, |_, _| unit_material(), |_, _| Vec2::zeros()).unwrap();

        // Quadratic field: its stress has non-zero divergence
        for x in 0..5 {
            for y in 0..5 {
                let (px, py) = (x as f64, y as f64);
                solver.set_displacement(x, y, Vec2::new(1e-3 * px * px, 5e-4 * py * py)).unwrap();
            }
        }

        // Step 1: velocity sees the zero stress held before the step
        solver.step();
        assert!(solver.velocities().iter().all(|c| *c.data() == Vec2::zeros()));
        assert!(solver.stresses().iter().any(|c| *c.data() != StressTensor::zero()));

        let divergence = Grid::new(5, 5, |x, y| solver.stress_divergence(x, y).unwrap()).unwrap();
        assert!(divergence.iter().any(|c| *c.data() != Vec2::zeros()));

        // Step 2: velocity is driven by the stress published by step 1
        solver.step();
        for cell in divergence.iter() {
            let (x, y) = cell.position();
            let v = solver.velocity(x, y).unwrap();
            let expected = *cell.data() / density * dt;
            assert_relative_eq!(v.x, expected.x, epsilon = 1e-15);
            assert_relative_eq!(v.y, expected.y, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_strain_and_stress_from_imposed_displacement() {
        let (dx, e) = (0.5, 1e-3);
        let config = SimulationConfig::for_grid(4, 4, dx, 1e-3);
        let material = unit_material();
        let mut solver =
            LinearElasticity::build(config, |_, _| material.clone(), |_, _| Vec2::zeros()).unwrap();

        // Uniaxial stretch u = (e·x, 0)
        for x in 0..4 {
            for y in 0..4 {
                solver.set_displacement(x, y, Vec2::new(e * x as f64 * dx, 0.0)).unwrap();
            }
        }
        solver.step();

        for (x, y) in [(0, 0), (2, 1), (3, 3)] {
            let strain = solver.strain(x, y).unwrap();
            assert_relative_eq!(strain.xx(), e, epsilon = 1e-12);
            assert_relative_eq!(strain.yy(), 0.0, epsilon = 1e-12);
            assert_relative_eq!(strain.xy(), 0.0, epsilon = 1e-12);

            let stress = solver.stress(x, y).unwrap();
            let (mu, lambda) = (material.lame_mu(), material.lame_lambda());
            assert_relative_eq!(stress.xx(), (2.0 * mu + lambda) * e, epsilon = 1e-12);
            assert_relative_eq!(stress.yy(), lambda * e, epsilon = 1e-12);
        }
        assert_relative_eq!(solver.displacement_divergence(1, 1).unwrap(), e, epsilon = 1e-12);
        assert_relative_eq!(solver.displacement_gradient(1, 1).unwrap().xx(), e, epsilon = 1e-12);
    }

    #[test]
    fn test_set_outside_grid_fails() {
        let config = SimulationConfig::for_grid(2, 2, 1.0, 0.1);
        let mut solver =
            LinearElasticity::build(config, |_, _| unit_material(), |_, _| Vec2::zeros()).unwrap();
        assert!(matches!(
            solver.set_velocity(2, 0, Vec2::zeros()),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(solver.displacement(0, 2).is_none());
        assert!(solver.stress_divergence(5, 5).is_none());
    }

    #[test]
    fn test_run_uses_configured_steps() {
        let config = SimulationConfig {
            length: 2.0,
            height: 2.0,
            dx: 1.0,
            dt: 0.1,
            total_time: 0.5,
            workers: 2,
        };
        let mut solver =
            LinearElasticity::build(config, |_, _| unit_material(), |_, _| Vec2::zeros()).unwrap();
        assert_eq!(solver.run(), 5);
        assert_eq!(solver.steps_taken(), 5);
        assert_relative_eq!(solver.current_time(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_kinetic_energy_and_cfl() {
        let config = SimulationConfig::for_grid(2, 2, 0.5, 0.1);
        let mut solver =
            LinearElasticity::build(config, |_, _| unit_material(), |_, _| Vec2::zeros()).unwrap();
        assert_eq!(solver.kinetic_energy(), 0.0);

        solver.set_velocity(0, 0, Vec2::new(3.0, 4.0)).unwrap();
        // ½ · 2 · 25 · 0.25
        assert_relative_eq!(solver.kinetic_energy(), 6.25, epsilon = 1e-12);

        let c = unit_material().p_wave_speed();
        assert_relative_eq!(solver.cfl_number(), 0.1 * c / 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_yielded_cells() {
        let config = SimulationConfig::for_grid(3, 1, 1.0, 1.0);
        let weak = Material::new("weak", 1.0, 1e-6, 10.0, 10.0).unwrap();
        let mut solver =
            LinearElasticity::build(config, |_, _| weak.clone(), |_, _| Vec2::zeros()).unwrap();
        assert!(solver.yielded_cells().is_empty());

        solver.set_displacement(2, 0, Vec2::new(1.0, 0.0)).unwrap();
        solver.step();
        let yielded = solver.yielded_cells();
        assert!(yielded.contains(&(2, 0)));
        assert!(yielded.contains(&(1, 0)));
    }
}
