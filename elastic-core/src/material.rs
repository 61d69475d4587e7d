//! Material property definitions.
//!
//! Isotropic linear elastic materials described by density, bulk and shear
//! modulus. All constants are plain scalars in one consistent unit system;
//! unit conversion happens before they reach this crate.

use crate::error::{Error, Result};
use crate::types::{StressTensor, Tensor};

/// Immutable material description.
///
/// A zero density is valid and marks a massless region (e.g. air) that the
/// solver never accelerates.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    density: f64,
    yield_strength: f64,
    bulk_modulus: f64,
    shear_modulus: f64,
}

impl Material {
    /// Create a new isotropic linear elastic material.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name
    /// * `density` - Mass density ρ
    /// * `yield_strength` - Equivalent stress at which the material yields
    /// * `bulk_modulus` - Bulk modulus K
    /// * `shear_modulus` - Shear modulus μ
    ///
    /// # Errors
    ///
    /// Returns error if any constant is negative or not finite.
    pub fn new(
        name: impl Into<String>,
        density: f64,
        yield_strength: f64,
        bulk_modulus: f64,
        shear_modulus: f64,
    ) -> Result<Self> {
        let name = name.into();
        for (label, value) in [
            ("density", density),
            ("yield strength", yield_strength),
            ("bulk modulus", bulk_modulus),
            ("shear modulus", shear_modulus),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidMaterial(format!(
                    "{} of '{}' must be finite and non-negative, got {}",
                    label, name, value
                )));
            }
        }
        Ok(Self {
            name,
            density,
            yield_strength,
            bulk_modulus,
            shear_modulus,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn yield_strength(&self) -> f64 {
        self.yield_strength
    }

    pub fn bulk_modulus(&self) -> f64 {
        self.bulk_modulus
    }

    pub fn shear_modulus(&self) -> f64 {
        self.shear_modulus
    }

    /// Whether the material carries mass.
    pub fn has_inertia(&self) -> bool {
        self.density > 0.0
    }

    /// Lamé's first parameter λ = K − (2/3)μ.
    pub fn lame_lambda(&self) -> f64 {
        self.bulk_modulus - (2.0 / 3.0) * self.shear_modulus
    }

    /// Lamé's second parameter μ (shear modulus).
    pub fn lame_mu(&self) -> f64 {
        self.shear_modulus
    }

    /// Isotropic linear constitutive law σ = 2μ·ε + λ·tr(ε)·I.
    ///
    /// The off-diagonal stress is built from both strain shear components,
    /// so the result is symmetric even for an asymmetric input.
    pub fn stress(&self, strain: &Tensor) -> StressTensor {
        let mu = self.lame_mu();
        let lambda = self.lame_lambda();
        let volumetric = lambda * strain.trace();
        StressTensor::new(
            2.0 * mu * strain.xx() + volumetric,
            mu * (strain.xy() + strain.yx()),
            2.0 * mu * strain.yy() + volumetric,
        )
    }

    /// P-wave speed sqrt((K + 4μ/3) / ρ); zero for massless materials.
    pub fn p_wave_speed(&self) -> f64 {
        if !self.has_inertia() {
            return 0.0;
        }
        ((self.bulk_modulus + (4.0 / 3.0) * self.shear_modulus) / self.density).sqrt()
    }

    /// Whether `stress` reaches the yield strength (von Mises).
    ///
    /// Materials with zero yield strength never report yielding.
    pub fn yields(&self, stress: &StressTensor) -> bool {
        self.yield_strength > 0.0 && stress.von_mises() >= self.yield_strength
    }
}

/// Common material presets.
impl Material {
    /// Massless void: every constant zero.
    pub fn air() -> Self {
        Self {
            name: "air".to_string(),
            density: 0.0,
            yield_strength: 0.0,
            bulk_modulus: 0.0,
            shear_modulus: 0.0,
        }
    }

    /// Steel (ρ = 8000, σ_y = 250, K = 140000, μ = 75000).
    pub fn steel() -> Self {
        Self {
            name: "steel".to_string(),
            density: 8000.0,
            yield_strength: 250.0,
            bulk_modulus: 140000.0,
            shear_modulus: 75000.0,
        }
    }
}
