//! Core data types for the elasticity kernel.
//!
//! This module defines the value types carried by grid cells:
//! - 2D vectors (displacement, velocity, force)
//! - General rank-2 tensors (displacement gradient, strain)
//! - Symmetric stress tensors with invariants and deviatoric decomposition

use crate::error::{Error, Result};
use nalgebra::{Matrix2, Vector2};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A 2D vector (displacement, velocity, force, ...).
pub type Vec2 = Vector2<f64>;

/// General 2x2 tensor.
///
/// Component layout:
///
/// ```text
/// [xx, xy]
/// [yx, yy]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tensor(pub Matrix2<f64>);

impl Tensor {
    /// Create a tensor from its four components in row-major order.
    pub fn new(xx: f64, xy: f64, yx: f64, yy: f64) -> Self {
        Self(Matrix2::new(xx, xy, yx, yy))
    }

    /// Zero tensor.
    pub fn zero() -> Self {
        Self(Matrix2::zeros())
    }

    /// Identity tensor.
    pub fn identity() -> Self {
        Self(Matrix2::identity())
    }

    pub fn xx(&self) -> f64 {
        self.0[(0, 0)]
    }

    pub fn xy(&self) -> f64 {
        self.0[(0, 1)]
    }

    pub fn yx(&self) -> f64 {
        self.0[(1, 0)]
    }

    pub fn yy(&self) -> f64 {
        self.0[(1, 1)]
    }

    pub fn transpose(&self) -> Self {
        Self(self.0.transpose())
    }

    /// Sum of the diagonal components.
    pub fn trace(&self) -> f64 {
        self.xx() + self.yy()
    }

    pub fn determinant(&self) -> f64 {
        self.xx() * self.yy() - self.xy() * self.yx()
    }

    /// Symmetric part ½(T + Tᵀ).
    ///
    /// The off-diagonal sum is commutative, so the result is exactly
    /// symmetric in floating point.
    pub fn symmetric_part(&self) -> Self {
        0.5 * (*self + self.transpose())
    }

    /// Exact component test xy == yx.
    pub fn is_symmetric(&self) -> bool {
        self.xy() == self.yx()
    }
}

impl Default for Tensor {
    fn default() -> Self {
        Self::zero()
    }
}

impl AsRef<Tensor> for Tensor {
    fn as_ref(&self) -> &Tensor {
        self
    }
}

impl Add for Tensor {
    type Output = Tensor;

    fn add(self, rhs: Tensor) -> Tensor {
        Tensor(self.0 + rhs.0)
    }
}

impl AddAssign for Tensor {
    fn add_assign(&mut self, rhs: Tensor) {
        self.0 += rhs.0;
    }
}

impl Sub for Tensor {
    type Output = Tensor;

    fn sub(self, rhs: Tensor) -> Tensor {
        Tensor(self.0 - rhs.0)
    }
}

impl Neg for Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        Tensor(-self.0)
    }
}

impl Mul<f64> for Tensor {
    type Output = Tensor;

    fn mul(self, rhs: f64) -> Tensor {
        Tensor(self.0 * rhs)
    }
}

impl Mul<Tensor> for f64 {
    type Output = Tensor;

    fn mul(self, rhs: Tensor) -> Tensor {
        rhs * self
    }
}

/// Matrix product.
impl Mul for Tensor {
    type Output = Tensor;

    fn mul(self, rhs: Tensor) -> Tensor {
        Tensor(self.0 * rhs.0)
    }
}

/// Matrix-vector product.
impl Mul<Vec2> for Tensor {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        self.0 * rhs
    }
}

/// Stress invariants of a 2D stress state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressInvariants {
    /// I₁ = σxx + σyy.
    pub first: f64,
    /// I₂ = σxx·σyy − σxy².
    pub second: f64,
    /// I₃ = det σ. Coincides with I₂ for a symmetric 2x2 tensor.
    pub third: f64,
}

/// Symmetric 2D stress tensor (σxy == σyx).
///
/// The symmetry constraint is enforced at construction: [`StressTensor::new`]
/// takes only the three independent components and
/// [`StressTensor::from_tensor`] rejects asymmetric input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressTensor(Tensor);

impl StressTensor {
    /// Create a stress tensor from its independent components.
    pub fn new(xx: f64, xy: f64, yy: f64) -> Self {
        Self(Tensor::new(xx, xy, xy, yy))
    }

    /// Zero stress state.
    pub fn zero() -> Self {
        Self(Tensor::zero())
    }

    /// Unit isotropic stress.
    pub fn identity() -> Self {
        Self(Tensor::identity())
    }

    /// Convert a general tensor, failing unless xy == yx exactly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AsymmetricTensor`] if the off-diagonal components differ
    /// (including when either is NaN).
    pub fn from_tensor(tensor: Tensor) -> Result<Self> {
        if !tensor.is_symmetric() {
            return Err(Error::AsymmetricTensor {
                xy: tensor.xy(),
                yx: tensor.yx(),
            });
        }
        Ok(Self(tensor))
    }

    pub fn xx(&self) -> f64 {
        self.0.xx()
    }

    pub fn xy(&self) -> f64 {
        self.0.xy()
    }

    pub fn yy(&self) -> f64 {
        self.0.yy()
    }

    /// View as a general tensor.
    pub fn as_tensor(&self) -> &Tensor {
        &self.0
    }

    pub fn trace(&self) -> f64 {
        self.0.trace()
    }

    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// Compute (I₁, I₂, I₃).
    pub fn invariants(&self) -> StressInvariants {
        StressInvariants {
            first: self.trace(),
            second: self.xx() * self.yy() - self.xy().powi(2),
            third: self.determinant(),
        }
    }

    /// Mean normal stress, taking the out-of-plane component as zero.
    pub fn mean_stress(&self) -> f64 {
        self.trace() / 3.0
    }

    /// Deviatoric part s = σ − p·I with p the mean stress.
    pub fn deviator(&self) -> StressTensor {
        *self - self.mean_stress() * StressTensor::identity()
    }

    /// Plane-stress von Mises equivalent stress.
    pub fn von_mises(&self) -> f64 {
        let (s_xx, s_yy, t_xy) = (self.xx(), self.yy(), self.xy());
        (s_xx * s_xx - s_xx * s_yy + s_yy * s_yy + 3.0 * t_xy * t_xy).sqrt()
    }

    /// Traction vector t = σ·n on a surface with normal `normal`.
    pub fn traction(&self, normal: &Vec2) -> Vec2 {
        self.0 * *normal
    }
}

impl Default for StressTensor {
    fn default() -> Self {
        Self::zero()
    }
}

impl AsRef<Tensor> for StressTensor {
    fn as_ref(&self) -> &Tensor {
        &self.0
    }
}

impl From<StressTensor> for Tensor {
    fn from(stress: StressTensor) -> Tensor {
        stress.0
    }
}

impl TryFrom<Tensor> for StressTensor {
    type Error = Error;

    fn try_from(tensor: Tensor) -> Result<Self> {
        Self::from_tensor(tensor)
    }
}

impl Add for StressTensor {
    type Output = StressTensor;

    fn add(self, rhs: StressTensor) -> StressTensor {
        StressTensor(self.0 + rhs.0)
    }
}

impl Sub for StressTensor {
    type Output = StressTensor;

    fn sub(self, rhs: StressTensor) -> StressTensor {
        StressTensor(self.0 - rhs.0)
    }
}

impl Neg for StressTensor {
    type Output = StressTensor;

    fn neg(self) -> StressTensor {
        StressTensor(-self.0)
    }
}

impl Mul<f64> for StressTensor {
    type Output = StressTensor;

    fn mul(self, rhs: f64) -> StressTensor {
        StressTensor(self.0 * rhs)
    }
}

impl Mul<StressTensor> for f64 {
    type Output = StressTensor;

    fn mul(self, rhs: StressTensor) -> StressTensor {
        rhs * self
    }
}
