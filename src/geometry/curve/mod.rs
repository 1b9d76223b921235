mod arc;
mod segment;

pub use arc::Arc;
pub use segment::Segment;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

/// Parameter domain for a curve.
///
/// Domains are finite: the proximity solver sweeps them densely, so a curve
/// must bound its own parameter range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveDomain {
    /// Start of the parameter range.
    pub t_min: f64,
    /// End of the parameter range.
    pub t_max: f64,
}

impl CurveDomain {
    /// Creates a new curve domain.
    #[must_use]
    pub fn new(t_min: f64, t_max: f64) -> Self {
        Self { t_min, t_max }
    }

    /// Returns the length of the parameter range.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.t_max - self.t_min
    }

    /// Clamps a parameter into the domain.
    #[must_use]
    pub fn clamp(&self, t: f64) -> f64 {
        t.clamp(self.t_min, self.t_max)
    }
}

/// Trait for bounded parametric curves in 3D space.
pub trait Curve: std::fmt::Debug {
    /// Evaluates the curve at parameter `t`, returning the 3D point.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn evaluate(&self, t: f64) -> Result<Point3>;

    /// Computes the first derivative `dP/dt` at parameter `t`.
    ///
    /// The result is not normalized; use [`Curve::tangent`] for a unit
    /// direction.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn derivative(&self, t: f64) -> Result<Vector3>;

    /// Returns the parameter domain of the curve.
    fn domain(&self) -> CurveDomain;

    /// Returns whether the curve is closed (start and end coincide).
    fn is_closed(&self) -> bool;

    /// Computes the unit tangent vector at parameter `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the derivative is degenerate at `t`.
    fn tangent(&self, t: f64) -> Result<Vector3> {
        let d = self.derivative(t)?;
        let len = d.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(d / len)
    }
}
