mod cylinder;
mod plane;

pub use cylinder::Cylinder;
pub use plane::Plane;

use crate::error::Result;
use crate::math::{Point3, Vector3};

/// Parameter domain for a surface.
///
/// Domains are finite: the proximity solver seeds itself from a dense grid
/// over the domain, so a surface must bound both parameter ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDomain {
    /// Start of the U parameter range.
    pub u_min: f64,
    /// End of the U parameter range.
    pub u_max: f64,
    /// Start of the V parameter range.
    pub v_min: f64,
    /// End of the V parameter range.
    pub v_max: f64,
}

impl SurfaceDomain {
    /// Creates a new surface domain.
    #[must_use]
    pub fn new(u_min: f64, u_max: f64, v_min: f64, v_max: f64) -> Self {
        Self {
            u_min,
            u_max,
            v_min,
            v_max,
        }
    }

    /// Returns the length of the U parameter range.
    #[must_use]
    pub fn u_span(&self) -> f64 {
        self.u_max - self.u_min
    }

    /// Returns the length of the V parameter range.
    #[must_use]
    pub fn v_span(&self) -> f64 {
        self.v_max - self.v_min
    }
}

/// Trait for bounded parametric surfaces in 3D space.
pub trait Surface: std::fmt::Debug {
    /// Evaluates the surface at parameters `(u, v)`, returning the 3D point.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3>;

    /// Computes the surface normal at parameters `(u, v)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is degenerate at `(u, v)`.
    fn normal(&self, u: f64, v: f64) -> Result<Vector3>;

    /// Returns the parameter domain of the surface.
    fn domain(&self) -> SurfaceDomain;

    /// Returns whether the surface wraps around in the U direction.
    fn is_closed_u(&self) -> bool {
        false
    }

    /// Returns whether the surface wraps around in the V direction.
    fn is_closed_v(&self) -> bool {
        false
    }
}
