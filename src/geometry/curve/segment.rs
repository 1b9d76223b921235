use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Curve, CurveDomain};

/// A straight line segment between two points.
///
/// The parametric form is `P(t) = start + t * (end - start)` over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Segment {
    start: Point3,
    end: Point3,
}

impl Segment {
    /// Creates a new segment from two endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints coincide (zero-length segment).
    pub fn new(start: Point3, end: Point3) -> Result<Self> {
        if (end - start).norm() < TOLERANCE {
            return Err(GeometryError::Degenerate("zero-length segment".into()).into());
        }
        Ok(Self { start, end })
    }

    /// Returns the start point.
    #[must_use]
    pub fn start(&self) -> &Point3 {
        &self.start
    }

    /// Returns the end point.
    #[must_use]
    pub fn end(&self) -> &Point3 {
        &self.end
    }

    /// Returns the segment length.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

impl Curve for Segment {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        Ok(self.start + (self.end - self.start) * t)
    }

    fn derivative(&self, _t: f64) -> Result<Vector3> {
        Ok(self.end - self.start)
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(0.0, 1.0)
    }

    fn is_closed(&self) -> bool {
        false
    }
}
