use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// A bounded cylindrical patch in 3D space.
///
/// Defined by a point on the axis, radius, axis direction, a reference
/// direction for `u = 0`, and an axial extent.
///
/// `P(u, v) = center + radius * cos(u) * ref_dir + radius * sin(u) * binormal + v * axis`
/// where `binormal = axis × ref_dir`. The `u` range is the full turn
/// `[0, 2π]`; `v` ranges over the axial extent.
#[derive(Debug, Clone)]
pub struct Cylinder {
    center: Point3,
    radius: f64,
    axis: Vector3,
    ref_dir: Vector3,
    v_min: f64,
    v_max: f64,
}

impl Cylinder {
    /// Creates a new cylindrical patch.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, the axis is
    /// zero-length, the reference direction is not perpendicular to the
    /// axis, or the axial extent is empty.
    pub fn new(
        center: Point3,
        radius: f64,
        axis: Vector3,
        ref_dir: Vector3,
        v_min: f64,
        v_max: f64,
    ) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("cylinder radius must be positive".into()).into(),
            );
        }
        if v_max - v_min < TOLERANCE {
            return Err(GeometryError::Degenerate("empty cylinder extent".into()).into());
        }

        let axis_len = axis.norm();
        if axis_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let axis = axis / axis_len;

        let ref_len = ref_dir.norm();
        if ref_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let ref_dir = ref_dir / ref_len;

        if axis.dot(&ref_dir).abs() > TOLERANCE {
            return Err(GeometryError::Degenerate(
                "reference direction must be perpendicular to axis".into(),
            )
            .into());
        }

        Ok(Self {
            center,
            radius,
            axis,
            ref_dir,
            v_min,
            v_max,
        })
    }

    /// Returns the point on the cylinder axis.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the unit axis direction.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    fn binormal(&self) -> Vector3 {
        self.axis.cross(&self.ref_dir)
    }
}

impl Surface for Cylinder {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        let radial = self.ref_dir * u.cos() + self.binormal() * u.sin();
        Ok(self.center + radial * self.radius + self.axis * v)
    }

    fn normal(&self, u: f64, _v: f64) -> Result<Vector3> {
        Ok(self.ref_dir * u.cos() + self.binormal() * u.sin())
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, TAU, self.v_min, self.v_max)
    }

    fn is_closed_u(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    const TOL: f64 = 1e-10;

    fn unit_cylinder() -> Cylinder {
        Cylinder::new(
            Point3::origin(),
            1.0,
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
            0.0,
            2.0,
        )
        .unwrap()
    }

    #[test]
    fn evaluate_wraps_around_axis() {
        let cyl = unit_cylinder();
        let p = cyl.evaluate(FRAC_PI_2, 1.0).unwrap();
        assert!(p.x.abs() < TOL);
        assert!((p.y - 1.0).abs() < TOL);
        assert!((p.z - 1.0).abs() < TOL);
    }

    #[test]
    fn normal_points_radially_outward() {
        let cyl = unit_cylinder();
        let n = cyl.normal(0.0, 0.5).unwrap();
        assert!((n.x - 1.0).abs() < TOL);
        assert!(n.z.abs() < TOL);
    }

    #[test]
    fn closed_in_u_only() {
        let cyl = unit_cylinder();
        assert!(cyl.is_closed_u());
        assert!(!cyl.is_closed_v());
    }
}
