use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// A bounded planar patch in 3D space.
///
/// Defined by an origin point, two orthonormalized direction vectors
/// (`u_dir`, `v_dir`), and a finite parameter domain. The normal is
/// `u_dir × v_dir`.
///
/// Parametric form: `P(u, v) = origin + u * u_dir + v * v_dir`.
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
    domain: SurfaceDomain,
}

impl Plane {
    /// Creates a new planar patch from an origin, two direction vectors,
    /// and a parameter domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vectors are zero-length or
    /// parallel (degenerate plane).
    pub fn new(
        origin: Point3,
        u_dir: Vector3,
        v_dir: Vector3,
        domain: SurfaceDomain,
    ) -> Result<Self> {
        let u_len = u_dir.norm();
        if u_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let v_len = v_dir.norm();
        if v_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }

        let u_dir = u_dir / u_len;
        let v_dir = v_dir / v_len;

        let normal = u_dir.cross(&v_dir);
        let normal_len = normal.norm();
        if normal_len < TOLERANCE {
            return Err(GeometryError::Degenerate("plane directions are parallel".into()).into());
        }
        let normal = normal / normal_len;

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
            domain,
        })
    }

    /// Returns the origin point of the patch.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the patch normal.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }
}

impl Surface for Plane {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        Ok(self.origin + self.u_dir * u + self.v_dir * v)
    }

    fn normal(&self, _u: f64, _v: f64) -> Result<Vector3> {
        Ok(self.normal)
    }

    fn domain(&self) -> SurfaceDomain {
        self.domain
    }
}
