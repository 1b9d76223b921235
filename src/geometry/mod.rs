pub mod curve;
pub mod surface;

pub use curve::{Arc, Curve, CurveDomain, Segment};
pub use surface::{Cylinder, Plane, Surface, SurfaceDomain};
