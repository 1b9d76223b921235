//! Nearest-feature (extrema) queries between points, curves, and surfaces.
//!
//! Five query variants share one engine: the operands are wrapped in
//! [`Operand`] tags and a single generic [`extrema`] call dispatches on the
//! tag pair. Each successful call produces an [`ExtremaReport`] holding
//! every local extremum found, sorted by ascending distance.

mod solve;

use crate::error::{ExtremaError, Result};
use crate::geometry::{Curve, Surface};
use crate::math::Point3;

use solve::{Axis, SolverReport, SolverSolution};

/// A geometric operand for an extrema query.
#[derive(Clone, Copy)]
pub enum Operand<'a> {
    Point(Point3),
    Curve(&'a dyn Curve),
    Surface(&'a dyn Surface),
}

/// Explicit solver configuration, passed into every query.
///
/// There is no ambient solver state: two models with different tolerances
/// can run queries side by side.
#[derive(Debug, Clone, Copy)]
pub struct ExtremaConfig {
    /// Parametric tolerance, applied in both parametric directions.
    pub tolerance: f64,
    /// Seed-grid density along curve parameters.
    pub curve_samples: usize,
    /// Seed-grid density along each surface parameter.
    pub surface_samples: usize,
}

impl Default for ExtremaConfig {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-10,
            curve_samples: 128,
            surface_samples: 24,
        }
    }
}

impl ExtremaConfig {
    /// Returns the default configuration with a different tolerance.
    #[must_use]
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }
}

/// Parameter value(s) locating a solution on one operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameters {
    /// The operand is a point; it has no parameters.
    None,
    /// Parameter on a curve.
    Curve(f64),
    /// Parameters on a surface.
    Surface { u: f64, v: f64 },
}

/// One side of a solution: where it lies on the operand, and the realized
/// point in the ambient frame.
#[derive(Debug, Clone)]
pub struct OperandSolution {
    pub parameters: Parameters,
    pub point: Point3,
}

/// One local extremum between the two operands.
#[derive(Debug, Clone)]
pub struct ExtremaResult {
    /// True (never squared) distance between the two realized points.
    pub distance: f64,
    pub first: OperandSolution,
    pub second: OperandSolution,
}

/// The full, ordered outcome of an extrema query.
///
/// Invariants: `results` is non-empty and sorted ascending by distance;
/// `min_distance`/`max_distance` are the first/last entries.
#[derive(Debug, Clone)]
pub struct ExtremaReport {
    results: Vec<ExtremaResult>,
    is_parallel: Option<bool>,
}

impl ExtremaReport {
    /// Returns all solutions, sorted ascending by distance.
    #[must_use]
    pub fn results(&self) -> &[ExtremaResult] {
        &self.results
    }

    /// Returns the number of solutions.
    #[must_use]
    pub fn nsol(&self) -> usize {
        self.results.len()
    }

    /// Returns the minimum distance.
    #[must_use]
    pub fn min_distance(&self) -> f64 {
        self.results[0].distance
    }

    /// Returns the maximum distance.
    #[must_use]
    pub fn max_distance(&self) -> f64 {
        self.results[self.results.len() - 1].distance
    }

    /// Whether the solver found the operands parallel/coincident.
    ///
    /// `None` for point queries, where parallelism has no meaning.
    #[must_use]
    pub fn is_parallel(&self) -> Option<bool> {
        self.is_parallel
    }
}

/// Computes the extrema between a point and a curve.
///
/// # Errors
///
/// Fails if the solver does not converge or finds no solutions.
pub fn point_to_curve(pnt: Point3, crv: &dyn Curve, cfg: &ExtremaConfig) -> Result<ExtremaReport> {
    run_point_curve(&pnt, crv, cfg)
}

/// Computes the extrema between a point and a surface.
///
/// # Errors
///
/// Fails if the solver does not converge or finds no solutions.
pub fn point_to_surface(
    pnt: Point3,
    srf: &dyn Surface,
    cfg: &ExtremaConfig,
) -> Result<ExtremaReport> {
    run_point_surface(&pnt, srf, cfg)
}

/// Computes the extrema between two curves.
///
/// # Errors
///
/// Fails if the solver does not converge or finds no solutions.
pub fn curve_to_curve(
    crv1: &dyn Curve,
    crv2: &dyn Curve,
    cfg: &ExtremaConfig,
) -> Result<ExtremaReport> {
    run_curve_curve(crv1, crv2, cfg)
}

/// Computes the extrema between a curve and a surface.
///
/// # Errors
///
/// Fails if the solver does not converge or finds no solutions.
pub fn curve_to_surface(
    crv: &dyn Curve,
    srf: &dyn Surface,
    cfg: &ExtremaConfig,
) -> Result<ExtremaReport> {
    run_curve_surface(crv, srf, cfg)
}

/// Computes the extrema between two surfaces.
///
/// # Errors
///
/// Fails if the solver does not converge or finds no solutions.
pub fn surface_to_surface(
    srf1: &dyn Surface,
    srf2: &dyn Surface,
    cfg: &ExtremaConfig,
) -> Result<ExtremaReport> {
    run_surface_surface(srf1, srf2, cfg)
}

/// Generic extrema query dispatching on the operand tag pair.
///
/// Reversed pairs are accepted; solutions are reported in the caller's
/// argument order.
///
/// # Errors
///
/// Fails for a point/point pair, or if the solver does not converge or
/// finds no solutions.
pub fn extrema(first: Operand, second: Operand, cfg: &ExtremaConfig) -> Result<ExtremaReport> {
    match (first, second) {
        (Operand::Point(p), Operand::Curve(c)) => run_point_curve(&p, c, cfg),
        (Operand::Curve(c), Operand::Point(p)) => run_point_curve(&p, c, cfg).map(swap_sides),
        (Operand::Point(p), Operand::Surface(s)) => run_point_surface(&p, s, cfg),
        (Operand::Surface(s), Operand::Point(p)) => run_point_surface(&p, s, cfg).map(swap_sides),
        (Operand::Curve(a), Operand::Curve(b)) => run_curve_curve(a, b, cfg),
        (Operand::Curve(c), Operand::Surface(s)) => run_curve_surface(c, s, cfg),
        (Operand::Surface(s), Operand::Curve(c)) => run_curve_surface(c, s, cfg).map(swap_sides),
        (Operand::Surface(a), Operand::Surface(b)) => run_surface_surface(a, b, cfg),
        (Operand::Point(_), Operand::Point(_)) => {
            Err(ExtremaError::UnsupportedOperands("point and point").into())
        }
    }
}

fn swap_sides(mut report: ExtremaReport) -> ExtremaReport {
    for result in &mut report.results {
        std::mem::swap(&mut result.first, &mut result.second);
    }
    report
}

fn curve_axis(crv: &dyn Curve) -> Axis {
    let dom = crv.domain();
    Axis {
        lo: dom.t_min,
        hi: dom.t_max,
        closed: crv.is_closed(),
    }
}

fn surface_axes(srf: &dyn Surface) -> [Axis; 2] {
    let dom = srf.domain();
    [
        Axis {
            lo: dom.u_min,
            hi: dom.u_max,
            closed: srf.is_closed_u(),
        },
        Axis {
            lo: dom.v_min,
            hi: dom.v_max,
            closed: srf.is_closed_v(),
        },
    ]
}

/// Converts raw solver output into a sorted report.
fn build_report(
    kind: &'static str,
    raw: SolverReport,
    parallel: Option<bool>,
    mut make: impl FnMut(&SolverSolution) -> Result<ExtremaResult>,
) -> Result<ExtremaReport> {
    if raw.solutions.is_empty() {
        return Err(ExtremaError::NoSolutions { kind }.into());
    }
    let mut results = Vec::with_capacity(raw.solutions.len());
    for sol in &raw.solutions {
        results.push(make(sol)?);
    }
    // Stable sort: equal distances keep the solver's enumeration order.
    results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(ExtremaReport {
        results,
        is_parallel: parallel,
    })
}

fn run_point_curve(pnt: &Point3, crv: &dyn Curve, cfg: &ExtremaConfig) -> Result<ExtremaReport> {
    const KIND: &str = "point and curve";
    let axes = [curve_axis(crv)];
    let mut objective = |p: &[f64]| -> Result<f64> {
        let q = crv.evaluate(p[0])?;
        Ok((q - *pnt).norm_squared())
    };
    let raw = solve::solve(
        KIND,
        &mut objective,
        &axes,
        0,
        &[cfg.curve_samples],
        cfg.tolerance,
    )?;
    build_report(KIND, raw, None, |sol| {
        let t = sol.params[0];
        Ok(ExtremaResult {
            distance: sol.sq_dist.sqrt(),
            first: OperandSolution {
                parameters: Parameters::None,
                point: *pnt,
            },
            second: OperandSolution {
                parameters: Parameters::Curve(t),
                point: crv.evaluate(t)?,
            },
        })
    })
}

fn run_point_surface(
    pnt: &Point3,
    srf: &dyn Surface,
    cfg: &ExtremaConfig,
) -> Result<ExtremaReport> {
    const KIND: &str = "point and surface";
    let axes = surface_axes(srf);
    let mut objective = |p: &[f64]| -> Result<f64> {
        let q = srf.evaluate(p[0], p[1])?;
        Ok((q - *pnt).norm_squared())
    };
    let raw = solve::solve(
        KIND,
        &mut objective,
        &axes,
        0,
        &[cfg.surface_samples, cfg.surface_samples],
        cfg.tolerance,
    )?;
    build_report(KIND, raw, None, |sol| {
        let (u, v) = (sol.params[0], sol.params[1]);
        Ok(ExtremaResult {
            distance: sol.sq_dist.sqrt(),
            first: OperandSolution {
                parameters: Parameters::None,
                point: *pnt,
            },
            second: OperandSolution {
                parameters: Parameters::Surface { u, v },
                point: srf.evaluate(u, v)?,
            },
        })
    })
}

fn run_curve_curve(
    crv1: &dyn Curve,
    crv2: &dyn Curve,
    cfg: &ExtremaConfig,
) -> Result<ExtremaReport> {
    const KIND: &str = "two curves";
    let axes = [curve_axis(crv1), curve_axis(crv2)];
    let mut objective = |p: &[f64]| -> Result<f64> {
        let q1 = crv1.evaluate(p[0])?;
        let q2 = crv2.evaluate(p[1])?;
        Ok((q1 - q2).norm_squared())
    };
    let raw = solve::solve(
        KIND,
        &mut objective,
        &axes,
        1,
        &[cfg.curve_samples, cfg.curve_samples],
        cfg.tolerance,
    )?;
    let parallel = Some(raw.equidistant);
    build_report(KIND, raw, parallel, |sol| {
        let (t1, t2) = (sol.params[0], sol.params[1]);
        Ok(ExtremaResult {
            distance: sol.sq_dist.sqrt(),
            first: OperandSolution {
                parameters: Parameters::Curve(t1),
                point: crv1.evaluate(t1)?,
            },
            second: OperandSolution {
                parameters: Parameters::Curve(t2),
                point: crv2.evaluate(t2)?,
            },
        })
    })
}

fn run_curve_surface(
    crv: &dyn Curve,
    srf: &dyn Surface,
    cfg: &ExtremaConfig,
) -> Result<ExtremaReport> {
    const KIND: &str = "curve and surface";
    let [su, sv] = surface_axes(srf);
    let axes = [curve_axis(crv), su, sv];
    let mut objective = |p: &[f64]| -> Result<f64> {
        let q1 = crv.evaluate(p[0])?;
        let q2 = srf.evaluate(p[1], p[2])?;
        Ok((q1 - q2).norm_squared())
    };
    let raw = solve::solve(
        KIND,
        &mut objective,
        &axes,
        1,
        &[
            cfg.curve_samples.min(64),
            cfg.surface_samples,
            cfg.surface_samples,
        ],
        cfg.tolerance,
    )?;
    let parallel = Some(raw.equidistant);
    build_report(KIND, raw, parallel, |sol| {
        let (t, u, v) = (sol.params[0], sol.params[1], sol.params[2]);
        Ok(ExtremaResult {
            distance: sol.sq_dist.sqrt(),
            first: OperandSolution {
                parameters: Parameters::Curve(t),
                point: crv.evaluate(t)?,
            },
            second: OperandSolution {
                parameters: Parameters::Surface { u, v },
                point: srf.evaluate(u, v)?,
            },
        })
    })
}

fn run_surface_surface(
    srf1: &dyn Surface,
    srf2: &dyn Surface,
    cfg: &ExtremaConfig,
) -> Result<ExtremaReport> {
    const KIND: &str = "two surfaces";
    let [a_u, a_v] = surface_axes(srf1);
    let [b_u, b_v] = surface_axes(srf2);
    let axes = [a_u, a_v, b_u, b_v];
    let mut objective = |p: &[f64]| -> Result<f64> {
        let q1 = srf1.evaluate(p[0], p[1])?;
        let q2 = srf2.evaluate(p[2], p[3])?;
        Ok((q1 - q2).norm_squared())
    };
    // A four-axis grid is seeded at half density to bound its size.
    let n = cfg.surface_samples.min(12);
    let raw = solve::solve(
        KIND,
        &mut objective,
        &axes,
        2,
        &[n, n, n, n],
        cfg.tolerance,
    )?;
    let parallel = Some(raw.equidistant);
    build_report(KIND, raw, parallel, |sol| {
        let (u1, v1) = (sol.params[0], sol.params[1]);
        let (u2, v2) = (sol.params[2], sol.params[3]);
        Ok(ExtremaResult {
            distance: sol.sq_dist.sqrt(),
            first: OperandSolution {
                parameters: Parameters::Surface { u: u1, v: v1 },
                point: srf1.evaluate(u1, v1)?,
            },
            second: OperandSolution {
                parameters: Parameters::Surface { u: u2, v: v2 },
                point: srf2.evaluate(u2, v2)?,
            },
        })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::{Arc, Plane, Segment, SurfaceDomain};
    use crate::math::Vector3;

    fn cfg() -> ExtremaConfig {
        ExtremaConfig::default()
    }

    fn x_segment(len: f64) -> Segment {
        Segment::new(Point3::origin(), Point3::new(len, 0.0, 0.0)).unwrap()
    }

    fn xy_plane(u_max: f64, v_max: f64) -> Plane {
        Plane::new(
            Point3::origin(),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            SurfaceDomain::new(0.0, u_max, 0.0, v_max),
        )
        .unwrap()
    }

    #[test]
    fn point_above_segment_midpoint_has_one_solution() {
        let report = point_to_curve(Point3::new(5.0, 1.0, 0.0), &x_segment(10.0), &cfg()).unwrap();
        assert_eq!(report.nsol(), 1);
        assert_relative_eq!(report.min_distance(), 1.0, epsilon = 1e-8);
        let Parameters::Curve(t) = report.results()[0].second.parameters else {
            panic!("expected a curve parameter");
        };
        assert_relative_eq!(t, 0.5, epsilon = 1e-8);
    }

    #[test]
    fn point_on_segment_interior_has_distance_zero() {
        let report = point_to_curve(Point3::new(5.0, 0.0, 0.0), &x_segment(10.0), &cfg()).unwrap();
        assert_eq!(report.nsol(), 1);
        assert!(report.min_distance() < 1e-8, "d={}", report.min_distance());
        let Parameters::Curve(t) = report.results()[0].second.parameters else {
            panic!("expected a curve parameter");
        };
        assert_relative_eq!(t, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn point_below_arc_chord_finds_both_endpoints() {
        // Upper unit semicircle; the query point sits below the chord,
        // equidistant from both endpoints.
        let arc = Arc::new(
            Point3::origin(),
            1.0,
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
            0.0,
            PI,
        )
        .unwrap();
        let report = point_to_curve(Point3::new(0.0, -0.5, 0.0), &arc, &cfg()).unwrap();
        assert!(report.nsol() >= 2, "nsol={}", report.nsol());
        let expected = 1.25_f64.sqrt();
        assert_relative_eq!(report.results()[0].distance, expected, epsilon = 1e-8);
        assert_relative_eq!(report.results()[1].distance, expected, epsilon = 1e-8);
        // Sorted ascending throughout.
        for pair in report.results().windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn circle_reports_near_and_far_extrema() {
        let circle = Arc::circle(
            Point3::origin(),
            1.0,
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        let report = point_to_curve(Point3::new(2.0, 0.0, 0.0), &circle, &cfg()).unwrap();
        assert_eq!(report.nsol(), 2);
        assert_relative_eq!(report.min_distance(), 1.0, epsilon = 1e-8);
        assert_relative_eq!(report.max_distance(), 3.0, epsilon = 1e-8);
    }

    #[test]
    fn parallel_segments_report_is_parallel() {
        let s1 = x_segment(10.0);
        let s2 = Segment::new(Point3::new(0.0, 2.0, 0.0), Point3::new(10.0, 2.0, 0.0)).unwrap();
        let report = curve_to_curve(&s1, &s2, &cfg()).unwrap();
        assert_eq!(report.is_parallel(), Some(true));
        assert_relative_eq!(report.min_distance(), 2.0, epsilon = 1e-8);
    }

    #[test]
    fn crossing_segments_touch() {
        let s1 = Segment::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)).unwrap();
        let s2 = Segment::new(Point3::new(0.0, -1.0, 0.0), Point3::new(0.0, 1.0, 0.0)).unwrap();
        let report = curve_to_curve(&s1, &s2, &cfg()).unwrap();
        assert_eq!(report.is_parallel(), Some(false));
        assert!(report.min_distance() < 1e-8, "d={}", report.min_distance());
    }

    #[test]
    fn point_above_plane_patch() {
        let report =
            point_to_surface(Point3::new(1.0, 1.0, 2.0), &xy_plane(4.0, 2.0), &cfg()).unwrap();
        assert_eq!(report.nsol(), 1);
        assert_relative_eq!(report.min_distance(), 2.0, epsilon = 1e-8);
        let Parameters::Surface { u, v } = report.results()[0].second.parameters else {
            panic!("expected surface parameters");
        };
        assert_relative_eq!(u, 1.0, epsilon = 1e-6);
        assert_relative_eq!(v, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn segment_parallel_to_plane() {
        let seg = Segment::new(Point3::new(0.0, 0.0, 3.0), Point3::new(4.0, 0.0, 3.0)).unwrap();
        let report = curve_to_surface(&seg, &xy_plane(4.0, 2.0), &cfg()).unwrap();
        assert_eq!(report.is_parallel(), Some(true));
        assert_relative_eq!(report.min_distance(), 3.0, epsilon = 1e-8);
    }

    #[test]
    fn parallel_plane_patches() {
        let lower = xy_plane(1.0, 1.0);
        let upper = Plane::new(
            Point3::new(0.0, 0.0, 5.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            SurfaceDomain::new(0.0, 1.0, 0.0, 1.0),
        )
        .unwrap();
        let report = surface_to_surface(&lower, &upper, &cfg()).unwrap();
        assert_eq!(report.is_parallel(), Some(true));
        assert_relative_eq!(report.min_distance(), 5.0, epsilon = 1e-8);
    }

    #[test]
    fn point_outside_cylinder() {
        use crate::geometry::Cylinder;

        let cyl = Cylinder::new(
            Point3::origin(),
            1.0,
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
            0.0,
            2.0,
        )
        .unwrap();
        let report = point_to_surface(Point3::new(3.0, 0.0, 1.0), &cyl, &cfg()).unwrap();
        assert_eq!(report.nsol(), 1);
        assert_relative_eq!(report.min_distance(), 2.0, epsilon = 1e-8);
        let Parameters::Surface { u, v } = report.results()[0].second.parameters else {
            panic!("expected surface parameters");
        };
        assert!(u.abs() < 1e-6 || (std::f64::consts::TAU - u).abs() < 1e-6, "u={u}");
        assert_relative_eq!(v, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn report_min_max_match_ends() {
        let circle = Arc::circle(
            Point3::origin(),
            1.0,
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        let report = point_to_curve(Point3::new(1.5, 0.0, 0.0), &circle, &cfg()).unwrap();
        let results = report.results();
        assert!(!results.is_empty());
        assert_relative_eq!(report.min_distance(), results[0].distance);
        assert_relative_eq!(
            report.max_distance(),
            results[results.len() - 1].distance
        );
    }

    #[test]
    fn swapped_operands_keep_argument_order() {
        let seg = x_segment(10.0);
        let report = extrema(
            Operand::Curve(&seg),
            Operand::Point(Point3::new(5.0, 1.0, 0.0)),
            &cfg(),
        )
        .unwrap();
        let first = &report.results()[0].first;
        assert!(matches!(first.parameters, Parameters::Curve(_)));
        let second = &report.results()[0].second;
        assert!(matches!(second.parameters, Parameters::None));
    }

    #[test]
    fn point_point_pair_is_rejected() {
        let result = extrema(
            Operand::Point(Point3::origin()),
            Operand::Point(Point3::new(1.0, 0.0, 0.0)),
            &cfg(),
        );
        assert!(result.is_err());
    }
}
