//! Native extremum search over parametric operands.
//!
//! All five query variants reduce to the same problem: find the local
//! extrema of a squared-distance function over a k-dimensional box of
//! parameters (k = 1 for point/curve up to k = 4 for surface/surface).
//! The search seeds candidates from a dense grid, classifies each node
//! against its neighbors, and refines every candidate with golden-section
//! descent one axis at a time.

use crate::error::{ExtremaError, Result};

/// One parametric axis of the search box.
pub(crate) struct Axis {
    pub lo: f64,
    pub hi: f64,
    /// Closed axes wrap around; their endpoints are identified and they
    /// have no domain boundary.
    pub closed: bool,
}

impl Axis {
    pub(crate) fn span(&self) -> f64 {
        self.hi - self.lo
    }
}

/// A refined solution in raw parametric form.
pub(crate) struct SolverSolution {
    pub sq_dist: f64,
    pub params: Vec<f64>,
}

/// Raw solver output, before distances are materialized and sorted.
pub(crate) struct SolverReport {
    /// True when the operands are everywhere equidistant over the sweep of
    /// the first operand's parameters (parallel/degenerate configuration).
    pub equidistant: bool,
    pub solutions: Vec<SolverSolution>,
}

pub(crate) type Objective<'a> = dyn FnMut(&[f64]) -> Result<f64> + 'a;

const INV_PHI: f64 = 0.618_033_988_749_894_8;
const MAX_GOLDEN_ITERS: usize = 256;
const MAX_DESCENT_SWEEPS: usize = 96;
const BRACKET_SHRINK: f64 = 0.6;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Minimum,
    Maximum,
}

/// Finds the local extrema of `f` over the box described by `axes`.
///
/// `first_axis_count` is the number of leading axes that belong to the
/// first operand; the equidistance test sweeps those axes and minimizes
/// over the rest. Zero means the first operand is a point and the test
/// degenerates to whole-grid constancy.
pub(crate) fn solve(
    kind: &'static str,
    f: &mut Objective,
    axes: &[Axis],
    first_axis_count: usize,
    samples: &[usize],
    tol: f64,
) -> Result<SolverReport> {
    let k = axes.len();
    debug_assert_eq!(k, samples.len());

    // Closed axes identify their endpoints, so the last node is dropped.
    let nodes: Vec<usize> = axes
        .iter()
        .zip(samples)
        .map(|(a, &s)| if a.closed { s } else { s + 1 })
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let steps: Vec<f64> = axes
        .iter()
        .zip(samples)
        .map(|(a, &s)| a.span() / s as f64)
        .collect();

    let total: usize = nodes.iter().product();
    let mut values = Vec::with_capacity(total);
    let mut idx = vec![0_usize; k];
    let mut params = vec![0.0_f64; k];
    for flat in 0..total {
        unflatten(flat, &nodes, &mut idx);
        node_params(&idx, axes, &steps, &mut params);
        values.push(f(&params)?);
    }

    if profile_is_constant(kind, f, axes, &steps, &nodes, &values, first_axis_count, tol)? {
        return equidistant_report(kind, f, axes, &steps, &values, &nodes, tol);
    }

    let all_axes: Vec<usize> = (0..k).collect();
    let candidates = classify_grid(&values, &nodes, axes);
    let mut solutions: Vec<SolverSolution> = Vec::new();
    for (flat, extremum) in candidates {
        unflatten(flat, &nodes, &mut idx);
        node_params(&idx, axes, &steps, &mut params);
        let negate = extremum == Extremum::Maximum;
        let refined = block_descent(kind, f, axes, &params, &steps, &all_axes, tol, negate)?;
        let sq_dist = f(&refined)?;
        if sq_dist.is_finite() {
            solutions.push(SolverSolution {
                sq_dist,
                params: refined,
            });
        }
    }

    let solutions = merge_duplicates(solutions, axes, tol);
    Ok(SolverReport {
        equidistant: false,
        solutions,
    })
}

/// Row-major multi-index of `flat`.
fn unflatten(flat: usize, nodes: &[usize], idx: &mut [usize]) {
    let mut rem = flat;
    for a in (0..nodes.len()).rev() {
        idx[a] = rem % nodes[a];
        rem /= nodes[a];
    }
}

fn flatten(idx: &[usize], nodes: &[usize]) -> usize {
    let mut flat = 0;
    for a in 0..nodes.len() {
        flat = flat * nodes[a] + idx[a];
    }
    flat
}

#[allow(clippy::cast_precision_loss)]
fn node_params(idx: &[usize], axes: &[Axis], steps: &[f64], out: &mut [f64]) {
    for a in 0..axes.len() {
        out[a] = axes[a].lo + steps[a] * idx[a] as f64;
    }
}

/// Tests whether the minimum-distance profile over the first operand's
/// parameter sweep is constant.
///
/// With a point first operand every grid value already is a realized
/// distance and the sampled values are compared directly. Otherwise the
/// inner minimum is coarsely refined per profile node first: the sampled
/// minimum alone overestimates the true one by an amount that depends on
/// how the two grids happen to align, which would read as profile
/// variation on genuinely parallel operands.
#[allow(clippy::too_many_arguments)]
fn profile_is_constant(
    kind: &'static str,
    f: &mut Objective,
    axes: &[Axis],
    steps: &[f64],
    nodes: &[usize],
    values: &[f64],
    first_axis_count: usize,
    tol: f64,
) -> Result<bool> {
    let k = axes.len();
    let m = first_axis_count;
    let mut prof_min = f64::INFINITY;
    let mut prof_max = f64::NEG_INFINITY;

    if m == 0 {
        for &v in values {
            let d = v.sqrt();
            prof_min = prof_min.min(d);
            prof_max = prof_max.max(d);
        }
        if !prof_min.is_finite() || !prof_max.is_finite() {
            return Ok(false);
        }
        return Ok(prof_max - prof_min <= tol.max((1.0 + prof_min) * 1e-9));
    }

    let profile_len: usize = nodes[..m].iter().product();
    let slice_len: usize = nodes[m..].iter().product();
    let inner_tol = steps[m..].iter().fold(tol, |acc, &s| acc.max(s * 1e-3));
    let active: Vec<usize> = (m..k).collect();
    let mut idx = vec![0_usize; k];
    let mut params = vec![0.0_f64; k];

    for i in 0..profile_len {
        let mut best_j = 0;
        let mut best = f64::INFINITY;
        for j in 0..slice_len {
            let v = values[i * slice_len + j];
            if v < best {
                best = v;
                best_j = j;
            }
        }
        unflatten(i, &nodes[..m], &mut idx[..m]);
        unflatten(best_j, &nodes[m..], &mut idx[m..]);
        node_params(&idx, axes, steps, &mut params);
        let refined = block_descent(kind, f, axes, &params, steps, &active, inner_tol, false)?;
        let d = f(&refined)?.sqrt();
        prof_min = prof_min.min(d);
        prof_max = prof_max.max(d);
        // The spread only grows and the threshold only shrinks from here,
        // so a clearly varying profile can bail out early.
        if prof_max - prof_min > tol.max((1.0 + prof_min) * 1e-7) {
            return Ok(false);
        }
    }

    if !prof_min.is_finite() || !prof_max.is_finite() {
        return Ok(false);
    }
    Ok(prof_max - prof_min <= tol.max((1.0 + prof_min) * 1e-7))
}

/// Builds the single-representative report for an equidistant pair: the
/// global minimum node is refined and returned alone.
fn equidistant_report(
    kind: &'static str,
    f: &mut Objective,
    axes: &[Axis],
    steps: &[f64],
    values: &[f64],
    nodes: &[usize],
    tol: f64,
) -> Result<SolverReport> {
    let mut best_flat = 0;
    let mut best = f64::INFINITY;
    for (flat, &v) in values.iter().enumerate() {
        if v < best {
            best = v;
            best_flat = flat;
        }
    }
    let mut idx = vec![0_usize; axes.len()];
    let mut params = vec![0.0_f64; axes.len()];
    unflatten(best_flat, nodes, &mut idx);
    node_params(&idx, axes, steps, &mut params);
    let all_axes: Vec<usize> = (0..axes.len()).collect();
    let refined = block_descent(kind, f, axes, &params, steps, &all_axes, tol, false)?;
    let sq_dist = f(&refined)?;
    Ok(SolverReport {
        equidistant: true,
        solutions: vec![SolverSolution {
            sq_dist,
            params: refined,
        }],
    })
}

/// Classifies every grid node against its 3^k - 1 neighbors.
///
/// Minima are admitted anywhere, including open-axis domain boundaries;
/// maxima are admitted only at nodes interior to every open axis, so a
/// domain endpoint that merely caps the distance function is not reported
/// as an extremal solution.
fn classify_grid(values: &[f64], nodes: &[usize], axes: &[Axis]) -> Vec<(usize, Extremum)> {
    let k = axes.len();
    let offsets = neighbor_offsets(k);
    let mut idx = vec![0_usize; k];
    let mut nidx = vec![0_usize; k];
    let mut out = Vec::new();

    'node: for (flat, &v) in values.iter().enumerate() {
        unflatten(flat, nodes, &mut idx);

        let mut on_open_boundary = false;
        for a in 0..k {
            if !axes[a].closed && (idx[a] == 0 || idx[a] == nodes[a] - 1) {
                on_open_boundary = true;
            }
        }

        let mut is_min = true;
        let mut is_max = true;
        for offset in &offsets {
            let mut in_range = true;
            for a in 0..k {
                let shifted = idx[a] as isize + offset[a];
                if axes[a].closed {
                    nidx[a] = shifted.rem_euclid(nodes[a] as isize) as usize;
                } else if shifted < 0 || shifted >= nodes[a] as isize {
                    in_range = false;
                    break;
                } else {
                    nidx[a] = shifted as usize;
                }
            }
            if !in_range {
                continue;
            }
            let nv = values[flatten(&nidx, nodes)];
            if nv < v {
                is_min = false;
            }
            if nv > v {
                is_max = false;
            }
            if !is_min && !is_max {
                continue 'node;
            }
        }

        if is_min {
            out.push((flat, Extremum::Minimum));
        } else if is_max && !on_open_boundary {
            out.push((flat, Extremum::Maximum));
        }
    }
    out
}

/// All neighbor offsets in `{-1, 0, 1}^k` except the origin.
fn neighbor_offsets(k: usize) -> Vec<Vec<isize>> {
    let mut out = Vec::with_capacity(3_usize.pow(u32::try_from(k).unwrap_or(4)) - 1);
    let mut current = vec![-1_isize; k];
    loop {
        if current.iter().any(|&c| c != 0) {
            out.push(current.clone());
        }
        let mut a = 0;
        loop {
            if a == k {
                return out;
            }
            if current[a] < 1 {
                current[a] += 1;
                break;
            }
            current[a] = -1;
            a += 1;
        }
    }
}

/// Refines a seed toward a local extremum by golden-section search over
/// the `active` axes one at a time, shrinking the per-axis bracket each
/// sweep. Inactive axes stay pinned at their seed values.
#[allow(clippy::too_many_arguments)]
fn block_descent(
    kind: &'static str,
    f: &mut Objective,
    axes: &[Axis],
    seed: &[f64],
    steps: &[f64],
    active: &[usize],
    tol: f64,
    negate: bool,
) -> Result<Vec<f64>> {
    let mut x = seed.to_vec();
    let mut radius: Vec<f64> = active.iter().map(|&a| steps[a]).collect();

    for _ in 0..MAX_DESCENT_SWEEPS {
        for (ri, &a) in active.iter().enumerate() {
            let mut lo = x[a] - radius[ri];
            let mut hi = x[a] + radius[ri];
            if !axes[a].closed {
                lo = lo.max(axes[a].lo);
                hi = hi.min(axes[a].hi);
            }
            if hi - lo < tol {
                continue;
            }
            let best = golden_min(
                kind,
                &mut |t| {
                    let mut p = x.clone();
                    p[a] = t;
                    f(&p).map(|v| if negate { -v } else { v })
                },
                lo,
                hi,
                tol,
            )?;
            x[a] = best;
        }

        if radius.iter().all(|&r| r < tol) {
            for &a in active {
                if axes[a].closed {
                    x[a] = axes[a].lo + (x[a] - axes[a].lo).rem_euclid(axes[a].span());
                }
            }
            return Ok(x);
        }
        for r in &mut radius {
            *r *= BRACKET_SHRINK;
        }
    }

    Err(ExtremaError::NotConverged { kind }.into())
}

/// Golden-section minimization over `[lo, hi]`.
fn golden_min(
    kind: &'static str,
    f: &mut Objective1,
    mut lo: f64,
    mut hi: f64,
    tol: f64,
) -> Result<f64> {
    let mut c = hi - (hi - lo) * INV_PHI;
    let mut d = lo + (hi - lo) * INV_PHI;
    let mut fc = f(c)?;
    let mut fd = f(d)?;

    let mut iters = 0;
    while hi - lo > tol {
        if fc < fd {
            hi = d;
            d = c;
            fd = fc;
            c = hi - (hi - lo) * INV_PHI;
            fc = f(c)?;
        } else {
            lo = c;
            c = d;
            fc = fd;
            d = lo + (hi - lo) * INV_PHI;
            fd = f(d)?;
        }
        iters += 1;
        if iters > MAX_GOLDEN_ITERS {
            return Err(ExtremaError::NotConverged { kind }.into());
        }
    }
    Ok((lo + hi) / 2.0)
}

type Objective1<'a> = dyn FnMut(f64) -> Result<f64> + 'a;

/// Merges refined solutions that landed on the same extremum.
fn merge_duplicates(
    mut solutions: Vec<SolverSolution>,
    axes: &[Axis],
    tol: f64,
) -> Vec<SolverSolution> {
    let merge_tol = (tol * 100.0).max(1e-12);
    let mut kept: Vec<SolverSolution> = Vec::with_capacity(solutions.len());

    solutions.sort_by(|a, b| a.sq_dist.total_cmp(&b.sq_dist));
    for sol in solutions {
        let duplicate = kept.iter().any(|existing| {
            axes.iter().enumerate().all(|(a, axis)| {
                let mut delta = (sol.params[a] - existing.params[a]).abs();
                if axis.closed {
                    delta = delta.min((axis.span() - delta).abs());
                }
                delta <= merge_tol.max(axis.span() * 1e-9)
            })
        });
        if !duplicate {
            kept.push(sol);
        }
    }
    kept
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn open_axis(lo: f64, hi: f64) -> Axis {
        Axis {
            lo,
            hi,
            closed: false,
        }
    }

    #[test]
    fn quadratic_minimum_is_refined() {
        let mut f = |p: &[f64]| -> Result<f64> { Ok((p[0] - 0.3) * (p[0] - 0.3)) };
        let axes = [open_axis(0.0, 1.0)];
        let report = solve("test", &mut f, &axes, 0, &[32], 1e-10).unwrap();
        assert!(!report.equidistant);
        assert_eq!(report.solutions.len(), 1);
        assert!((report.solutions[0].params[0] - 0.3).abs() < 1e-8);
    }

    #[test]
    fn boundary_maximum_is_not_reported() {
        // Monotonic on [0, 1]: minimum at the left boundary, maximum at the
        // right one. Only the boundary minimum is a solution.
        let mut f = |p: &[f64]| -> Result<f64> { Ok(p[0] * p[0] + 1.0) };
        let axes = [open_axis(0.0, 1.0)];
        let report = solve("test", &mut f, &axes, 0, &[32], 1e-10).unwrap();
        assert_eq!(report.solutions.len(), 1);
        assert!(report.solutions[0].params[0].abs() < 1e-8);
    }

    #[test]
    fn interior_maximum_is_reported() {
        // W-shaped function: two interior minima and one interior maximum.
        let mut f = |p: &[f64]| -> Result<f64> {
            let x = p[0];
            Ok((x * x - 1.0) * (x * x - 1.0))
        };
        let axes = [open_axis(-1.2, 1.2)];
        let report = solve("test", &mut f, &axes, 0, &[64], 1e-10).unwrap();
        assert_eq!(report.solutions.len(), 3, "two minima and one maximum");
    }

    #[test]
    fn constant_function_is_equidistant() {
        let mut f = |_: &[f64]| -> Result<f64> { Ok(4.0) };
        let axes = [open_axis(0.0, 1.0)];
        let report = solve("test", &mut f, &axes, 0, &[16], 1e-10).unwrap();
        assert!(report.equidistant);
        assert_eq!(report.solutions.len(), 1);
    }

    #[test]
    fn two_dimensional_minimum() {
        let mut f = |p: &[f64]| -> Result<f64> {
            Ok((p[0] - 0.5) * (p[0] - 0.5) + (p[1] + 0.25) * (p[1] + 0.25))
        };
        let axes = [open_axis(-1.0, 1.0), open_axis(-1.0, 1.0)];
        let report = solve("test", &mut f, &axes, 1, &[16, 16], 1e-10).unwrap();
        assert!(!report.equidistant);
        assert_eq!(report.solutions.len(), 1);
        assert!((report.solutions[0].params[0] - 0.5).abs() < 1e-8);
        assert!((report.solutions[0].params[1] + 0.25).abs() < 1e-8);
    }
}
