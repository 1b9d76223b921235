//! Reference-curve adjacency discovery.
//!
//! Decides which parts of a set are geometric neighbors worth fusing,
//! using each part's 1-D reference curve as a cheap proxy for full 3-D
//! proximity. Intersection testing runs through the extrema engine: two
//! reference curves touch when their minimum distance falls within the
//! working tolerance.

use tracing::debug;

use crate::error::Result;
use crate::extrema::{curve_to_curve, ExtremaConfig};
use crate::structure::{Model, PartId};

/// One discovered join: a main part and the parts it should fuse with.
#[derive(Debug, Clone)]
pub struct JoinGroup {
    pub main: PartId,
    pub candidates: Vec<PartId>,
}

/// Tests every unordered pair of `parts` for reference-curve contact.
///
/// Pairs follow the fixed enumeration over the input sequence (outer index
/// strictly less than inner index): grouping is deterministic for a fixed
/// input ordering, but sensitive to that ordering. Pairs where either part
/// lacks a reference curve are skipped. The working tolerance is the
/// caller's, or the maximum of the two parts' shape tolerances when
/// omitted.
///
/// # Errors
///
/// Returns an error if a part or shape is unknown, or an extrema query
/// fails to converge.
pub fn discover_join_groups(
    model: &Model,
    parts: &[PartId],
    tolerance: Option<f64>,
    cfg: &ExtremaConfig,
) -> Result<Vec<JoinGroup>> {
    let mut groups = Vec::new();

    for i in 0..parts.len().saturating_sub(1) {
        let main = model.part(parts[i])?;
        let mut candidates = Vec::new();

        for j in (i + 1)..parts.len() {
            let other = model.part(parts[j])?;
            let (Some(main_cref), Some(other_cref)) = (main.cref(), other.cref()) else {
                continue;
            };

            let tol = match tolerance {
                Some(tol) => tol,
                None => {
                    let tol1 = model.shapes().tolerance_max(main.shape())?;
                    let tol2 = model.shapes().tolerance_max(other.shape())?;
                    tol1.max(tol2)
                }
            };

            let report = curve_to_curve(main_cref, other_cref, cfg)?;
            if report.min_distance() <= tol {
                candidates.push(parts[j]);
            }
        }

        if !candidates.is_empty() {
            debug!(main = ?parts[i], count = candidates.len(), "join group discovered");
            groups.push(JoinGroup {
                main: parts[i],
                candidates,
            });
        }
    }

    Ok(groups)
}
