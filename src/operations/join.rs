//! Part synchronization operations.
//!
//! All six operations follow the same shape: collect input shapes, invoke
//! a boolean/sewing primitive, resolve each original shape through the
//! rebuilder, write the resolved shapes back into their parts, and report
//! an [`OperationOutcome`]. A part's shape is rewritten only after the
//! primitive and the resolver have both succeeded; identity, assembly
//! membership, and reference curves are never touched.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::{OperationError, Result};
use crate::extrema::ExtremaConfig;
use crate::structure::{AssemblyId, Model, PartId, PartKind};
use crate::topology::ShapeId;

use super::adjacency::discover_join_groups;
use super::boolean::{BooleanKernel, SewOptions};
use super::rebuild::ShapeRebuilder;

/// Result of one synchronization operation.
#[derive(Debug)]
pub struct OperationOutcome {
    /// Whether the operation completed. For the per-part operations this
    /// is true only when every part succeeded.
    pub is_done: bool,
    /// The aggregate result shape, when the primitive produces one.
    pub shape: Option<ShapeId>,
    part_status: HashMap<PartId, bool>,
}

impl OperationOutcome {
    fn batch(is_done: bool, shape: Option<ShapeId>) -> Self {
        Self {
            is_done,
            shape,
            part_status: HashMap::new(),
        }
    }

    fn per_part(shape: Option<ShapeId>, part_status: HashMap<PartId, bool>) -> Self {
        Self {
            is_done: part_status.values().all(|&ok| ok),
            shape,
            part_status,
        }
    }

    /// Per-part success of a cut operation; `None` if the part was not an
    /// input of the operation.
    #[must_use]
    pub fn was_cut(&self, part: PartId) -> Option<bool> {
        self.part_status.get(&part).copied()
    }

    /// The per-part success map of a per-part operation; empty for
    /// all-or-nothing batches.
    #[must_use]
    pub fn part_status(&self) -> &HashMap<PartId, bool> {
        &self.part_status
    }
}

/// Fuses two part groups and rebuilds every part of both groups in place.
///
/// # Errors
///
/// Returns an error if a part is unknown, the primitive fails outright, or
/// a rebuild resolves some part's shape to a deletion.
pub fn fuse_parts<K: BooleanKernel>(
    model: &mut Model,
    kernel: &mut K,
    parts: &[PartId],
    tools: &[PartId],
    fuzzy: Option<f64>,
) -> Result<OperationOutcome> {
    let arg_shapes = part_shapes(model, parts)?;
    let tool_shapes = part_shapes(model, tools)?;

    let outcome = kernel.fuse(model.shapes_mut(), &arg_shapes, &tool_shapes, fuzzy)?;

    let rebuilder = ShapeRebuilder::new(&outcome.modifications);
    let mut originals = arg_shapes;
    originals.extend(tool_shapes);
    let resolved = rebuilder.resolve_all(model.shapes_mut(), &originals)?;

    for (&part, new_shape) in parts.iter().chain(tools).zip(resolved) {
        model.part_mut(part)?.set_shape(new_shape);
    }

    info!(parts = parts.len(), tools = tools.len(), done = outcome.is_done, "fused parts");
    Ok(OperationOutcome::batch(outcome.is_done, outcome.shape))
}

/// Fuses parts whose reference curves intersect, group by group.
///
/// Groups are discovered per [`discover_join_groups`]; each discovered
/// main part is fused against all its candidates in one multi-tool call.
/// A group that fails to fuse records failure and does not block the
/// remaining groups. `is_done` is true when at least one group was
/// discovered.
///
/// # Errors
///
/// Returns an error before any geometry is touched if some part is not a
/// surface part, and if discovery itself fails.
pub fn fuse_parts_by_cref<K: BooleanKernel>(
    model: &mut Model,
    kernel: &mut K,
    parts: &[PartId],
    tolerance: Option<f64>,
) -> Result<OperationOutcome> {
    for &part in parts {
        if model.part(part)?.kind() != PartKind::Surface {
            return Err(OperationError::InvalidInput(format!(
                "part {:?} is not a surface part",
                model.part(part)?.name()
            ))
            .into());
        }
    }

    let groups = discover_join_groups(model, parts, tolerance, &ExtremaConfig::default())?;
    let is_done = !groups.is_empty();

    let mut part_status = HashMap::new();
    for group in &groups {
        let joined = match model.fuse_part(group.main, &group.candidates, kernel, None) {
            Ok(joined) => joined,
            Err(err) => {
                warn!(main = ?group.main, error = %err, "join group failed");
                false
            }
        };
        part_status.insert(group.main, joined);
    }

    info!(groups = groups.len(), "fused parts by reference curve");
    Ok(OperationOutcome {
        is_done,
        shape: None,
        part_status,
    })
}

/// Cuts each part with the tool shape, one part at a time.
///
/// Cutting part-by-part is more robust than one batched cut: a part whose
/// cut fails is recorded as such and the loop continues. Every input part
/// has an entry in the outcome's status map; failures are data, never
/// errors.
///
/// # Errors
///
/// Returns an error only if a part is unknown.
pub fn cut_parts<K: BooleanKernel>(
    model: &mut Model,
    kernel: &mut K,
    parts: &[PartId],
    tool: ShapeId,
) -> Result<OperationOutcome> {
    let mut part_status = HashMap::new();
    for &part in parts {
        model.part(part)?;
        let status = match model.cut_part(part, kernel, tool) {
            Ok(status) => status,
            Err(err) => {
                warn!(part = ?part, error = %err, "cut failed");
                false
            }
        };
        debug!(part = ?part, status, "cut part");
        part_status.insert(part, status);
    }
    Ok(OperationOutcome::per_part(None, part_status))
}

/// Sews the parts' shapes and rewrites only the parts the primitive
/// reports as modified; unmodified parts keep their original shape value
/// untouched.
///
/// The working tolerance defaults to the arithmetic mean of the parts'
/// minimum shape tolerances, the maximum tolerance to the maximum of the
/// parts' maximum shape tolerances. Sewing closes free edges and accepts
/// non-manifold results.
///
/// # Errors
///
/// Returns an error if a part is unknown or the primitive fails outright.
pub fn sew_parts<K: BooleanKernel>(
    model: &mut Model,
    kernel: &mut K,
    parts: &[PartId],
    tolerance: Option<f64>,
    max_tolerance: Option<f64>,
) -> Result<OperationOutcome> {
    let shapes = part_shapes(model, parts)?;

    let tolerance = match tolerance {
        Some(tolerance) => tolerance,
        None => {
            let mut sum = 0.0;
            for &shape in &shapes {
                sum += model.shapes().tolerance_min(shape)?;
            }
            #[allow(clippy::cast_precision_loss)]
            let mean = sum / shapes.len().max(1) as f64;
            mean
        }
    };
    let max_tolerance = match max_tolerance {
        Some(max_tolerance) => max_tolerance,
        None => {
            let mut max = 0.0_f64;
            for &shape in &shapes {
                max = max.max(model.shapes().tolerance_max(shape)?);
            }
            max
        }
    };

    let options = SewOptions {
        tolerance,
        max_tolerance,
        cut_free_edges: true,
        non_manifold: true,
    };
    let outcome = kernel.sew(model.shapes_mut(), &shapes, &options)?;

    for (&part, &old) in parts.iter().zip(&shapes) {
        if let Some(new_shape) = outcome.modified(old) {
            model.part_mut(part)?.set_shape(new_shape);
        }
    }

    info!(parts = parts.len(), "sewed parts");
    Ok(OperationOutcome::batch(true, None))
}

/// Splits the parts' shapes with the tool shapes and rebuilds each part in
/// place; a fragmented part receives a compound of all its fragments.
///
/// # Errors
///
/// Returns an error if a part is unknown, the primitive fails outright, or
/// a rebuild resolves some part's shape to a deletion.
pub fn split_parts<K: BooleanKernel>(
    model: &mut Model,
    kernel: &mut K,
    parts: &[PartId],
    tools: &[ShapeId],
    fuzzy: Option<f64>,
) -> Result<OperationOutcome> {
    let arg_shapes = part_shapes(model, parts)?;

    let outcome = kernel.split(model.shapes_mut(), &arg_shapes, tools, fuzzy)?;

    let rebuilder = ShapeRebuilder::new(&outcome.modifications);
    let resolved = rebuilder.resolve_all(model.shapes_mut(), &arg_shapes)?;
    for (&part, new_shape) in parts.iter().zip(resolved) {
        model.part_mut(part)?.set_shape(new_shape);
    }

    info!(parts = parts.len(), done = outcome.is_done, "split parts");
    Ok(OperationOutcome::batch(outcome.is_done, outcome.shape))
}

/// Fuses assemblies as rigid units and rebuilds every involved part.
///
/// Each assembly's parts (optionally expanded through sub-assemblies) are
/// bundled into one compound before the primitive runs, so parts within
/// the same assembly are never fused against each other.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] — before any primitive is
/// invoked — when fewer than two assemblies are given. Also fails if an
/// assembly or part is unknown, the primitive fails outright, or a rebuild
/// resolves some part's shape to a deletion.
pub fn fuse_assemblies<K: BooleanKernel>(
    model: &mut Model,
    kernel: &mut K,
    assemblies: &[AssemblyId],
    fuzzy: Option<f64>,
    include_subassemblies: bool,
) -> Result<OperationOutcome> {
    if assemblies.len() < 2 {
        return Err(OperationError::InvalidInput(
            "not enough assemblies to fuse, need at least two".into(),
        )
        .into());
    }

    let mut all_parts = model.assembly_parts(assemblies[0], include_subassemblies)?;
    let first_shapes = part_shapes(model, &all_parts)?;
    let mut all_shapes = first_shapes.clone();
    let arg_compound = model.shapes_mut().add_compound(first_shapes)?;

    let mut tool_compounds = Vec::with_capacity(assemblies.len() - 1);
    for &assembly in &assemblies[1..] {
        let parts = model.assembly_parts(assembly, include_subassemblies)?;
        let shapes = part_shapes(model, &parts)?;
        all_shapes.extend(shapes.iter().copied());
        all_parts.extend(parts);
        tool_compounds.push(model.shapes_mut().add_compound(shapes)?);
    }

    let outcome = kernel.fuse(model.shapes_mut(), &[arg_compound], &tool_compounds, fuzzy)?;

    let rebuilder = ShapeRebuilder::new(&outcome.modifications);
    let resolved = rebuilder.resolve_all(model.shapes_mut(), &all_shapes)?;
    for (&part, new_shape) in all_parts.iter().zip(resolved) {
        model.part_mut(part)?.set_shape(new_shape);
    }

    info!(
        assemblies = assemblies.len(),
        parts = all_parts.len(),
        done = outcome.is_done,
        "fused assemblies"
    );
    Ok(OperationOutcome::batch(outcome.is_done, outcome.shape))
}

fn part_shapes(model: &Model, parts: &[PartId]) -> Result<Vec<ShapeId>> {
    let mut shapes = Vec::with_capacity(parts.len());
    for &part in parts {
        shapes.push(model.part(part)?.shape());
    }
    Ok(shapes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::script::{Script, ScriptedKernel};
    use super::*;
    use crate::geometry::Segment;
    use crate::math::Point3;
    use crate::structure::{Assembly, Part};
    use crate::topology::ShapeKind;

    fn face_part(model: &mut Model, name: &str) -> PartId {
        let shape = model.shapes_mut().add_leaf(ShapeKind::Face);
        model.add_part(Part::new(name, PartKind::Surface, shape))
    }

    #[test]
    fn fuse_parts_rebuilds_both_groups() {
        let mut model = Model::new();
        let a = face_part(&mut model, "a");
        let b = face_part(&mut model, "b");
        let old_a = model.part(a).unwrap().shape();
        let old_b = model.part(b).unwrap().shape();

        let mut kernel = ScriptedKernel::new([Script::ReplaceEach]);
        let outcome = fuse_parts(&mut model, &mut kernel, &[a], &[b], None).unwrap();

        assert!(outcome.is_done);
        assert!(outcome.shape.is_some());
        assert_ne!(model.part(a).unwrap().shape(), old_a);
        assert_ne!(model.part(b).unwrap().shape(), old_b);
        assert_eq!(kernel.calls, vec!["fuse"]);
    }

    #[test]
    fn cut_parts_records_per_part_failure() {
        let mut model = Model::new();
        let a = face_part(&mut model, "a");
        let b = face_part(&mut model, "b");
        let c = face_part(&mut model, "c");
        let tool = model.shapes_mut().add_leaf(ShapeKind::Solid);

        // The second part does not intersect the tool: its cut is not done.
        let mut kernel = ScriptedKernel::new([
            Script::ReplaceEach,
            Script::NotDone,
            Script::ReplaceEach,
        ]);
        let outcome = cut_parts(&mut model, &mut kernel, &[a, b, c], tool).unwrap();

        assert_eq!(outcome.was_cut(a), Some(true));
        assert_eq!(outcome.was_cut(b), Some(false));
        assert_eq!(outcome.was_cut(c), Some(true));
        assert!(!outcome.is_done);
        // Every part still owns a valid shape.
        for part in [a, b, c] {
            let shape = model.part(part).unwrap().shape();
            assert!(model.shapes().contains(shape));
        }
    }

    #[test]
    fn cut_parts_failure_is_data_not_error() {
        let mut model = Model::new();
        let a = face_part(&mut model, "a");
        let b = face_part(&mut model, "b");
        let tool = model.shapes_mut().add_leaf(ShapeKind::Solid);

        // A kernel error for the first part must not abort the second.
        let mut kernel = ScriptedKernel::new([Script::Fail, Script::ReplaceEach]);
        let outcome = cut_parts(&mut model, &mut kernel, &[a, b], tool).unwrap();

        assert_eq!(outcome.was_cut(a), Some(false));
        assert_eq!(outcome.was_cut(b), Some(true));
    }

    #[test]
    fn cut_outcome_contains_exactly_the_inputs() {
        let mut model = Model::new();
        let a = face_part(&mut model, "a");
        let outsider = face_part(&mut model, "outsider");
        let tool = model.shapes_mut().add_leaf(ShapeKind::Solid);

        let mut kernel = ScriptedKernel::new([Script::ReplaceEach]);
        let outcome = cut_parts(&mut model, &mut kernel, &[a], tool).unwrap();

        assert_eq!(outcome.part_status().len(), 1);
        assert_eq!(outcome.was_cut(outsider), None);
    }

    #[test]
    fn cut_part_deleted_by_kernel_counts_as_failure() {
        let mut model = Model::new();
        let a = face_part(&mut model, "a");
        let old = model.part(a).unwrap().shape();
        let tool = model.shapes_mut().add_leaf(ShapeKind::Solid);

        let mut kernel = ScriptedKernel::new([Script::DeleteAll]);
        let outcome = cut_parts(&mut model, &mut kernel, &[a], tool).unwrap();

        assert_eq!(outcome.was_cut(a), Some(false));
        // The part keeps its previous shape rather than vanishing.
        assert_eq!(model.part(a).unwrap().shape(), old);
    }

    #[test]
    fn sew_leaves_unmodified_parts_untouched() {
        let mut model = Model::new();
        let a = face_part(&mut model, "a");
        let b = face_part(&mut model, "b");
        let old_a = model.part(a).unwrap().shape();
        let old_b = model.part(b).unwrap().shape();

        let mut kernel = ScriptedKernel::new([]);
        kernel.sew_modified_positions = vec![1];
        let outcome = sew_parts(&mut model, &mut kernel, &[a, b], None, None).unwrap();

        assert!(outcome.is_done);
        // Part a keeps the identical shape value; part b was restitched.
        assert_eq!(model.part(a).unwrap().shape(), old_a);
        assert_ne!(model.part(b).unwrap().shape(), old_b);
    }

    #[test]
    fn split_fragments_become_a_compound() {
        let mut model = Model::new();
        let a = face_part(&mut model, "a");

        let mut kernel = ScriptedKernel::new([Script::SplitInto(3)]);
        let outcome = split_parts(&mut model, &mut kernel, &[a], &[], None).unwrap();

        assert!(outcome.is_done);
        let new_shape = model.part(a).unwrap().shape();
        let data = model.shapes().shape(new_shape).unwrap();
        assert_eq!(data.kind, ShapeKind::Compound);
        assert_eq!(data.children.len(), 3);
    }

    #[test]
    fn fuse_assemblies_requires_two() {
        let mut model = Model::new();
        let assy = model.add_assembly(Assembly::new("wing"));

        let mut kernel = ScriptedKernel::new([Script::ReplaceEach]);
        let result = fuse_assemblies(&mut model, &mut kernel, &[assy], None, true);

        assert!(result.is_err());
        assert!(kernel.calls.is_empty(), "no primitive may run");
    }

    #[test]
    fn fuse_assemblies_rebuilds_parts_through_compounds() {
        let mut model = Model::new();
        let a = face_part(&mut model, "a");
        let b = face_part(&mut model, "b");
        let old_a = model.part(a).unwrap().shape();
        let old_b = model.part(b).unwrap().shape();

        let wing = model.add_assembly(Assembly::new("wing"));
        let fuselage = model.add_assembly(Assembly::new("fuselage"));
        model.add_part_to_assembly(wing, a).unwrap();
        model.add_part_to_assembly(fuselage, b).unwrap();

        let mut kernel = ScriptedKernel::new([Script::ReplaceEach]);
        let outcome = fuse_assemblies(&mut model, &mut kernel, &[wing, fuselage], None, true)
            .unwrap();

        assert!(outcome.is_done);
        assert_ne!(model.part(a).unwrap().shape(), old_a);
        assert_ne!(model.part(b).unwrap().shape(), old_b);
    }

    #[test]
    fn fuse_assemblies_includes_subassembly_parts() {
        let mut model = Model::new();
        let a = face_part(&mut model, "a");
        let nested = face_part(&mut model, "nested");
        let b = face_part(&mut model, "b");
        let old_nested = model.part(nested).unwrap().shape();

        let wing = model.add_assembly(Assembly::new("wing"));
        let rib_bay = model.add_assembly(Assembly::new("rib-bay"));
        let fuselage = model.add_assembly(Assembly::new("fuselage"));
        model.add_part_to_assembly(wing, a).unwrap();
        model.add_subassembly(wing, rib_bay).unwrap();
        model.add_part_to_assembly(rib_bay, nested).unwrap();
        model.add_part_to_assembly(fuselage, b).unwrap();

        let mut kernel = ScriptedKernel::new([Script::ReplaceEach]);
        fuse_assemblies(&mut model, &mut kernel, &[wing, fuselage], None, true).unwrap();

        assert_ne!(model.part(nested).unwrap().shape(), old_nested);
    }

    #[test]
    fn fuse_by_cref_rejects_non_surface_parts() {
        let mut model = Model::new();
        let shape = model.shapes_mut().add_leaf(ShapeKind::Solid);
        let solid = model.add_part(Part::new("spar", PartKind::Solid, shape));

        let mut kernel = ScriptedKernel::new([Script::ReplaceEach]);
        let result = fuse_parts_by_cref(&mut model, &mut kernel, &[solid], None);

        assert!(result.is_err());
        assert!(kernel.calls.is_empty(), "no primitive may run");
    }

    #[test]
    fn fuse_by_cref_joins_touching_parts_only() {
        let mut model = Model::new();
        let cref = |x0: f64, y0: f64, x1: f64, y1: f64| {
            Box::new(
                Segment::new(Point3::new(x0, y0, 0.0), Point3::new(x1, y1, 0.0)).unwrap(),
            )
        };
        let shape_a = model.shapes_mut().add_leaf(ShapeKind::Face);
        let shape_b = model.shapes_mut().add_leaf(ShapeKind::Face);
        let shape_c = model.shapes_mut().add_leaf(ShapeKind::Face);
        let a = model.add_part(Part::with_cref(
            "a",
            PartKind::Surface,
            shape_a,
            cref(-1.0, 0.0, 1.0, 0.0),
        ));
        let b = model.add_part(Part::with_cref(
            "b",
            PartKind::Surface,
            shape_b,
            cref(0.0, -1.0, 0.0, 1.0),
        ));
        let c = model.add_part(Part::with_cref(
            "c",
            PartKind::Surface,
            shape_c,
            cref(40.0, 40.0, 50.0, 40.0),
        ));

        let mut kernel = ScriptedKernel::new([Script::ReplaceEach]);
        let outcome =
            fuse_parts_by_cref(&mut model, &mut kernel, &[a, b, c], Some(1.0e-7)).unwrap();

        assert!(outcome.is_done);
        assert_eq!(outcome.part_status().get(&a), Some(&true));
        assert_eq!(kernel.calls, vec!["fuse"], "one multi-tool fuse per group");
        assert_ne!(model.part(a).unwrap().shape(), shape_a);
        assert_ne!(model.part(b).unwrap().shape(), shape_b);
        // The isolated part is untouched.
        assert_eq!(model.part(c).unwrap().shape(), shape_c);
    }

    #[test]
    fn fuse_by_cref_with_no_groups_is_not_done() {
        let mut model = Model::new();
        let shape = model.shapes_mut().add_leaf(ShapeKind::Face);
        let lonely = model.add_part(Part::new("lonely", PartKind::Surface, shape));

        let mut kernel = ScriptedKernel::new([]);
        let outcome = fuse_parts_by_cref(&mut model, &mut kernel, &[lonely], None).unwrap();

        assert!(!outcome.is_done);
        assert!(kernel.calls.is_empty());
    }
}
