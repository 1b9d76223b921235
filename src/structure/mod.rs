//! Structural part and assembly entities.
//!
//! A [`Part`] is a named structural member whose identity outlives every
//! topological rewrite: synchronization operations replace the `shape`
//! a part points at, never the part itself. Parts and assemblies live in
//! slotmap arenas owned by a [`Model`], alongside the shape store.

use slotmap::{new_key_type, SlotMap};
use tracing::debug;

use crate::error::{Result, StructureError};
use crate::geometry::Curve;
use crate::operations::{BooleanKernel, ShapeRebuilder};
use crate::topology::{ShapeId, ShapeStore};

new_key_type! {
    /// Stable identifier of a part.
    pub struct PartId;

    /// Stable identifier of an assembly.
    pub struct AssemblyId;
}

/// The geometric flavor of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Curve,
    Surface,
    Solid,
}

/// A named structural member.
#[derive(Debug)]
pub struct Part {
    name: String,
    kind: PartKind,
    shape: ShapeId,
    cref: Option<Box<dyn Curve>>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PartKind, shape: ShapeId) -> Self {
        Self {
            name: name.into(),
            kind,
            shape,
            cref: None,
        }
    }

    /// Creates a new part carrying a reference curve.
    #[must_use]
    pub fn with_cref(
        name: impl Into<String>,
        kind: PartKind,
        shape: ShapeId,
        cref: Box<dyn Curve>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            shape,
            cref: Some(cref),
        }
    }

    /// Returns the part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the part kind.
    #[must_use]
    pub fn kind(&self) -> PartKind {
        self.kind
    }

    /// Returns the current shape of the part.
    #[must_use]
    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    /// Rewrites the shape of the part.
    pub fn set_shape(&mut self, shape: ShapeId) {
        self.shape = shape;
    }

    /// Returns the reference curve, if the part has one.
    #[must_use]
    pub fn cref(&self) -> Option<&dyn Curve> {
        self.cref.as_deref()
    }

    /// Returns whether the part has a reference curve.
    #[must_use]
    pub fn has_cref(&self) -> bool {
        self.cref.is_some()
    }
}

/// A container of parts and nested sub-assemblies.
#[derive(Debug, Default)]
pub struct Assembly {
    name: String,
    parts: Vec<PartId>,
    subassemblies: Vec<AssemblyId>,
}

impl Assembly {
    /// Creates a new, empty assembly.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: Vec::new(),
            subassemblies: Vec::new(),
        }
    }

    /// Returns the assembly name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the directly contained parts, in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[PartId] {
        &self.parts
    }

    /// Returns the directly nested sub-assemblies, in insertion order.
    #[must_use]
    pub fn subassemblies(&self) -> &[AssemblyId] {
        &self.subassemblies
    }
}

/// One structural model: the shape store plus the part/assembly arenas.
#[derive(Debug, Default)]
pub struct Model {
    shapes: ShapeStore,
    parts: SlotMap<PartId, Part>,
    assemblies: SlotMap<AssemblyId, Assembly>,
}

impl Model {
    /// Creates a new, empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shape store.
    #[must_use]
    pub fn shapes(&self) -> &ShapeStore {
        &self.shapes
    }

    /// Returns the shape store mutably.
    pub fn shapes_mut(&mut self) -> &mut ShapeStore {
        &mut self.shapes
    }

    /// Inserts a part and returns its ID.
    pub fn add_part(&mut self, part: Part) -> PartId {
        self.parts.insert(part)
    }

    /// Returns a reference to a part, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the part is not found in the model.
    pub fn part(&self, id: PartId) -> Result<&Part> {
        self.parts
            .get(id)
            .ok_or_else(|| StructureError::PartNotFound(format!("{id:?}")).into())
    }

    /// Returns a mutable reference to a part, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the part is not found in the model.
    pub fn part_mut(&mut self, id: PartId) -> Result<&mut Part> {
        self.parts
            .get_mut(id)
            .ok_or_else(|| StructureError::PartNotFound(format!("{id:?}")).into())
    }

    /// Inserts an assembly and returns its ID.
    pub fn add_assembly(&mut self, assembly: Assembly) -> AssemblyId {
        self.assemblies.insert(assembly)
    }

    /// Returns a reference to an assembly, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the assembly is not found in the model.
    pub fn assembly(&self, id: AssemblyId) -> Result<&Assembly> {
        self.assemblies
            .get(id)
            .ok_or_else(|| StructureError::AssemblyNotFound(format!("{id:?}")).into())
    }

    /// Adds a part to an assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if the assembly or the part is not found.
    pub fn add_part_to_assembly(&mut self, assembly: AssemblyId, part: PartId) -> Result<()> {
        self.part(part)?;
        let assembly = self
            .assemblies
            .get_mut(assembly)
            .ok_or_else(|| StructureError::AssemblyNotFound(format!("{assembly:?}")))?;
        assembly.parts.push(part);
        Ok(())
    }

    /// Nests `child` under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if either assembly is not found.
    pub fn add_subassembly(&mut self, parent: AssemblyId, child: AssemblyId) -> Result<()> {
        self.assembly(child)?;
        let parent = self
            .assemblies
            .get_mut(parent)
            .ok_or_else(|| StructureError::AssemblyNotFound(format!("{parent:?}")))?;
        parent.subassemblies.push(child);
        Ok(())
    }

    /// Returns the parts of an assembly in insertion order; when
    /// `recursive`, parts of nested sub-assemblies follow their parent's
    /// own parts, depth-first.
    ///
    /// # Errors
    ///
    /// Returns an error if any assembly in the hierarchy is not found.
    pub fn assembly_parts(&self, id: AssemblyId, recursive: bool) -> Result<Vec<PartId>> {
        let assembly = self.assembly(id)?;
        let mut out = assembly.parts.clone();
        if recursive {
            for &child in &assembly.subassemblies {
                out.extend(self.assembly_parts(child, true)?);
            }
        }
        Ok(out)
    }

    /// Cuts one part with a tool shape and rebuilds the part in place.
    ///
    /// Returns whether the cut succeeded. A kernel that reports "not done"
    /// yields `Ok(false)` and leaves the part untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the part is unknown, the kernel fails outright,
    /// or the rebuild resolves the part's shape to a deletion.
    pub fn cut_part<K: BooleanKernel>(
        &mut self,
        part: PartId,
        kernel: &mut K,
        tool: ShapeId,
    ) -> Result<bool> {
        let old = self.part(part)?.shape();
        let outcome = kernel.cut(&mut self.shapes, &[old], &[tool], None)?;
        if !outcome.is_done {
            debug!(part = ?part, "cut not done");
            return Ok(false);
        }
        let rebuilder = ShapeRebuilder::new(&outcome.modifications);
        let new_shape = rebuilder.resolve(&mut self.shapes, old)?;
        self.part_mut(part)?.set_shape(new_shape);
        Ok(true)
    }

    /// Fuses one part with a group of other parts and rebuilds all of them
    /// in place.
    ///
    /// Returns whether the fuse succeeded. A kernel that reports "not done"
    /// yields `Ok(false)` and leaves every part untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if any part is unknown, the kernel fails outright,
    /// or a rebuild resolves some part's shape to a deletion.
    pub fn fuse_part<K: BooleanKernel>(
        &mut self,
        main: PartId,
        others: &[PartId],
        kernel: &mut K,
        fuzzy: Option<f64>,
    ) -> Result<bool> {
        let main_shape = self.part(main)?.shape();
        let mut tool_shapes = Vec::with_capacity(others.len());
        for &other in others {
            tool_shapes.push(self.part(other)?.shape());
        }

        let outcome = kernel.fuse(&mut self.shapes, &[main_shape], &tool_shapes, fuzzy)?;
        if !outcome.is_done {
            debug!(part = ?main, "fuse not done");
            return Ok(false);
        }

        let rebuilder = ShapeRebuilder::new(&outcome.modifications);
        let mut originals = vec![main_shape];
        originals.extend_from_slice(&tool_shapes);
        let resolved = rebuilder.resolve_all(&mut self.shapes, &originals)?;

        let all_parts: Vec<PartId> = std::iter::once(main).chain(others.iter().copied()).collect();
        for (part, new_shape) in all_parts.into_iter().zip(resolved) {
            self.part_mut(part)?.set_shape(new_shape);
        }
        Ok(true)
    }
}
