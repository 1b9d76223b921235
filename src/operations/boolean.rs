//! Contract for the boolean/sewing primitives and their modification maps.
//!
//! The geometric kernel behind fuse/cut/split/sew is an external
//! collaborator: this crate defines the [`BooleanKernel`] seam the
//! synchronization operations drive, and the [`ModificationMap`] relation
//! every primitive must report so original shapes can be re-identified.

use std::collections::HashMap;

use crate::error::Result;
use crate::topology::{ShapeId, ShapeStore};

/// The old-shape to new-shape(s) relation reported by a primitive.
///
/// A shape absent from the map was not touched by the operation. A shape
/// mapped to an empty list was deleted. One entry means the shape was
/// replaced (or merely relocated); several mean it was fragmented.
///
/// Kernels must record entries for shapes nested one level inside a
/// compound input, so callers can query the map by the shapes they know
/// rather than by the compounds they bundled them into.
#[derive(Debug, Default, Clone)]
pub struct ModificationMap {
    entries: HashMap<ShapeId, Vec<ShapeId>>,
}

impl ModificationMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the replacement(s) of `old`.
    pub fn record(&mut self, old: ShapeId, replacements: impl IntoIterator<Item = ShapeId>) {
        self.entries
            .entry(old)
            .or_default()
            .extend(replacements);
    }

    /// Records `old` as deleted with no replacement.
    pub fn record_deleted(&mut self, old: ShapeId) {
        self.entries.entry(old).or_default();
    }

    /// Returns the recorded replacements of `old`, or `None` if the shape
    /// was not touched.
    #[must_use]
    pub fn generated(&self, old: ShapeId) -> Option<&[ShapeId]> {
        self.entries.get(&old).map(Vec::as_slice)
    }

    /// Returns whether `old` is recorded as deleted.
    #[must_use]
    pub fn is_deleted(&self, old: ShapeId) -> bool {
        self.entries.get(&old).is_some_and(Vec::is_empty)
    }

    /// Iterates over the recorded old shapes.
    pub fn keys(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.entries.keys().copied()
    }

    /// Returns whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one fuse/cut/split invocation.
#[derive(Debug)]
pub struct BooleanOutcome {
    /// Whether the primitive completed.
    pub is_done: bool,
    /// The aggregate result shape, when the primitive produces one.
    pub shape: Option<ShapeId>,
    /// The old-to-new shape relation.
    pub modifications: ModificationMap,
}

/// Configuration for a sewing pass.
#[derive(Debug, Clone, Copy)]
pub struct SewOptions {
    /// Working tolerance for stitching near-coincident edges.
    pub tolerance: f64,
    /// Upper bound on the tolerance the sew may inflate to.
    pub max_tolerance: f64,
    /// Close remaining free edges after stitching.
    pub cut_free_edges: bool,
    /// Permit non-manifold results.
    pub non_manifold: bool,
}

/// Result of one sewing invocation: which inputs were restitched.
#[derive(Debug, Default)]
pub struct SewOutcome {
    modified: HashMap<ShapeId, ShapeId>,
}

impl SewOutcome {
    /// Creates an empty outcome.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the sewn replacement of `old`.
    pub fn record(&mut self, old: ShapeId, new: ShapeId) {
        self.modified.insert(old, new);
    }

    /// Returns whether the sew modified `old`.
    #[must_use]
    pub fn is_modified(&self, old: ShapeId) -> bool {
        self.modified.contains_key(&old)
    }

    /// Returns the sewn replacement of `old`, if it was modified.
    #[must_use]
    pub fn modified(&self, old: ShapeId) -> Option<ShapeId> {
        self.modified.get(&old).copied()
    }
}

/// The boolean/sewing primitive seam.
///
/// Implementations own whatever geometric state the primitives need; the
/// synchronization operations only rely on the reported outcomes. All four
/// operations are synchronous and exclusively own the kernel for the
/// duration of one call.
pub trait BooleanKernel {
    /// Boolean union of `args` with `tools`.
    ///
    /// # Errors
    ///
    /// Returns an error if the primitive fails outright; an unconverged
    /// result is reported through `is_done` instead.
    fn fuse(
        &mut self,
        store: &mut ShapeStore,
        args: &[ShapeId],
        tools: &[ShapeId],
        fuzzy: Option<f64>,
    ) -> Result<BooleanOutcome>;

    /// Boolean subtraction of `tools` from `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if the primitive fails outright; an unconverged
    /// result is reported through `is_done` instead.
    fn cut(
        &mut self,
        store: &mut ShapeStore,
        args: &[ShapeId],
        tools: &[ShapeId],
        fuzzy: Option<f64>,
    ) -> Result<BooleanOutcome>;

    /// Partition of `args` by `tools`, keeping all fragments.
    ///
    /// # Errors
    ///
    /// Returns an error if the primitive fails outright; an unconverged
    /// result is reported through `is_done` instead.
    fn split(
        &mut self,
        store: &mut ShapeStore,
        args: &[ShapeId],
        tools: &[ShapeId],
        fuzzy: Option<f64>,
    ) -> Result<BooleanOutcome>;

    /// Stitches near-coincident edges of `shapes` into connected topology.
    ///
    /// # Errors
    ///
    /// Returns an error if the primitive fails outright.
    fn sew(
        &mut self,
        store: &mut ShapeStore,
        shapes: &[ShapeId],
        options: &SewOptions,
    ) -> Result<SewOutcome>;
}
