//! Topological shape identities.
//!
//! The synchronization layer tracks shapes by stable identity, not by
//! geometric content: a [`ShapeId`] is a generational slotmap key that
//! survives any number of rebuilds, and a [`ShapeData`] records only what
//! the bookkeeping needs — the shape's kind, its direct children (for
//! compounds and other aggregates), and its tolerance.

use slotmap::{new_key_type, SlotMap};

use crate::error::TopologyError;
use crate::math::TOLERANCE;

new_key_type! {
    /// Stable identifier of a topological shape.
    pub struct ShapeId;
}

/// The topological kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Vertex,
    Edge,
    Wire,
    Face,
    Shell,
    Solid,
    Compound,
}

/// Bookkeeping record for one shape.
#[derive(Debug, Clone)]
pub struct ShapeData {
    pub kind: ShapeKind,
    /// Direct children; empty for leaf shapes.
    pub children: Vec<ShapeId>,
    /// Intrinsic imprecision of the shape's geometry.
    pub tolerance: f64,
}

/// Central arena that owns all shape identities.
#[derive(Debug, Default)]
pub struct ShapeStore {
    shapes: SlotMap<ShapeId, ShapeData>,
}

impl ShapeStore {
    /// Creates a new, empty shape store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a leaf shape with the default tolerance and returns its ID.
    pub fn add_leaf(&mut self, kind: ShapeKind) -> ShapeId {
        self.shapes.insert(ShapeData {
            kind,
            children: Vec::new(),
            tolerance: TOLERANCE,
        })
    }

    /// Inserts a leaf shape with an explicit tolerance and returns its ID.
    pub fn add_leaf_with_tolerance(&mut self, kind: ShapeKind, tolerance: f64) -> ShapeId {
        self.shapes.insert(ShapeData {
            kind,
            children: Vec::new(),
            tolerance,
        })
    }

    /// Builds a compound aggregating the given shapes.
    ///
    /// # Errors
    ///
    /// Returns an error if any child is not found in the store.
    pub fn add_compound(&mut self, children: Vec<ShapeId>) -> crate::error::Result<ShapeId> {
        for &child in &children {
            self.shape(child)?;
        }
        Ok(self.shapes.insert(ShapeData {
            kind: ShapeKind::Compound,
            children,
            tolerance: TOLERANCE,
        }))
    }

    /// Returns a reference to the shape data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is not found in the store.
    pub fn shape(&self, id: ShapeId) -> Result<&ShapeData, TopologyError> {
        self.shapes
            .get(id)
            .ok_or_else(|| TopologyError::ShapeNotFound(format!("{id:?}")))
    }

    /// Returns a mutable reference to the shape data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is not found in the store.
    pub fn shape_mut(&mut self, id: ShapeId) -> Result<&mut ShapeData, TopologyError> {
        self.shapes
            .get_mut(id)
            .ok_or_else(|| TopologyError::ShapeNotFound(format!("{id:?}")))
    }

    /// Returns whether the store contains the shape.
    #[must_use]
    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(id)
    }

    /// Sets the tolerance of a shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is not found in the store.
    pub fn set_tolerance(&mut self, id: ShapeId, tolerance: f64) -> Result<(), TopologyError> {
        self.shape_mut(id)?.tolerance = tolerance;
        Ok(())
    }

    /// Collects the leaf shapes of `id` (the shape itself if it has no
    /// children), depth-first.
    ///
    /// # Errors
    ///
    /// Returns an error if any shape in the hierarchy is not found.
    pub fn leaves(&self, id: ShapeId) -> Result<Vec<ShapeId>, TopologyError> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let data = self.shape(current)?;
            if data.children.is_empty() {
                out.push(current);
            } else {
                // Reversed so the traversal visits children in order.
                stack.extend(data.children.iter().rev().copied());
            }
        }
        Ok(out)
    }

    /// Minimum tolerance over the leaf shapes of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if any shape in the hierarchy is not found.
    pub fn tolerance_min(&self, id: ShapeId) -> Result<f64, TopologyError> {
        let leaves = self.leaves(id)?;
        let mut min = f64::INFINITY;
        for leaf in leaves {
            min = min.min(self.shape(leaf)?.tolerance);
        }
        Ok(if min.is_finite() { min } else { TOLERANCE })
    }

    /// Maximum tolerance over the leaf shapes of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if any shape in the hierarchy is not found.
    pub fn tolerance_max(&self, id: ShapeId) -> Result<f64, TopologyError> {
        let leaves = self.leaves(id)?;
        let mut max = 0.0_f64;
        for leaf in leaves {
            max = max.max(self.shape(leaf)?.tolerance);
        }
        Ok(if max > 0.0 { max } else { TOLERANCE })
    }

    /// Arithmetic mean tolerance over the leaf shapes of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if any shape in the hierarchy is not found.
    pub fn tolerance_mean(&self, id: ShapeId) -> Result<f64, TopologyError> {
        let leaves = self.leaves(id)?;
        if leaves.is_empty() {
            return Ok(TOLERANCE);
        }
        let mut sum = 0.0;
        for &leaf in &leaves {
            sum += self.shape(leaf)?.tolerance;
        }
        #[allow(clippy::cast_precision_loss)]
        Ok(sum / leaves.len() as f64)
    }
}
