//! Re-identification of shapes after a destructive operation.
//!
//! A boolean primitive rewrites topology wholesale; the rebuilder answers,
//! per original shape, what stands in its place afterwards. Chains of
//! modification (old replaced by an intermediate that was itself replaced)
//! are collapsed once at construction, so every query afterwards is a
//! plain lookup.

use std::collections::{HashMap, HashSet};

use crate::error::{OperationError, Result};
use crate::topology::{ShapeId, ShapeStore};

use super::boolean::ModificationMap;

#[derive(Debug)]
enum Resolution {
    Deleted,
    Replaced(Vec<ShapeId>),
}

/// Resolves original shapes to their final replacements.
#[derive(Debug)]
pub struct ShapeRebuilder {
    resolved: HashMap<ShapeId, Resolution>,
}

impl ShapeRebuilder {
    /// Collapses the modification relation into terminal replacements.
    #[must_use]
    pub fn new(map: &ModificationMap) -> Self {
        let mut resolved = HashMap::new();
        for old in map.keys() {
            let mut terminals = Vec::new();
            let mut visited = HashSet::new();
            collect_terminals(map, old, &mut visited, &mut terminals);
            let resolution = if terminals.is_empty() {
                Resolution::Deleted
            } else {
                Resolution::Replaced(terminals)
            };
            resolved.insert(old, resolution);
        }
        Self { resolved }
    }

    /// Resolves one original shape.
    ///
    /// An untouched shape resolves to itself. A fragmented shape resolves
    /// to a fresh compound aggregating all fragments, so the owning part
    /// still holds exactly one shape value.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape was deleted with no replacement — a
    /// part must never silently vanish — or if compound construction fails.
    pub fn resolve(&self, store: &mut ShapeStore, original: ShapeId) -> Result<ShapeId> {
        match self.resolved.get(&original) {
            None => Ok(original),
            Some(Resolution::Deleted) => {
                Err(OperationError::ShapeDeleted(format!("{original:?}")).into())
            }
            Some(Resolution::Replaced(terminals)) => {
                if let [single] = terminals.as_slice() {
                    Ok(*single)
                } else {
                    store.add_compound(terminals.clone())
                }
            }
        }
    }

    /// Resolves a list of original shapes in one call.
    ///
    /// # Errors
    ///
    /// Fails on the first shape that resolves to a deletion.
    pub fn resolve_all(
        &self,
        store: &mut ShapeStore,
        originals: &[ShapeId],
    ) -> Result<Vec<ShapeId>> {
        let mut out = Vec::with_capacity(originals.len());
        for &original in originals {
            out.push(self.resolve(store, original)?);
        }
        Ok(out)
    }
}

/// Follows modification chains from `id` down to shapes that were not
/// themselves replaced. The visited set guards against cycles and
/// deduplicates fragments reachable along several chains.
fn collect_terminals(
    map: &ModificationMap,
    id: ShapeId,
    visited: &mut HashSet<ShapeId>,
    out: &mut Vec<ShapeId>,
) {
    if !visited.insert(id) {
        return;
    }
    match map.generated(id) {
        None => out.push(id),
        Some(replacements) => {
            for &next in replacements {
                if next == id {
                    // Self-mapped: the primitive reports the shape as its
                    // own replacement (relocated in place).
                    out.push(id);
                } else {
                    collect_terminals(map, next, visited, out);
                }
            }
        }
    }
}
