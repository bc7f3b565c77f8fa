//! Broad phase collision detection algorithms
//! are responsible for detecting pairs of possibly intersecting objects
//! for further, more accurate narrow phase inspection.

use super::{LayerId, LayerMatrix, AABB};

/// What the broad phase needs to know about a collider.
#[derive(Clone, Copy, Debug)]
pub struct BroadPhaseItem {
    pub aabb: AABB,
    pub layer: LayerId,
    pub update_collisions: bool,
}

impl BroadPhaseItem {
    /// Whether two items are allowed to be paired at all, regardless of position.
    /// At least one of them must want collision updates and their layers must be compatible.
    #[inline]
    pub fn may_pair_with(&self, other: &Self, layers: &LayerMatrix) -> bool {
        (self.update_collisions || other.update_collisions) && layers.allows(self.layer, other.layer)
    }
}

/// A broad phase algorithm.
///
/// Pairs are returned as indices into the `items` slice, each pair at most once
/// as `[lower, higher]` in ascending order, and never an item paired with itself.
pub trait BroadPhase {
    /// Returns pairs of potentially intersecting objects.
    fn pairs(&mut self, items: &[BroadPhaseItem], layers: &LayerMatrix) -> Vec<[usize; 2]>;
}

/// The simplest possible broad phase algorithm,
/// which pairs every object with every other object.
/// Very inefficient, but can work for small systems and is useful for debugging the grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct BruteForce;

impl BroadPhase for BruteForce {
    fn pairs(&mut self, items: &[BroadPhaseItem], layers: &LayerMatrix) -> Vec<[usize; 2]> {
        let mut pairs = Vec::new();
        for (i, b1) in items.iter().enumerate() {
            for (j, b2) in items.iter().enumerate().skip(i + 1) {
                if b1.may_pair_with(b2, layers) {
                    pairs.push([i, j]);
                }
            }
        }

        pairs
    }
}
