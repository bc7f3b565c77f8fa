//! Per-tick storage of which colliders touched which.

use super::LayerId;
use crate::{math as m, physics::ColliderKey};
use std::collections::HashMap;

/// One side of an overlap between two colliders.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    /// The collider this fact is stored under.
    pub local: ColliderKey,
    /// The collider it overlaps with.
    pub remote: ColliderKey,
    /// Layer of the remote collider at the time of the test.
    pub remote_layer: LayerId,
    /// Smallest translation that moves `local` out of `remote`.
    pub resolution: m::Vec2,
}

/// Collisions of the last tick, looked up by collider.
///
/// Every overlap is stored twice, once from each side,
/// with resolution vectors that are exact negations of each other.
#[derive(Clone, Debug, Default)]
pub struct CollisionIndex {
    by_collider: HashMap<ColliderKey, Vec<Collision>>,
}

impl CollisionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every collision, keeping allocations around for the next tick.
    pub fn clear(&mut self) {
        for list in self.by_collider.values_mut() {
            list.clear();
        }
    }

    /// Record an overlap from both sides.
    /// `resolution` moves `a` out of `b`.
    pub fn insert_pair(
        &mut self,
        (a, a_layer): (ColliderKey, LayerId),
        (b, b_layer): (ColliderKey, LayerId),
        resolution: m::Vec2,
    ) {
        debug_assert!(a != b, "a collider can't collide with itself");
        self.by_collider.entry(a).or_default().push(Collision {
            local: a,
            remote: b,
            remote_layer: b_layer,
            resolution,
        });
        self.by_collider.entry(b).or_default().push(Collision {
            local: b,
            remote: a,
            remote_layer: a_layer,
            resolution: -resolution,
        });
    }

    /// Collisions involving a collider. Empty for unknown or removed colliders.
    pub fn get(&self, key: ColliderKey) -> &[Collision] {
        self.by_collider
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Collisions involving a collider where the other collider is on the given layer.
    pub fn with_layer(
        &self,
        key: ColliderKey,
        layer: LayerId,
    ) -> impl '_ + Iterator<Item = &'_ Collision> {
        self.get(key).iter().filter(move |c| c.remote_layer == layer)
    }

    /// Remove a collider's own list and every fact referring to it.
    pub fn purge(&mut self, key: ColliderKey) {
        if let Some(own) = self.by_collider.remove(&key) {
            for coll in own {
                if let Some(list) = self.by_collider.get_mut(&coll.remote) {
                    list.retain(|c| c.remote != key);
                }
            }
        }
    }

    /// Total number of stored collision facts, counting both sides.
    pub fn len(&self) -> usize {
        self.by_collider.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_collider.values().all(Vec::is_empty)
    }
}
