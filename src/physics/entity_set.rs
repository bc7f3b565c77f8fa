use super::{Collider, RigidBody};

use itertools::Itertools;
use thunderdome as td;

/// Key type to look up a collider stored in the physics manager.
///
/// Keys are generational, so a key to a removed collider never accidentally
/// refers to a newer collider that reused its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColliderKey(pub(crate) td::Index);

impl ColliderKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    /// Useful for creating your own mappings from colliders to other things
    /// such as game entities.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Key type to look up a rigid body stored in the physics manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyKey(pub(crate) td::Index);

impl BodyKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Storage for everything in the physics world, comprised of bodies and colliders.
///
/// Bodies refer to their colliders by key and every collider knows
/// which body (if any) it's attached to. Both directions are kept in sync here.
#[derive(Default)]
pub struct EntitySet {
    pub(super) bodies: td::Arena<RigidBody>,
    pub(super) colliders: td::Arena<Collider>,
    pub(super) coll_bodies: td::Arena<BodyKey>,
}

impl EntitySet {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Access a [`RigidBody`][super::RigidBody], if it still exists.
    #[inline]
    pub fn get_body(&self, body: BodyKey) -> Option<&RigidBody> {
        self.bodies.get(body.0)
    }

    /// Mutably access a [`RigidBody`][super::RigidBody], if it still exists.
    #[inline]
    pub fn get_body_mut(&mut self, body: BodyKey) -> Option<&mut RigidBody> {
        self.bodies.get_mut(body.0)
    }

    /// Access a [`Collider`][super::Collider], if it still exists.
    #[inline]
    pub fn get_collider(&self, coll: ColliderKey) -> Option<&Collider> {
        self.colliders.get(coll.0)
    }

    /// Mutably access a [`Collider`][super::Collider], if it still exists.
    #[inline]
    pub fn get_collider_mut(&mut self, coll: ColliderKey) -> Option<&mut Collider> {
        self.colliders.get_mut(coll.0)
    }

    /// The body a collider is attached to, if both still exist.
    #[inline]
    pub fn get_collider_body(&self, coll: ColliderKey) -> Option<BodyKey> {
        self.coll_bodies
            .get(coll.0)
            .copied()
            .filter(|b| self.bodies.contains(b.0))
    }

    pub fn insert_collider(&mut self, coll: Collider) -> ColliderKey {
        ColliderKey(self.colliders.insert(coll))
    }

    /// Insert a body, attaching the colliders it lists.
    /// Colliders previously attached to another body are moved over.
    /// Repeated keys in the body's list are only attached once.
    pub fn insert_body(&mut self, mut body: RigidBody) -> BodyKey {
        body.colliders = body.colliders.iter().copied().unique().collect();
        let coll_keys = body.colliders.clone();
        let key = BodyKey(self.bodies.insert(body));
        for coll in coll_keys {
            if let Some(prev) = self.coll_bodies.insert_at(coll.0, key) {
                if prev == key {
                    continue;
                }
                if let Some(prev_body) = self.bodies.get_mut(prev.0) {
                    prev_body.colliders.retain(|c| *c != coll);
                }
            }
        }
        key
    }

    /// Remove a [`RigidBody`][super::RigidBody], returning it if it still existed.
    /// Its colliders stay in the world, detached.
    pub fn remove_body(&mut self, body: BodyKey) -> Option<RigidBody> {
        let removed = self.bodies.remove(body.0)?;
        for coll in &removed.colliders {
            if self.coll_bodies.get(coll.0) == Some(&body) {
                self.coll_bodies.remove(coll.0);
            }
        }
        Some(removed)
    }

    /// Remove a [`Collider`][super::Collider], returning it if it still existed.
    /// It's also removed from the collider list of the body it was attached to.
    pub fn remove_collider(&mut self, coll: ColliderKey) -> Option<Collider> {
        if let Some(body) = self.coll_bodies.remove(coll.0) {
            if let Some(rb) = self.bodies.get_mut(body.0) {
                rb.colliders.retain(|c| *c != coll);
            }
        }
        self.colliders.remove(coll.0)
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // not exposed to users, must use through PhysicsManager::clear
    pub(super) fn clear(&mut self) {
        self.bodies.clear();
        self.colliders.clear();
        self.coll_bodies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{collision::ColliderDesc, RigidBodyDesc};

    fn collider() -> Collider {
        Collider::from_desc(ColliderDesc::default().with_physics(true)).unwrap()
    }

    #[test]
    fn attachment_is_kept_in_sync() {
        let mut set = EntitySet::new();
        let c1 = set.insert_collider(collider());
        let c2 = set.insert_collider(collider());
        let b1 = set.insert_body(
            RigidBody::from_desc(RigidBodyDesc::new_static().with_colliders([c1, c2])).unwrap(),
        );
        assert_eq!(set.get_collider_body(c1), Some(b1));

        // stealing a collider detaches it from the old body
        let b2 = set.insert_body(
            RigidBody::from_desc(RigidBodyDesc::new_kinematic().with_colliders([c2])).unwrap(),
        );
        assert_eq!(set.get_collider_body(c2), Some(b2));
        assert_eq!(set.get_body(b1).unwrap().colliders(), &[c1]);

        set.remove_collider(c1);
        assert!(set.get_body(b1).unwrap().colliders().is_empty());

        set.remove_body(b2);
        assert_eq!(set.get_collider_body(c2), None);
        assert!(set.get_collider(c2).is_some());
    }

    #[test]
    fn repeated_collider_keys_attach_once() {
        let mut set = EntitySet::new();
        let c1 = set.insert_collider(collider());
        let c2 = set.insert_collider(collider());
        let b = set.insert_body(
            RigidBody::from_desc(RigidBodyDesc::new_dynamic(1.0).with_colliders([c1, c2, c2]))
                .unwrap(),
        );
        assert_eq!(set.get_body(b).unwrap().colliders(), &[c1, c2]);
        assert_eq!(set.get_collider_body(c2), Some(b));

        let only = set.insert_body(
            RigidBody::from_desc(RigidBodyDesc::new_static().with_colliders([c1, c1])).unwrap(),
        );
        assert_eq!(set.get_body(only).unwrap().colliders(), &[c1]);
        assert_eq!(set.get_body(b).unwrap().colliders(), &[c2]);
    }

    #[test]
    fn removed_keys_stay_dead() {
        let mut set = EntitySet::new();
        let c1 = set.insert_collider(collider());
        set.remove_collider(c1);
        let c2 = set.insert_collider(collider());
        assert_ne!(c1, c2);
        assert!(set.get_collider(c1).is_none());
        assert!(set.remove_collider(c1).is_none());
        assert_eq!(set.collider_count(), 1);
    }
}
