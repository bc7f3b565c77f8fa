//! Collision detection and rigid body movement, advanced one fixed tick at a time.

use crate::{
    error::{PhysicsError, Result},
    math as m,
    timestep::{PhysicsFramerate, StepClock},
};
use std::time::Duration;

//

pub(crate) mod bitmatrix;

pub mod collision;
use collision::{narrowphase, BroadPhase, BroadPhaseItem, BruteForce, CollisionIndex, SpatialGrid};
pub use collision::{
    Collider, ColliderDesc, ColliderShape, Collision, CollisionMethod, GridParams, LayerId,
    LayerMatrix, AABB,
};

mod entity_set;
use entity_set::EntitySet;
pub use entity_set::{BodyKey, ColliderKey};

pub mod rigidbody;
pub use rigidbody::{BodyType, RigidBody, RigidBodyDesc};

mod shared;
pub use shared::SharedPhysics;

//

/// Which broad phase algorithm generates candidate pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum BroadPhaseMethod {
    #[default]
    SpatialGrid,
    /// Test every pair. Same results as the grid, only slower.
    BruteForce,
}

/// Everything that's decided once when creating a [`PhysicsManager`][self::PhysicsManager].
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PhysicsConfig {
    pub collision_method: CollisionMethod,
    pub broad_phase_method: BroadPhaseMethod,
    /// Pairs of layer names that collide with each other.
    /// If not set, every layer collides with every layer.
    pub layer_matrix: Option<Vec<(String, String)>>,
    pub grid: GridParams,
    /// Rate of the fixed ticks run by [`advance`][PhysicsManager::advance].
    pub framerate: PhysicsFramerate,
    /// Multiplier for the time step. Zero freezes everything.
    pub time_scale: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            collision_method: CollisionMethod::Sat,
            broad_phase_method: BroadPhaseMethod::SpatialGrid,
            layer_matrix: None,
            grid: GridParams::default(),
            framerate: PhysicsFramerate::Hz60,
            time_scale: 1.0,
        }
    }
}

enum ActiveBroadPhase {
    Grid(SpatialGrid),
    BruteForce(BruteForce),
}

impl ActiveBroadPhase {
    fn as_dyn(&mut self) -> &mut dyn BroadPhase {
        match self {
            ActiveBroadPhase::Grid(grid) => grid as &mut dyn BroadPhase,
            ActiveBroadPhase::BruteForce(bf) => bf as &mut dyn BroadPhase,
        }
    }
}

/// Owner of every collider and rigid body, and the entry point for ticking physics.
///
/// Colliders and bodies are referred to by generational keys and accessed through
/// [`collider_mut`][Self::collider_mut] and [`body_mut`][Self::body_mut] to move them around.
/// Each call to [`resolve`][Self::resolve] rebuilds the collision index from scratch,
/// so queries always describe the last completed tick.
pub struct PhysicsManager {
    collision_method: CollisionMethod,
    broad_phase: ActiveBroadPhase,
    layers: LayerMatrix,
    entities: EntitySet,
    index: CollisionIndex,
    clock: StepClock,
    time_scale: f64,
    // reused every tick
    items: Vec<BroadPhaseItem>,
    item_keys: Vec<ColliderKey>,
}

fn check_time_scale(time_scale: f64) -> Result<()> {
    if time_scale.is_finite() && time_scale >= 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidTimeScale(time_scale))
    }
}

impl PhysicsManager {
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        check_time_scale(config.time_scale)?;
        if let Some(size) = config.grid.cell_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(PhysicsError::InvalidCellSize(size));
            }
        }

        let layers = match &config.layer_matrix {
            Some(pairs) => LayerMatrix::from_pairs(
                pairs.iter().map(|(a, b)| (a.as_str(), b.as_str())),
            ),
            None => LayerMatrix::allow_all(),
        };
        let broad_phase = match config.broad_phase_method {
            BroadPhaseMethod::SpatialGrid => ActiveBroadPhase::Grid(SpatialGrid::new(config.grid)),
            BroadPhaseMethod::BruteForce => ActiveBroadPhase::BruteForce(BruteForce),
        };

        log::debug!(
            "Created physics manager: {:?} + {:?} at {} Hz",
            config.broad_phase_method,
            config.collision_method,
            config.framerate.hz()
        );

        Ok(PhysicsManager {
            collision_method: config.collision_method,
            broad_phase,
            layers,
            entities: EntitySet::new(),
            index: CollisionIndex::new(),
            clock: StepClock::new(config.framerate),
            time_scale: config.time_scale,
            items: Vec::new(),
            item_keys: Vec::new(),
        })
    }

    //
    // colliders
    //

    /// Add a collider. It takes part in collision detection from the next tick on.
    pub fn add_collider(&mut self, desc: ColliderDesc) -> Result<ColliderKey> {
        let coll = Collider::from_desc(desc)?;
        self.layers.intern(&coll.layer);
        log::trace!("Adding {} collider on layer {:?}", coll.shape().kind_name(), coll.layer);
        Ok(self.entities.insert_collider(coll))
    }

    /// Remove a collider, returning it if it still existed.
    ///
    /// Any collisions involving it are forgotten immediately, and it's detached
    /// from the body it belonged to. Unknown keys are ignored.
    pub fn remove_collider(&mut self, key: ColliderKey) -> Option<Collider> {
        let removed = self.entities.remove_collider(key)?;
        self.index.purge(key);
        log::trace!("Removed collider {key:?}");
        Some(removed)
    }

    #[inline]
    pub fn collider(&self, key: ColliderKey) -> Option<&Collider> {
        self.entities.get_collider(key)
    }

    /// Mutable access to a collider, for moving it or changing its layer or flags.
    #[inline]
    pub fn collider_mut(&mut self, key: ColliderKey) -> Option<&mut Collider> {
        self.entities.get_collider_mut(key)
    }

    /// Iterate over all active colliders.
    pub fn colliders(&self) -> impl '_ + Iterator<Item = (ColliderKey, &'_ Collider)> {
        self.entities
            .colliders
            .iter()
            .filter(|(_, coll)| coll.active)
            .map(|(idx, coll)| (ColliderKey(idx), coll))
    }

    /// The group (usually the owning entity) of a collider.
    pub fn collider_group(&self, key: ColliderKey) -> Option<&str> {
        self.collider(key).map(|coll| coll.group.as_str())
    }

    /// The rigid body a collider is attached to.
    pub fn collider_body(&self, key: ColliderKey) -> Option<BodyKey> {
        self.entities.get_collider_body(key)
    }

    //
    // bodies
    //

    /// Add a rigid body attached to the colliders listed in the description.
    ///
    /// Every listed collider must exist and have physics enabled,
    /// and there must be at least one. A body rejected for having no colliders
    /// is reported with the key it would have had.
    pub fn add_rigid_body(&mut self, desc: RigidBodyDesc) -> Result<BodyKey> {
        for &key in &desc.colliders {
            match self.entities.get_collider(key) {
                None => return Err(PhysicsError::ColliderNotFound(key)),
                Some(coll) if !coll.physics => return Err(PhysicsError::ColliderNotPhysical(key)),
                Some(_) => (),
            }
        }
        let body = RigidBody::from_desc(desc)?;
        let key = self.entities.insert_body(body);
        if let Err(err) = self.check_body(key) {
            self.entities.remove_body(key);
            return Err(err);
        }
        log::trace!("Adding rigid body {key:?}");
        Ok(key)
    }

    /// Remove a rigid body, returning it if it still existed.
    /// Its colliders stay in the world.
    pub fn remove_rigid_body(&mut self, key: BodyKey) -> Option<RigidBody> {
        let removed = self.entities.remove_body(key)?;
        log::trace!("Removed rigid body {key:?}");
        Some(removed)
    }

    #[inline]
    pub fn body(&self, key: BodyKey) -> Option<&RigidBody> {
        self.entities.get_body(key)
    }

    #[inline]
    pub fn body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody> {
        self.entities.get_body_mut(key)
    }

    /// Iterate over all rigid bodies.
    pub fn bodies(&self) -> impl '_ + Iterator<Item = (BodyKey, &'_ RigidBody)> {
        self.entities
            .bodies
            .iter()
            .map(|(idx, body)| (BodyKey(idx), body))
    }

    fn check_body(&self, key: BodyKey) -> Result<()> {
        let body = match self.entities.get_body(key) {
            Some(body) => body,
            None => return Ok(()),
        };
        let has_physics_collider = body.colliders.iter().any(|&c| {
            self.entities
                .get_collider(c)
                .map_or(false, |coll| coll.physics)
        });
        if has_physics_collider {
            Ok(())
        } else {
            Err(PhysicsError::BodyWithoutColliders(key))
        }
    }

    //
    // ticking
    //

    /// Run one tick: detect collisions, then move bodies and push them out of penetration.
    ///
    /// Fails without changing anything if a body has lost all of its physics colliders.
    pub fn resolve(&mut self, dt: f64) -> Result<()> {
        let _span = tracy_span!("physics resolve", "resolve");

        if self.time_scale == 0.0 {
            // frozen, collisions from the last tick stay valid
            return Ok(());
        }
        let dt = dt * self.time_scale;

        let body_keys: Vec<BodyKey> = self.bodies().map(|(key, _)| key).collect();
        for key in body_keys {
            self.check_body(key)?;
        }

        self.sync_body_colliders();
        self.detect_collisions();

        {
            let _span = tracy_span!("integrate", "resolve");
            for (_, body) in self.entities.bodies.iter_mut() {
                if body.active {
                    body.integrate(dt);
                }
            }
        }
        self.correct_penetration();
        self.sync_body_colliders();

        Ok(())
    }

    /// Run as many fixed ticks as the elapsed time allows at the configured framerate.
    /// Returns the number of ticks run.
    pub fn advance(&mut self, elapsed: Duration) -> Result<usize> {
        let ticks = self.clock.ticks_for(elapsed);
        let dt = self.clock.framerate().dt();
        for _ in 0..ticks {
            self.resolve(dt)?;
        }
        Ok(ticks)
    }

    fn detect_collisions(&mut self) {
        self.index.clear();
        self.items.clear();
        self.item_keys.clear();

        for (idx, coll) in self.entities.colliders.iter_mut() {
            coll.refresh();
            if !coll.active {
                continue;
            }
            self.items.push(BroadPhaseItem {
                aabb: coll.aabb(),
                layer: self.layers.intern(&coll.layer),
                update_collisions: coll.update_collisions,
            });
            self.item_keys.push(ColliderKey(idx));
        }

        let pairs = self.broad_phase.as_dyn().pairs(&self.items, &self.layers);

        let _span = tracy_span!("narrow phase", "detect_collisions");
        for [i, j] in pairs {
            let (key_a, key_b) = (self.item_keys[i], self.item_keys[j]);
            if let (Some(a), Some(b)) = (
                self.entities.get_collider(key_a),
                self.entities.get_collider(key_b),
            ) {
                if let Some(resolution) = narrowphase::check(self.collision_method, a, b) {
                    self.index.insert_pair(
                        (key_a, self.items[i].layer),
                        (key_b, self.items[j].layer),
                        resolution,
                    );
                }
            }
        }
    }

    /// Push dynamic bodies out of the static and kinematic bodies they overlap.
    fn correct_penetration(&mut self) {
        fn larger(acc: f64, val: f64) -> f64 {
            if val.abs() > acc.abs() {
                val
            } else {
                acc
            }
        }

        let entities = &self.entities;
        let is_physical = |key: ColliderKey| entities.get_collider(key).map_or(false, |c| c.physics);
        let corrections: Vec<(BodyKey, m::Vec2)> = entities
            .bodies
            .iter()
            .filter(|(_, body)| body.active && body.responds_to_collisions())
            .filter_map(|(idx, body)| {
                let mut correction = m::Vec2::zero();
                let contacts = body
                    .colliders
                    .iter()
                    .filter(|&&coll| is_physical(coll))
                    .flat_map(|&coll| self.index.get(coll))
                    .filter(|c| {
                        is_physical(c.remote)
                            && entities
                                .get_collider_body(c.remote)
                                .and_then(|b| entities.get_body(b))
                                .map_or(false, |other| {
                                    other.active && !other.responds_to_collisions()
                                })
                    });
                for contact in contacts {
                    correction.x = larger(correction.x, contact.resolution.x);
                    correction.y = larger(correction.y, contact.resolution.y);
                }
                (correction != m::Vec2::zero()).then(|| (BodyKey(idx), correction))
            })
            .collect();

        for (key, correction) in corrections {
            if let Some(body) = self.entities.get_body_mut(key) {
                body.apply_correction(correction);
            }
        }
    }

    /// Move colliders along with the bodies they're attached to.
    fn sync_body_colliders(&mut self) {
        let EntitySet {
            bodies, colliders, ..
        } = &mut self.entities;
        for (_, body) in bodies.iter_mut() {
            let delta = body.position - body.synced_position;
            if delta == m::Vec2::zero() {
                continue;
            }
            for key in &body.colliders {
                if let Some(coll) = colliders.get_mut(key.0) {
                    coll.position += delta;
                    coll.refresh();
                }
            }
            body.synced_position = body.position;
        }
    }

    //
    // queries
    //

    /// Everything a collider hit in the last tick.
    /// Empty for unknown or removed colliders.
    #[inline]
    pub fn collisions(&self, key: ColliderKey) -> &[Collision] {
        self.index.get(key)
    }

    /// Everything a collider hit in the last tick on the given layer.
    pub fn collisions_with_layer<'a>(
        &'a self,
        key: ColliderKey,
        layer: &str,
    ) -> impl 'a + Iterator<Item = &'a Collision> {
        self.layers
            .id(layer)
            .into_iter()
            .flat_map(move |id| self.index.with_layer(key, id))
    }

    /// Whether a collider touched anything on the given layer in the last tick.
    pub fn is_touching_layer(&self, key: ColliderKey, layer: &str) -> bool {
        self.collisions_with_layer(key, layer).next().is_some()
    }

    /// Active colliders containing a point, using their pose from the last tick.
    pub fn point_query(&self, point: m::Vec2) -> Vec<ColliderKey> {
        self.colliders()
            .filter(|(_, coll)| coll.contains_point(point))
            .map(|(key, _)| key)
            .collect()
    }

    #[inline]
    pub fn layers(&self) -> &LayerMatrix {
        &self.layers
    }

    #[inline]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Set the time scale. Zero freezes bodies in place
    /// while keeping the collisions of the last tick queryable.
    pub fn set_time_scale(&mut self, time_scale: f64) -> Result<()> {
        check_time_scale(time_scale)?;
        self.time_scale = time_scale;
        Ok(())
    }

    #[inline]
    pub fn framerate(&self) -> PhysicsFramerate {
        self.clock.framerate()
    }

    pub fn set_framerate(&mut self, framerate: PhysicsFramerate) {
        self.clock.set_framerate(framerate);
    }

    pub fn collider_count(&self) -> usize {
        self.entities.collider_count()
    }

    pub fn body_count(&self) -> usize {
        self.entities.body_count()
    }

    /// Remove every collider and body, e.g. when unloading a scene.
    pub fn clear(&mut self) {
        log::debug!(
            "Clearing physics world with {} colliders and {} bodies",
            self.entities.collider_count(),
            self.entities.body_count()
        );
        self.entities.clear();
        self.index = CollisionIndex::new();
        self.items.clear();
        self.item_keys.clear();
    }
}

//
// tests
//
