use super::ColliderKey;
use crate::{
    error::{PhysicsError, Result},
    math as m,
};

/// A rigid body moves its colliders around and can be pushed out of things it hits.
///
/// The body owns its position. After every tick the movement is written through
/// to the attached colliders, so the host can read either one.
#[derive(Clone, Debug)]
pub struct RigidBody {
    pub(crate) body: BodyType,
    /// Position in world space. Changing this moves the attached colliders
    /// by the same amount on the next tick.
    pub position: m::Vec2,
    /// Inactive bodies don't move and aren't checked for colliders.
    pub active: bool,
    pub(crate) colliders: Vec<ColliderKey>,
    // where the colliders were last synced to
    pub(crate) synced_position: m::Vec2,
}

/// The type of a rigid body determines how it is treated in physics updates.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type")
)]
pub enum BodyType {
    /// Cannot move and has no velocity.
    Static,
    /// Moves at its velocity, not affected by gravity or collisions.
    Kinematic {
        #[cfg_attr(feature = "serde-types", serde(default, with = "m::serde_vec2"))]
        velocity: m::Vec2,
    },
    /// Falls with gravity and gets pushed out of static and kinematic bodies.
    Dynamic {
        #[cfg_attr(feature = "serde-types", serde(default, with = "m::serde_vec2"))]
        velocity: m::Vec2,
        /// Downward acceleration in units per second squared. Never negative.
        #[cfg_attr(feature = "serde-types", serde(default))]
        gravity: f64,
    },
}

impl Default for BodyType {
    fn default() -> Self {
        BodyType::Dynamic {
            velocity: m::Vec2::zero(),
            gravity: 0.0,
        }
    }
}

impl BodyType {
    pub(crate) fn validate(&self) -> Result<()> {
        match *self {
            BodyType::Dynamic { gravity, .. } if !(gravity.is_finite() && gravity >= 0.0) => {
                Err(PhysicsError::InvalidGravity(gravity))
            }
            _ => Ok(()),
        }
    }
}

impl RigidBody {
    pub(crate) fn from_desc(desc: RigidBodyDesc) -> Result<Self> {
        desc.body.validate()?;
        Ok(RigidBody {
            body: desc.body,
            position: desc.position,
            active: desc.active,
            colliders: desc.colliders,
            synced_position: desc.position,
        })
    }

    // accessors

    pub fn body(&self) -> &BodyType {
        &self.body
    }

    /// Keys of the colliders attached to this body.
    pub fn colliders(&self) -> &[ColliderKey] {
        &self.colliders
    }

    pub fn responds_to_collisions(&self) -> bool {
        matches!(self.body, BodyType::Dynamic { .. })
    }

    pub fn velocity(&self) -> Option<&m::Vec2> {
        match self.body {
            BodyType::Static => None,
            BodyType::Kinematic { ref velocity } => Some(velocity),
            BodyType::Dynamic { ref velocity, .. } => Some(velocity),
        }
    }

    pub fn velocity_mut(&mut self) -> Option<&mut m::Vec2> {
        match self.body {
            BodyType::Static => None,
            BodyType::Kinematic { ref mut velocity } => Some(velocity),
            BodyType::Dynamic {
                ref mut velocity, ..
            } => Some(velocity),
        }
    }

    /// Gravity of a dynamic body. Zero for the other types.
    pub fn gravity(&self) -> f64 {
        match self.body {
            BodyType::Dynamic { gravity, .. } => gravity,
            _ => 0.0,
        }
    }

    /// Change the gravity of a dynamic body. Does nothing to other types.
    pub fn set_gravity(&mut self, new_gravity: f64) -> Result<()> {
        if let BodyType::Dynamic {
            ref mut gravity, ..
        } = self.body
        {
            if !(new_gravity.is_finite() && new_gravity >= 0.0) {
                return Err(PhysicsError::InvalidGravity(new_gravity));
            }
            *gravity = new_gravity;
        }
        Ok(())
    }

    /// Apply gravity and velocity for one step.
    pub(crate) fn integrate(&mut self, dt: f64) {
        match self.body {
            BodyType::Static => (),
            BodyType::Kinematic { velocity } => {
                self.position += velocity * dt;
            }
            BodyType::Dynamic {
                ref mut velocity,
                gravity,
            } => {
                velocity.y -= gravity * dt;
                self.position += *velocity * dt;
            }
        }
    }

    /// Move out of penetration and stop moving into whatever was hit.
    /// Static and kinematic bodies ignore this.
    pub(crate) fn apply_correction(&mut self, correction: m::Vec2) {
        if let BodyType::Dynamic {
            ref mut velocity, ..
        } = self.body
        {
            self.position += correction;
            // a push along an axis means we were moving against it
            if correction.x != 0.0 && velocity.x * correction.x < 0.0 {
                velocity.x = 0.0;
            }
            if correction.y != 0.0 && velocity.y * correction.y < 0.0 {
                velocity.y = 0.0;
            }
        }
    }
}

/// Everything needed to create a [`RigidBody`][self::RigidBody].
///
/// Collider keys only exist at runtime, so scene files leave `colliders` out
/// and the loader fills it in after adding the colliders.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RigidBodyDesc {
    #[cfg_attr(feature = "serde-types", serde(flatten))]
    pub body: BodyType,
    #[cfg_attr(feature = "serde-types", serde(with = "m::serde_vec2"))]
    pub position: m::Vec2,
    #[cfg_attr(feature = "serde-types", serde(skip))]
    pub colliders: Vec<ColliderKey>,
    pub active: bool,
}

impl Default for RigidBodyDesc {
    fn default() -> Self {
        Self {
            body: BodyType::default(),
            position: m::Vec2::zero(),
            colliders: Vec::new(),
            active: true,
        }
    }
}

impl RigidBodyDesc {
    pub fn new_dynamic(gravity: f64) -> Self {
        Self {
            body: BodyType::Dynamic {
                velocity: m::Vec2::zero(),
                gravity,
            },
            ..Default::default()
        }
    }

    pub fn new_kinematic() -> Self {
        Self {
            body: BodyType::Kinematic {
                velocity: m::Vec2::zero(),
            },
            ..Default::default()
        }
    }

    pub fn new_static() -> Self {
        Self {
            body: BodyType::Static,
            ..Default::default()
        }
    }

    /// Set the starting velocity. Static bodies ignore this.
    pub fn with_velocity(mut self, vel: impl Into<[f64; 2]>) -> Self {
        let [x, y] = vel.into();
        match self.body {
            BodyType::Static => (),
            BodyType::Kinematic { ref mut velocity } | BodyType::Dynamic { ref mut velocity, .. } => {
                *velocity = m::Vec2::new(x, y);
            }
        }
        self
    }

    pub fn with_position(mut self, pos: impl Into<[f64; 2]>) -> Self {
        let [x, y] = pos.into();
        self.position = m::Vec2::new(x, y);
        self
    }

    pub fn with_colliders(mut self, colliders: impl IntoIterator<Item = ColliderKey>) -> Self {
        self.colliders = colliders.into_iter().collect();
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}
