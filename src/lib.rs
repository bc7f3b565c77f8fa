//! Fixed-step 2D collision detection and simple rigid body movement for games.
//!
//! Everything lives in a [`PhysicsManager`][physics::PhysicsManager]. Add colliders and
//! rigid bodies to it, move them around through their keys, call
//! [`resolve`][physics::PhysicsManager::resolve] once per physics tick
//! and ask what touched what.

// profiling spans, free when the `tracy` feature is off
macro_rules! tracy_span {
    ($name:literal, $fn_name:literal) => {
        tracy_client::Client::running()
            .map(|client| client.span_alloc(Some($name), $fn_name, file!(), line!(), 0))
    };
}

pub mod error;
pub use error::{PhysicsError, Result};

pub mod math;
pub use math::{uv, Angle, Unit, Vec2};

pub mod physics;
pub use physics::{
    collision::{self, Collider, ColliderDesc, ColliderShape, Collision, CollisionMethod, AABB},
    BodyKey, BodyType, BroadPhaseMethod, ColliderKey, PhysicsConfig, PhysicsManager, RigidBody,
    RigidBodyDesc, SharedPhysics,
};

pub mod timestep;
pub use timestep::{PhysicsFramerate, StepClock};
