use crate::physics::{BodyKey, ColliderKey};

/// Errors caused by invalid configuration or authoring mistakes.
///
/// These are never clamped or ignored internally; they propagate
/// to whoever introduced the invalid state, usually a scene loader.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("Unsupported physics framerate {0} Hz (expected 60, 120, 180 or 240)")]
    InvalidFramerate(u32),
    #[error("A {shape} collider needs {expected} vertices, got {actual}")]
    TooFewVertices {
        shape: &'static str,
        expected: &'static str,
        actual: usize,
    },
    #[error("Invalid {0} for a collider shape: {1}")]
    InvalidShapeDimension(&'static str, f64),
    #[error("Collider {0:?} does not exist")]
    ColliderNotFound(ColliderKey),
    #[error("Collider {0:?} has physics disabled and cannot be attached to a rigid body")]
    ColliderNotPhysical(ColliderKey),
    #[error("Rigid body {0:?} has no physics-enabled colliders")]
    BodyWithoutColliders(BodyKey),
    #[error("Gravity must be finite and non-negative, got {0}")]
    InvalidGravity(f64),
    #[error("Time scale must be finite and non-negative, got {0}")]
    InvalidTimeScale(f64),
    #[error("Grid cell size must be finite and positive, got {0}")]
    InvalidCellSize(f64),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
