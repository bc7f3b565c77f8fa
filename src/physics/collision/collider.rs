use super::{ColliderShape, AABB};
use crate::{error::Result, math as m};

/// A shape placed in the world that can collide with other colliders.
///
/// Colliders live in a [`PhysicsManager`][crate::PhysicsManager] and are accessed through
/// [`ColliderKey`][crate::ColliderKey]s. The owner is expected to update `position`, `rotation`
/// and `layer` in place every tick; the world-space vertex model is refreshed from them
/// at the start of every [`resolve`][crate::PhysicsManager::resolve].
#[derive(Clone, Debug)]
pub struct Collider {
    /// Center of the shape in world space.
    pub position: m::Vec2,
    /// Rotation in radians. Ignored by circles.
    pub rotation: f64,
    /// Name of the collision layer, checked against the layer matrix.
    pub layer: String,
    /// Identifier of whatever owns this collider, typically an entity id.
    /// Only used to find out what was hit.
    pub group: String,
    /// If false, this collider isn't tested against others,
    /// but others can still be tested against it.
    pub update_collisions: bool,
    /// Whether this collider couples with a rigid body.
    pub physics: bool,
    /// Inactive colliders are skipped everywhere but keep their key.
    pub active: bool,
    shape: ColliderShape,
    local_vertices: Vec<m::Vec2>,
    // derived from the pose in `refresh`
    world_vertices: Vec<m::Vec2>,
    aabb: AABB,
}

impl Collider {
    pub fn from_desc(desc: ColliderDesc) -> Result<Self> {
        desc.shape.validate()?;
        let local_vertices = desc.shape.vertex_model();
        let mut coll = Collider {
            position: desc.position,
            rotation: desc.rotation,
            layer: desc.layer,
            group: desc.group,
            update_collisions: desc.update_collisions,
            physics: desc.physics,
            active: desc.active,
            shape: desc.shape,
            world_vertices: Vec::with_capacity(local_vertices.len()),
            local_vertices,
            aabb: AABB::zero(),
        };
        coll.refresh();
        Ok(coll)
    }

    #[inline]
    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    /// Replace the shape. The new shape is validated first
    /// and the collider is left untouched if it's invalid.
    pub fn set_shape(&mut self, shape: ColliderShape) -> Result<()> {
        shape.validate()?;
        self.local_vertices = shape.vertex_model();
        self.shape = shape;
        self.refresh();
        Ok(())
    }

    /// Recompute the world-space vertex model and bounding box from the current pose.
    pub fn refresh(&mut self) {
        self.world_vertices.clear();
        let rotation = if self.shape.is_rotatable() {
            self.rotation
        } else {
            0.0
        };
        let position = self.position;
        self.world_vertices.extend(
            self.local_vertices
                .iter()
                .map(|&v| m::transform_point(v, rotation, position)),
        );
        self.aabb = match self.shape {
            ColliderShape::Circle { r } => AABB {
                min: self.position - m::Vec2::broadcast(r),
                max: self.position + m::Vec2::broadcast(r),
            },
            _ => AABB::from_points(&self.world_vertices),
        };
    }

    /// Vertices in world space as of the last refresh. Empty for circles.
    #[inline]
    pub fn world_vertices(&self) -> &[m::Vec2] {
        &self.world_vertices
    }

    /// Bounding box in world space as of the last refresh.
    #[inline]
    pub fn aabb(&self) -> AABB {
        self.aabb
    }

    /// True for rects whose rotation is a multiple of a half turn,
    /// which lets the cheaper axis-aligned test produce exact results.
    pub fn is_axis_aligned_rect(&self) -> bool {
        match self.shape {
            ColliderShape::Rect { .. } => {
                let half_turns = self.rotation / std::f64::consts::PI;
                (half_turns - half_turns.round()).abs() < 1e-9
            }
            _ => false,
        }
    }

    /// Check whether a point in world space is inside this collider.
    pub fn contains_point(&self, point: m::Vec2) -> bool {
        if !self.aabb.contains_point(point) {
            return false;
        }
        let rotation = if self.shape.is_rotatable() {
            self.rotation
        } else {
            0.0
        };
        let local = m::transform_point(point - self.position, -rotation, m::Vec2::zero());
        self.shape.contains_local_point(local)
    }
}

/// Everything needed to create a [`Collider`][super::Collider].
///
/// Scene files describe colliders in this format and get replayed through
/// [`PhysicsManager::add_collider`][crate::PhysicsManager::add_collider].
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ColliderDesc {
    pub layer: String,
    #[cfg_attr(feature = "serde-types", serde(with = "m::serde_vec2"))]
    pub position: m::Vec2,
    pub rotation: f64,
    pub shape: ColliderShape,
    pub update_collisions: bool,
    pub physics: bool,
    pub group: String,
    pub active: bool,
}

impl Default for ColliderDesc {
    fn default() -> Self {
        Self {
            layer: String::from("default"),
            position: m::Vec2::zero(),
            rotation: 0.0,
            shape: ColliderShape::Rect {
                width: 1.0,
                height: 1.0,
            },
            update_collisions: true,
            physics: false,
            group: String::new(),
            active: true,
        }
    }
}

impl ColliderDesc {
    pub fn new(layer: impl Into<String>, shape: ColliderShape) -> Self {
        Self {
            layer: layer.into(),
            shape,
            ..Default::default()
        }
    }

    #[inline]
    pub fn with_position(mut self, pos: impl Into<[f64; 2]>) -> Self {
        let [x, y] = pos.into();
        self.position = m::Vec2::new(x, y);
        self
    }

    #[inline]
    pub fn with_rotation(mut self, angle: m::Angle) -> Self {
        self.rotation = angle.rad();
        self
    }

    #[inline]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Set whether this collider is tested against others.
    /// Static scenery can turn this off and still be hit by things that move.
    #[inline]
    pub fn with_update_collisions(mut self, update: bool) -> Self {
        self.update_collisions = update;
        self
    }

    #[inline]
    pub fn with_physics(mut self, physics: bool) -> Self {
        self.physics = physics;
        self
    }

    #[inline]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Angle;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rotated_rect_bounds() {
        let coll = Collider::from_desc(
            ColliderDesc::new("default", ColliderShape::square(2.0).unwrap())
                .with_position([10.0, 0.0])
                .with_rotation(Angle::Deg(45.0)),
        )
        .unwrap();
        let half_diag = 2.0_f64.sqrt();
        assert_abs_diff_eq!(coll.aabb().min.x, 10.0 - half_diag, epsilon = 1e-9);
        assert_abs_diff_eq!(coll.aabb().max.y, half_diag, epsilon = 1e-9);
        assert!(!coll.is_axis_aligned_rect());
        assert!(coll.contains_point(m::Vec2::new(10.0, 1.3)));
        assert!(!coll.contains_point(m::Vec2::new(10.9, 0.9)));
    }

    #[test]
    fn circles_ignore_rotation() {
        let mut coll = Collider::from_desc(
            ColliderDesc::new("default", ColliderShape::circle(1.0).unwrap())
                .with_rotation(Angle::Deg(30.0)),
        )
        .unwrap();
        assert!(coll.world_vertices().is_empty());
        assert_eq!(coll.aabb().max, m::Vec2::new(1.0, 1.0));

        coll.position = m::Vec2::new(5.0, 5.0);
        coll.refresh();
        assert_eq!(coll.aabb().min, m::Vec2::new(4.0, 4.0));
    }

    #[test]
    fn invalid_shape_swap_keeps_old_shape() {
        let mut coll =
            Collider::from_desc(ColliderDesc::new("default", ColliderShape::square(1.0).unwrap()))
                .unwrap();
        let bad = ColliderShape::Polygon { points: Vec::new() };
        assert!(coll.set_shape(bad).is_err());
        assert_eq!(coll.world_vertices().len(), 4);
    }
}
