use crate::math as m;

mod shape;
pub use shape::ColliderShape;

mod collider;
pub use collider::{Collider, ColliderDesc};

pub mod layers;
pub use layers::{LayerId, LayerMatrix};

pub mod broadphase;
pub use broadphase::{BroadPhase, BroadPhaseItem, BruteForce};

pub mod grid;
pub use grid::{GridParams, SpatialGrid};

pub mod narrowphase;
pub use narrowphase::{aabb_check, sat_check, CollisionMethod};

pub mod index;
pub use index::{Collision, CollisionIndex};

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AABB {
    pub min: m::Vec2,
    pub max: m::Vec2,
}

impl AABB {
    #[inline]
    pub fn zero() -> Self {
        Self {
            min: m::Vec2::zero(),
            max: m::Vec2::zero(),
        }
    }

    /// Smallest box containing all of the given points.
    /// Returns a zero box at the origin if there are no points.
    pub fn from_points(points: &[m::Vec2]) -> Self {
        let mut iter = points.iter();
        let first = match iter.next() {
            Some(p) => *p,
            None => return Self::zero(),
        };
        iter.fold(
            Self {
                min: first,
                max: first,
            },
            |acc, p| Self {
                min: acc.min.min_by_component(*p),
                max: acc.max.max_by_component(*p),
            },
        )
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// The larger of width and height.
    #[inline]
    pub fn extent(&self) -> f64 {
        self.width().max(self.height())
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min_by_component(other.min),
            max: self.max.max_by_component(other.max),
        }
    }

    /// Strict overlap test. Boxes that only touch along an edge don't overlap,
    /// matching the narrow phase where zero overlap means no collision.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    #[inline]
    pub fn contains_point(&self, point: m::Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}
