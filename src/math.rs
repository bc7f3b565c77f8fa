//! Vector aliases and the few geometric helpers the physics code needs, on top of `ultraviolet`.
pub use ultraviolet as uv;

pub type Vec2 = uv::DVec2;

/// An angle in either degrees or radians.
///
/// Scene files can use whichever is more readable,
/// colliders store radians.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Angle {
    Rad(f64),
    Deg(f64),
}

impl Angle {
    #[inline]
    pub fn deg(&self) -> f64 {
        match *self {
            Angle::Rad(rad) => rad.to_degrees(),
            Angle::Deg(deg) => deg,
        }
    }

    #[inline]
    pub fn rad(&self) -> f64 {
        match *self {
            Angle::Rad(rad) => rad,
            Angle::Deg(deg) => deg.to_radians(),
        }
    }
}

impl Default for Angle {
    fn default() -> Self {
        Angle::Rad(0.0)
    }
}

/// A vector known to have length one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit<T>(T);

impl Unit<Vec2> {
    /// Normalize a vector, or return `None` if it's too short to have a direction.
    pub fn try_new(v: Vec2) -> Option<Self> {
        let mag_sq = v.mag_sq();
        if mag_sq < 1e-12 {
            None
        } else {
            Some(Unit(v / mag_sq.sqrt()))
        }
    }

    /// Wrap a vector that is already normalized.
    pub const fn new_unchecked(v: Vec2) -> Self {
        Unit(v)
    }

    pub fn unit_x() -> Self {
        Unit(Vec2::unit_x())
    }

    #[inline]
    pub fn into_inner(self) -> Vec2 {
        self.0
    }
}

impl<T> std::ops::Deref for Unit<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// (De)serialize a `Vec2` as a plain `[x, y]` array,
/// with `#[serde(with = "serde_vec2")]`.
/// Scene files are written by hand and shouldn't need to know
/// how `ultraviolet` lays out its types.
#[cfg(feature = "serde-types")]
pub mod serde_vec2 {
    use super::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vec2, serializer: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec2, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Vec2::new(x, y))
    }
}

/// Like [`serde_vec2`][self::serde_vec2], but for lists of points.
#[cfg(feature = "serde-types")]
pub mod serde_points {
    use super::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(points: &[Vec2], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(points.iter().map(|p| [p.x, p.y]))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec2>, D::Error> {
        let arrays = Vec::<[f64; 2]>::deserialize(deserializer)?;
        Ok(arrays.into_iter().map(|[x, y]| Vec2::new(x, y)).collect())
    }
}

/// Counterclockwise perpendicular.
#[inline]
pub fn left_normal(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

#[inline]
pub fn unit_left_normal(u: Unit<Vec2>) -> Unit<Vec2> {
    Unit(left_normal(u.0))
}

/// Rotate a point around the origin by an angle in radians, then translate it.
/// This is how local vertex models are moved into world space.
#[inline]
pub fn transform_point(local: Vec2, rotation: f64, position: Vec2) -> Vec2 {
    if rotation == 0.0 {
        return local + position;
    }
    let (sin, cos) = rotation.sin_cos();
    Vec2::new(
        local.x * cos - local.y * sin,
        local.x * sin + local.y * cos,
    ) + position
}
