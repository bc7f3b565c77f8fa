use crate::{
    error::{PhysicsError, Result},
    math as m,
};

/// The physical shape of a collider.
///
/// Shapes are described in collider-local space, centered on the collider's position.
/// Pose (position and rotation) lives on the [`Collider`][super::Collider].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type")
)]
pub enum ColliderShape {
    Rect {
        width: f64,
        height: f64,
    },
    Circle {
        r: f64,
    },
    /// A line segment between two points.
    Line {
        #[cfg_attr(feature = "serde-types", serde(with = "m::serde_points"))]
        points: Vec<m::Vec2>,
    },
    /// A convex polygon with at least three points.
    ///
    /// Convexity is not checked. The separating axis test assumes it,
    /// so a concave polygon collides like some shape between itself and its hull.
    Polygon {
        #[cfg_attr(feature = "serde-types", serde(with = "m::serde_points"))]
        points: Vec<m::Vec2>,
    },
}

impl ColliderShape {
    pub fn rect(width: f64, height: f64) -> Result<Self> {
        let shape = ColliderShape::Rect { width, height };
        shape.validate()?;
        Ok(shape)
    }

    pub fn square(side_length: f64) -> Result<Self> {
        Self::rect(side_length, side_length)
    }

    pub fn circle(radius: f64) -> Result<Self> {
        let shape = ColliderShape::Circle { r: radius };
        shape.validate()?;
        Ok(shape)
    }

    pub fn line(start: m::Vec2, end: m::Vec2) -> Self {
        ColliderShape::Line {
            points: vec![start, end],
        }
    }

    pub fn polygon(points: Vec<m::Vec2>) -> Result<Self> {
        let shape = ColliderShape::Polygon { points };
        shape.validate()?;
        Ok(shape)
    }

    /// Check the things a shape description can get wrong.
    /// Shapes can be deserialized directly so this is also called on registration.
    pub fn validate(&self) -> Result<()> {
        fn check_dim(name: &'static str, value: f64) -> Result<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(PhysicsError::InvalidShapeDimension(name, value))
            }
        }

        match self {
            ColliderShape::Rect { width, height } => {
                check_dim("width", *width)?;
                check_dim("height", *height)
            }
            ColliderShape::Circle { r } => check_dim("radius", *r),
            ColliderShape::Line { points } if points.len() != 2 => {
                Err(PhysicsError::TooFewVertices {
                    shape: "line",
                    expected: "exactly 2",
                    actual: points.len(),
                })
            }
            ColliderShape::Polygon { points } if points.len() < 3 => {
                Err(PhysicsError::TooFewVertices {
                    shape: "polygon",
                    expected: "at least 3",
                    actual: points.len(),
                })
            }
            ColliderShape::Line { .. } | ColliderShape::Polygon { .. } => Ok(()),
        }
    }

    /// Short name of the shape's variant, for log messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ColliderShape::Rect { .. } => "rect",
            ColliderShape::Circle { .. } => "circle",
            ColliderShape::Line { .. } => "line",
            ColliderShape::Polygon { .. } => "polygon",
        }
    }

    /// Vertices of the shape in local space.
    /// Rect corners are listed counterclockwise starting from the bottom left.
    /// Circles have no vertices.
    pub fn vertex_model(&self) -> Vec<m::Vec2> {
        match self {
            ColliderShape::Rect { width, height } => {
                let hw = width / 2.0;
                let hh = height / 2.0;
                vec![
                    m::Vec2::new(-hw, -hh),
                    m::Vec2::new(hw, -hh),
                    m::Vec2::new(hw, hh),
                    m::Vec2::new(-hw, hh),
                ]
            }
            ColliderShape::Circle { .. } => Vec::new(),
            ColliderShape::Line { points } | ColliderShape::Polygon { points } => points.clone(),
        }
    }

    /// Whether a point given in the shape's local space is inside the shape.
    /// Lines have no area and never contain points.
    pub fn contains_local_point(&self, p: m::Vec2) -> bool {
        match self {
            ColliderShape::Rect { width, height } => {
                p.x.abs() <= width / 2.0 && p.y.abs() <= height / 2.0
            }
            ColliderShape::Circle { r } => p.mag_sq() <= r * r,
            ColliderShape::Line { .. } => false,
            ColliderShape::Polygon { points } => {
                // inside a convex polygon if on the same side of every edge
                let mut sign = 0.0;
                for (i, &a) in points.iter().enumerate() {
                    let b = points[(i + 1) % points.len()];
                    let cross = (b - a).wedge(p - a).xy;
                    if cross == 0.0 {
                        continue;
                    }
                    if sign == 0.0 {
                        sign = cross.signum();
                    } else if cross.signum() != sign {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// The shape's area. Lines have none.
    pub fn area(&self) -> f64 {
        match self {
            ColliderShape::Rect { width, height } => width * height,
            ColliderShape::Circle { r } => std::f64::consts::PI * r * r,
            ColliderShape::Line { .. } => 0.0,
            ColliderShape::Polygon { points } => {
                // shoelace formula
                let twice_area: f64 = points
                    .iter()
                    .zip(points.iter().cycle().skip(1))
                    .map(|(a, b)| a.x * b.y - b.x * a.y)
                    .sum();
                twice_area.abs() / 2.0
            }
        }
    }

    /// Whether the rotation of a collider has any effect on this shape.
    #[inline]
    pub fn is_rotatable(&self) -> bool {
        !matches!(self, ColliderShape::Circle { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn vertex_counts_are_checked() {
        assert!(matches!(
            ColliderShape::polygon(vec![m::Vec2::zero(), m::Vec2::unit_x()]),
            Err(PhysicsError::TooFewVertices { actual: 2, .. })
        ));
        let bad_line = ColliderShape::Line {
            points: vec![m::Vec2::zero()],
        };
        assert!(matches!(
            bad_line.validate(),
            Err(PhysicsError::TooFewVertices { actual: 1, .. })
        ));
        assert!(ColliderShape::line(m::Vec2::zero(), m::Vec2::unit_x())
            .validate()
            .is_ok());
    }

    #[test]
    fn dimensions_are_checked() {
        assert_eq!(
            ColliderShape::circle(-1.0),
            Err(PhysicsError::InvalidShapeDimension("radius", -1.0))
        );
        assert!(ColliderShape::rect(f64::NAN, 1.0).is_err());
        assert!(ColliderShape::rect(2.0, 1.0).is_ok());
    }

    #[test]
    fn polygon_point_containment() {
        let tri = ColliderShape::polygon(vec![
            m::Vec2::new(0.0, 0.0),
            m::Vec2::new(4.0, 0.0),
            m::Vec2::new(0.0, 4.0),
        ])
        .unwrap();
        assert!(tri.contains_local_point(m::Vec2::new(1.0, 1.0)));
        assert!(!tri.contains_local_point(m::Vec2::new(3.0, 3.0)));
        assert_abs_diff_eq!(tri.area(), 8.0);
    }

    #[test]
    fn rect_vertex_model_is_centered() {
        let rect = ColliderShape::rect(4.0, 2.0).unwrap();
        let verts = rect.vertex_model();
        assert_eq!(verts.len(), 4);
        assert_eq!(verts[0], m::Vec2::new(-2.0, -1.0));
        assert_eq!(verts[2], m::Vec2::new(2.0, 1.0));
    }
}
