//! Exact overlap tests between pairs of colliders.
//!
//! Both tests return a resolution vector: the smallest translation that moves
//! the first collider out of the second. The vector for the reverse pair
//! is always the exact negation.

use super::{Collider, ColliderShape};
use crate::math::{self as m, Unit};
use itertools::{Itertools, MinMaxResult};

/// Which narrow phase algorithm to run on candidate pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum CollisionMethod {
    /// Separating axis test, works with every shape.
    #[default]
    Sat,
    /// Bounding box overlap only. Exact for unrotated rects,
    /// any pair involving something else falls back to SAT.
    Aabb,
}

/// Run the configured test on a pair, falling back to SAT
/// where the axis-aligned test wouldn't be exact.
pub fn check(method: CollisionMethod, a: &Collider, b: &Collider) -> Option<m::Vec2> {
    match method {
        CollisionMethod::Aabb if a.is_axis_aligned_rect() && b.is_axis_aligned_rect() => {
            aabb_check(a, b)
        }
        CollisionMethod::Aabb => {
            log::trace!(
                "AABB check not exact for {} vs {}, using SAT",
                a.shape().kind_name(),
                b.shape().kind_name()
            );
            sat_check(a, b)
        }
        CollisionMethod::Sat => sat_check(a, b),
    }
}

//
// AABB
//

/// Check two colliders' bounding boxes for overlap.
/// The resolution is along whichever world axis has less penetration, x on ties.
pub fn aabb_check(a: &Collider, b: &Collider) -> Option<m::Vec2> {
    let (aa, bb) = (a.aabb(), b.aabb());
    let (x_depth, x_push) = interval_push(aa.min.x, aa.max.x, bb.min.x, bb.max.x)?;
    let (y_depth, y_push) = interval_push(aa.min.y, aa.max.y, bb.min.y, bb.max.y)?;
    if x_depth <= y_depth {
        Some(m::Vec2::new(x_push, 0.0))
    } else {
        Some(m::Vec2::new(0.0, y_push))
    }
}

/// Overlap of two 1D intervals and the signed distance to push the first one out,
/// or None if they don't overlap.
#[inline]
fn interval_push(min_a: f64, max_a: f64, min_b: f64, max_b: f64) -> Option<(f64, f64)> {
    // how far a would have to move backward / forward to get out
    let back = max_a - min_b;
    let fwd = max_b - min_a;
    if back <= 0.0 || fwd <= 0.0 {
        return None;
    }
    if back < fwd {
        Some((back, -back))
    } else {
        Some((fwd, fwd))
    }
}

//
// SAT
//

/// Check two colliders for intersection with the separating axis theorem.
///
/// Candidate axes are gathered in a fixed order: edge normals of the first shape,
/// then the second, then the axes contributed by circles.
/// The axis with the smallest overlap wins, and on equal overlaps
/// the earlier axis wins. This is deterministic but not always
/// the most physically plausible choice.
pub fn sat_check(a: &Collider, b: &Collider) -> Option<m::Vec2> {
    let mut axes: Vec<Unit<m::Vec2>> = Vec::with_capacity(8);
    push_edge_axes(a, &mut axes);
    push_edge_axes(b, &mut axes);
    push_circle_axes(a, b, &mut axes);
    push_circle_axes(b, a, &mut axes);

    let mut best: Option<(f64, m::Vec2)> = None;
    for axis in axes {
        let (min_a, max_a) = project(a, axis);
        let (min_b, max_b) = project(b, axis);
        // any separating axis means no collision, no need to look further
        let (depth, push) = interval_push(min_a, max_a, min_b, max_b)?;
        match best {
            Some((best_depth, _)) if best_depth <= depth => (),
            _ => best = Some((depth, *axis * push)),
        }
    }
    best.map(|(_, resolution)| resolution)
}

/// Axes perpendicular to a shape's edges.
fn push_edge_axes(coll: &Collider, axes: &mut Vec<Unit<m::Vec2>>) {
    match coll.shape() {
        ColliderShape::Rect { .. } => {
            // rects only have two distinct edge directions.
            // listed as rotated x then y so unrotated rects agree with the AABB test
            let x = m::transform_point(m::Vec2::unit_x(), coll.rotation, m::Vec2::zero());
            let y = m::left_normal(x);
            axes.push(Unit::new_unchecked(x));
            axes.push(Unit::new_unchecked(y));
        }
        ColliderShape::Circle { .. } => {}
        ColliderShape::Line { .. } => {
            let verts = coll.world_vertices();
            // degenerate (zero-length) lines contribute nothing
            if let Some(dir) = Unit::try_new(verts[1] - verts[0]) {
                axes.push(m::unit_left_normal(dir));
                // two segments on the same line overlap on the normal,
                // only the direction can separate them
                axes.push(dir);
            }
        }
        ColliderShape::Polygon { .. } => {
            for (&start, &end) in coll.world_vertices().iter().circular_tuple_windows() {
                if let Some(dir) = Unit::try_new(end - start) {
                    axes.push(m::unit_left_normal(dir));
                }
            }
        }
    }
}

/// Axes contributed by `circle` if it is a circle:
/// the axis through both shapes' centers, and for shapes with vertices,
/// the axis towards the vertex closest to the circle's center.
fn push_circle_axes(circle: &Collider, other: &Collider, axes: &mut Vec<Unit<m::Vec2>>) {
    if !matches!(circle.shape(), ColliderShape::Circle { .. }) {
        return;
    }
    let center = circle.position;
    let other_verts = other.world_vertices();

    match Unit::try_new(shape_center(other) - center) {
        Some(axis) => axes.push(axis),
        // same position, consider penetration to be on x axis
        None if other_verts.is_empty() => axes.push(Unit::unit_x()),
        None => (),
    }

    let closest = other_verts.iter().min_by(|v1, v2| {
        (**v1 - center)
            .mag_sq()
            .partial_cmp(&(**v2 - center).mag_sq())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(axis) = closest.and_then(|&v| Unit::try_new(v - center)) {
        axes.push(axis);
    }
}

fn shape_center(coll: &Collider) -> m::Vec2 {
    let verts = coll.world_vertices();
    if verts.is_empty() {
        coll.position
    } else {
        verts.iter().fold(m::Vec2::zero(), |acc, v| acc + *v) / verts.len() as f64
    }
}

/// Project a collider onto an axis, giving the interval it covers.
fn project(coll: &Collider, axis: Unit<m::Vec2>) -> (f64, f64) {
    match coll.shape() {
        ColliderShape::Circle { r } => {
            let c = coll.position.dot(*axis);
            (c - r, c + r)
        }
        _ => match coll.world_vertices().iter().map(|v| v.dot(*axis)).minmax() {
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
            MinMaxResult::OneElement(p) => (p, p),
            // every shape but a circle has vertices
            MinMaxResult::NoElements => (0.0, 0.0),
        },
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math::Angle, physics::collision::ColliderDesc};
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn make(shape: ColliderShape, pos: [f64; 2], rot_deg: f64) -> Collider {
        Collider::from_desc(
            ColliderDesc::new("default", shape)
                .with_position(pos)
                .with_rotation(Angle::Deg(rot_deg)),
        )
        .unwrap()
    }

    fn rect(w: f64, h: f64, pos: [f64; 2]) -> Collider {
        make(ColliderShape::rect(w, h).unwrap(), pos, 0.0)
    }

    fn circle(r: f64, pos: [f64; 2]) -> Collider {
        make(ColliderShape::circle(r).unwrap(), pos, 0.0)
    }

    fn assert_vec_eq(actual: m::Vec2, expected: m::Vec2) {
        assert_abs_diff_eq!(actual.x, expected.x, epsilon = 1e-9);
        assert_abs_diff_eq!(actual.y, expected.y, epsilon = 1e-9);
    }

    #[test]
    fn rect_rect_side_by_side() {
        let a = rect(40.0, 40.0, [20.0, 20.0]);
        let b = rect(40.0, 40.0, [40.0, 20.0]);
        assert_vec_eq(sat_check(&a, &b).unwrap(), m::Vec2::new(-20.0, 0.0));
        assert_vec_eq(sat_check(&b, &a).unwrap(), m::Vec2::new(20.0, 0.0));

        let far = rect(40.0, 40.0, [1000.0, 1000.0]);
        assert!(sat_check(&a, &far).is_none());
    }

    #[test]
    fn touching_is_not_overlapping() {
        let a = rect(2.0, 2.0, [0.0, 0.0]);
        let b = rect(2.0, 2.0, [2.0, 0.0]);
        assert!(sat_check(&a, &b).is_none());
        assert!(aabb_check(&a, &b).is_none());
    }

    #[test]
    fn aabb_and_sat_agree_on_unrotated_rects() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..500 {
            let a = rect(
                rng.gen_range(1.0..10.0),
                rng.gen_range(1.0..10.0),
                [rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)],
            );
            let b = rect(
                rng.gen_range(1.0..10.0),
                rng.gen_range(1.0..10.0),
                [rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)],
            );
            match (sat_check(&a, &b), aabb_check(&a, &b)) {
                (None, None) => (),
                (Some(sat), Some(aabb)) => {
                    assert_abs_diff_eq!(sat.x, aabb.x, epsilon = 1e-6);
                    assert_abs_diff_eq!(sat.y, aabb.y, epsilon = 1e-6);
                }
                (sat, aabb) => panic!("SAT said {sat:?}, AABB said {aabb:?}"),
            }
        }
    }

    #[test]
    fn aabb_method_falls_back_for_rotated() {
        // rotated 45 degrees, the bounding boxes overlap but the shapes don't
        let a = make(ColliderShape::square(2.0).unwrap(), [0.0, 0.0], 45.0);
        let b = rect(2.0, 2.0, [2.3, 2.3]);
        assert!(aabb_check(&a, &b).is_some());
        assert!(check(CollisionMethod::Aabb, &a, &b).is_none());
    }

    #[test]
    fn circle_circle() {
        let a = circle(1.0, [0.0, 0.0]);
        let b = circle(1.0, [1.5, 0.0]);
        assert_vec_eq(sat_check(&a, &b).unwrap(), m::Vec2::new(-0.5, 0.0));
        let c = circle(1.0, [3.0, 0.0]);
        assert!(sat_check(&a, &c).is_none());
        // same position still resolves along x
        let d = circle(2.0, [0.0, 0.0]);
        let res = sat_check(&a, &d).unwrap();
        assert_abs_diff_eq!(res.mag(), 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(res.y, 0.0);
    }

    #[test]
    fn circle_near_rect_corner() {
        let r = rect(2.0, 2.0, [0.0, 0.0]);
        // diagonal off the corner, inside the bounding boxes but not touching
        let c = circle(0.5, [1.4, 1.4]);
        assert!(sat_check(&r, &c).is_none());
        assert!(sat_check(&c, &r).is_none());
        let c2 = circle(0.5, [1.2, 0.0]);
        assert_vec_eq(sat_check(&c2, &r).unwrap(), m::Vec2::new(0.3, 0.0));
    }

    #[test]
    fn polygon_vs_rect() {
        let tri = make(
            ColliderShape::polygon(vec![
                m::Vec2::new(-1.0, -1.0),
                m::Vec2::new(1.0, -1.0),
                m::Vec2::new(0.0, 1.0),
            ])
            .unwrap(),
            [0.0, 0.0],
            0.0,
        );
        let ground = rect(10.0, 2.0, [0.0, -1.8]);
        let res = sat_check(&tri, &ground).unwrap();
        assert_vec_eq(res, m::Vec2::new(0.0, 0.2));
        assert_vec_eq(sat_check(&ground, &tri).unwrap(), -res);
    }

    #[test]
    fn lines() {
        let line = make(
            ColliderShape::line(m::Vec2::new(-5.0, 0.0), m::Vec2::new(5.0, 0.0)),
            [0.0, 0.0],
            0.0,
        );
        let above = rect(2.0, 2.0, [0.0, 0.5]);
        let res = sat_check(&above, &line).unwrap();
        assert_vec_eq(res, m::Vec2::new(0.0, 0.5));

        // collinear but disjoint segments
        let other = make(
            ColliderShape::line(m::Vec2::new(-1.0, 0.0), m::Vec2::new(1.0, 0.0)),
            [10.0, 0.0],
            0.0,
        );
        assert!(sat_check(&line, &other).is_none());

        let crossing = make(
            ColliderShape::line(m::Vec2::new(-1.0, 0.0), m::Vec2::new(1.0, 0.0)),
            [0.0, 0.0],
            90.0,
        );
        assert!(sat_check(&line, &crossing).is_some());

        let ball = circle(1.0, [5.5, 0.5]);
        assert!(sat_check(&ball, &line).is_some());
        let far_ball = circle(1.0, [6.0, 1.0]);
        assert!(sat_check(&far_ball, &line).is_none());
    }

    #[test]
    fn equal_overlaps_pick_the_first_axis() {
        let a = rect(2.0, 2.0, [0.0, 0.0]);
        let b = rect(2.0, 2.0, [1.0, 1.0]);
        assert_vec_eq(sat_check(&a, &b).unwrap(), m::Vec2::new(-1.0, 0.0));
    }
}
