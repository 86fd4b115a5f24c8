//! Stateless intersection tests and contact-point generation.
//!
//! All tests report a unit normal pointing from the first operand towards the
//! second, together with the penetration depth along it.

use crate::math::vec2::Vec2;
use crate::objects::rigid_body::RigidBody;
use crate::shapes::Shape;

/// Tolerance used when matching tied contact-point candidates.
const CONTACT_TOLERANCE: f64 = 0.05;

/// Candidate axes shorter than this are degenerate and skipped during SAT.
const AXIS_EPSILON_SQ: f64 = 1e-12;

/// Tests two bodies for true overlap, dispatching on their shape families.
/// Returns the unit normal (pointing from `a` towards `b`) and the depth.
pub fn collide(a: &RigidBody, b: &RigidBody) -> Option<(Vec2, f64)> {
    match (a.shape(), b.shape()) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            intersect_circles(a.position(), ra, b.position(), rb)
        }
        (Shape::Circle { radius }, _) => {
            intersect_circle_polygon(a.position(), radius, b.position(), b.vertices()?)
        }
        (_, Shape::Circle { radius }) => {
            intersect_circle_polygon(b.position(), radius, a.position(), a.vertices()?)
                .map(|(normal, depth)| (-normal, depth))
        }
        _ => intersect_polygons(a.position(), a.vertices()?, b.position(), b.vertices()?),
    }
}

/// Circle/circle overlap: positive excess of the radii sum over the center
/// distance. Coincident centers fall back to a vertical normal.
pub fn intersect_circles(
    center_a: Vec2,
    radius_a: f64,
    center_b: Vec2,
    radius_b: f64,
) -> Option<(Vec2, f64)> {
    let a_to_b = center_b - center_a;
    let depth = radius_a + radius_b - a_to_b.magnitude();
    if depth <= 0.0 {
        return None;
    }
    let normal = if a_to_b.magnitude_squared() > AXIS_EPSILON_SQ {
        a_to_b.normalize()
    } else {
        Vec2::new(0.0, 1.0)
    };
    Some((normal, depth))
}

/// Circle/polygon SAT over the polygon's edge normals plus the axis towards
/// the polygon vertex nearest the circle center. The returned normal points
/// from the circle towards the polygon.
pub fn intersect_circle_polygon(
    circle_center: Vec2,
    radius: f64,
    polygon_center: Vec2,
    vertices: &[Vec2],
) -> Option<(Vec2, f64)> {
    let mut normal = Vec2::ZERO;
    let mut min_depth = f64::INFINITY;

    for i in 0..vertices.len() {
        let edge = vertices[(i + 1) % vertices.len()] - vertices[i];
        let axis = edge.perpendicular().normalize();
        if axis.magnitude_squared() < AXIS_EPSILON_SQ {
            continue;
        }
        let (min_a, max_a) = project_vertices(vertices, axis);
        let (min_b, max_b) = project_circle(circle_center, radius, axis);
        if min_a >= max_b || min_b >= max_a {
            return None;
        }
        let axis_depth = (max_b - min_a).min(max_a - min_b);
        if axis_depth < min_depth {
            min_depth = axis_depth;
            normal = axis;
        }
    }

    // Edge normals alone miss a circle sitting past a corner; the axis
    // through the closest vertex covers that case.
    let axis = (closest_vertex(circle_center, vertices) - circle_center).normalize();
    if axis.magnitude_squared() > AXIS_EPSILON_SQ {
        let (min_a, max_a) = project_vertices(vertices, axis);
        let (min_b, max_b) = project_circle(circle_center, radius, axis);
        if min_a >= max_b || min_b >= max_a {
            return None;
        }
        let axis_depth = (max_b - min_a).min(max_a - min_b);
        if axis_depth < min_depth {
            min_depth = axis_depth;
            normal = axis;
        }
    }

    if (polygon_center - circle_center).dot(normal) < 0.0 {
        normal = -normal;
    }

    Some((normal, min_depth))
}

/// Polygon/polygon SAT over the edge normals of both polygons. The returned
/// normal points from polygon A towards polygon B.
pub fn intersect_polygons(
    center_a: Vec2,
    vertices_a: &[Vec2],
    center_b: Vec2,
    vertices_b: &[Vec2],
) -> Option<(Vec2, f64)> {
    let mut normal = Vec2::ZERO;
    let mut min_depth = f64::INFINITY;

    for source in [vertices_a, vertices_b] {
        for i in 0..source.len() {
            let edge = source[(i + 1) % source.len()] - source[i];
            let axis = edge.perpendicular().normalize();
            if axis.magnitude_squared() < AXIS_EPSILON_SQ {
                continue;
            }
            let (min_a, max_a) = project_vertices(vertices_a, axis);
            let (min_b, max_b) = project_vertices(vertices_b, axis);
            if min_a >= max_b || min_b >= max_a {
                return None;
            }
            let axis_depth = (max_b - min_a).min(max_a - min_b);
            if axis_depth < min_depth {
                min_depth = axis_depth;
                normal = axis;
            }
        }
    }

    if (center_b - center_a).dot(normal) < 0.0 {
        normal = -normal;
    }

    Some((normal, min_depth))
}

/// Generates up to two contact points for a confirmed collision, dispatching
/// on the shape families of the pair.
pub fn contact_points(a: &RigidBody, b: &RigidBody) -> (Vec2, Option<Vec2>) {
    match (a.shape(), b.shape()) {
        (Shape::Circle { radius }, Shape::Circle { .. }) => {
            (circle_circle_contact(a.position(), radius, b.position()), None)
        }
        (Shape::Circle { .. }, _) => (
            closest_boundary_point(a.position(), b.vertices().unwrap_or(&[])),
            None,
        ),
        (_, Shape::Circle { .. }) => (
            closest_boundary_point(b.position(), a.vertices().unwrap_or(&[])),
            None,
        ),
        _ => polygon_polygon_contacts(
            a.vertices().unwrap_or(&[]),
            b.vertices().unwrap_or(&[]),
        ),
    }
}

/// The single contact between two circles lies on A's circumference along the
/// center-to-center direction.
fn circle_circle_contact(center_a: Vec2, radius_a: f64, center_b: Vec2) -> Vec2 {
    center_a + (center_b - center_a).normalize() * radius_a
}

/// The point on the polygon's boundary closest to `point`.
fn closest_boundary_point(point: Vec2, vertices: &[Vec2]) -> Vec2 {
    let mut min_dist_sq = f64::INFINITY;
    let mut closest = point;
    for i in 0..vertices.len() {
        let (contact, dist_sq) =
            point_segment_distance(point, vertices[i], vertices[(i + 1) % vertices.len()]);
        if dist_sq < min_dist_sq {
            min_dist_sq = dist_sq;
            closest = contact;
        }
    }
    closest
}

/// Accumulates the globally closest vertex-to-edge candidates, promoting a
/// tied candidate to a second contact when it is distinct from the first.
struct ContactAccumulator {
    min_dist_sq: f64,
    first: Option<Vec2>,
    second: Option<Vec2>,
}

impl ContactAccumulator {
    fn new() -> Self {
        Self {
            min_dist_sq: f64::INFINITY,
            first: None,
            second: None,
        }
    }

    fn consider(&mut self, contact: Vec2, dist_sq: f64) {
        if nearly_equal(dist_sq, self.min_dist_sq) {
            if let Some(first) = self.first {
                if !close_enough(contact, first) {
                    self.second = Some(contact);
                }
            }
        } else if dist_sq < self.min_dist_sq {
            self.min_dist_sq = dist_sq;
            self.first = Some(contact);
            self.second = None;
        }
    }
}

/// One or two contact points for a polygon/polygon pair: every vertex of each
/// polygon is tested against every edge of the other, the minimum squared
/// distance wins, and a near-tie at a distinct location becomes the second
/// contact of a flat-on-flat manifold.
fn polygon_polygon_contacts(vertices_a: &[Vec2], vertices_b: &[Vec2]) -> (Vec2, Option<Vec2>) {
    let mut acc = ContactAccumulator::new();

    for (points, edges) in [(vertices_a, vertices_b), (vertices_b, vertices_a)] {
        for &point in points {
            for j in 0..edges.len() {
                let (contact, dist_sq) =
                    point_segment_distance(point, edges[j], edges[(j + 1) % edges.len()]);
                acc.consider(contact, dist_sq);
            }
        }
    }

    match acc.first {
        Some(first) => (first, acc.second),
        // Unreachable for valid polygons; keep the midpoint-free fallback.
        None => (Vec2::ZERO, None),
    }
}

/// Closest point on segment `ab` to `p`, with the squared distance to it.
fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> (Vec2, f64) {
    let ab = b - a;
    let ab_len_sq = ab.magnitude_squared();
    let contact = if ab_len_sq < AXIS_EPSILON_SQ {
        a
    } else {
        let t = (p - a).dot(ab) / ab_len_sq;
        if t <= 0.0 {
            a
        } else if t >= 1.0 {
            b
        } else {
            a + ab * t
        }
    };
    (contact, p.distance_squared(contact))
}

fn closest_vertex(point: Vec2, vertices: &[Vec2]) -> Vec2 {
    let mut min_dist_sq = f64::INFINITY;
    let mut closest = point;
    for &v in vertices {
        let dist_sq = point.distance_squared(v);
        if dist_sq < min_dist_sq {
            min_dist_sq = dist_sq;
            closest = v;
        }
    }
    closest
}

fn project_vertices(vertices: &[Vec2], axis: Vec2) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in vertices {
        let projection = v.dot(axis);
        min = min.min(projection);
        max = max.max(projection);
    }
    (min, max)
}

fn project_circle(center: Vec2, radius: f64, axis: Vec2) -> (f64, f64) {
    let center_projection = center.dot(axis);
    (center_projection - radius, center_projection + radius)
}

fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < CONTACT_TOLERANCE
}

fn close_enough(a: Vec2, b: Vec2) -> bool {
    (b - a).magnitude() < CONTACT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn circle_at(x: f64, y: f64, radius: f64) -> RigidBody {
        RigidBody::new(
            Vec2::new(x, y),
            1.0,
            0.5,
            Shape::circle(radius).unwrap(),
            false,
        )
        .unwrap()
    }

    fn box_at(x: f64, y: f64, width: f64, height: f64) -> RigidBody {
        RigidBody::new(
            Vec2::new(x, y),
            1.0,
            0.5,
            Shape::rect(width, height).unwrap(),
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_resting_circles_depth_and_normal() {
        let a = circle_at(0.0, 0.0, 20.0);
        let b = circle_at(40.0, 0.0, 25.0);
        let (normal, depth) = collide(&a, &b).unwrap();
        assert_relative_eq!(depth, 5.0);
        assert_relative_eq!(normal.x, 1.0);
        assert_relative_eq!(normal.y, 0.0);
    }

    #[test]
    fn test_separated_circles() {
        let a = circle_at(0.0, 0.0, 20.0);
        let b = circle_at(50.0, 0.0, 25.0);
        assert!(collide(&a, &b).is_none());
    }

    #[test]
    fn test_touching_circles_do_not_collide() {
        let a = circle_at(0.0, 0.0, 20.0);
        let b = circle_at(45.0, 0.0, 25.0);
        assert!(collide(&a, &b).is_none());
    }

    #[test]
    fn test_coincident_circles_fall_back_to_vertical_normal() {
        let a = circle_at(0.0, 0.0, 2.0);
        let b = circle_at(0.0, 0.0, 1.0);
        let (normal, depth) = collide(&a, &b).unwrap();
        assert_eq!(normal, Vec2::new(0.0, 1.0));
        assert_relative_eq!(depth, 3.0);
    }

    #[test]
    fn test_circle_polygon_overlap() {
        let circle = circle_at(0.8, 0.0, 0.5);
        let square = box_at(0.0, 0.0, 1.0, 1.0);
        let (normal, depth) = collide(&circle, &square).unwrap();
        // From the circle towards the polygon.
        assert_relative_eq!(normal.x, -1.0);
        assert_relative_eq!(normal.y, 0.0);
        assert_relative_eq!(depth, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_polygon_circle_mirrors_the_normal() {
        let square = box_at(0.0, 0.0, 1.0, 1.0);
        let circle = circle_at(0.8, 0.0, 0.5);
        let (normal, depth) = collide(&square, &circle).unwrap();
        assert_relative_eq!(normal.x, 1.0);
        assert_relative_eq!(normal.y, 0.0);
        assert_relative_eq!(depth, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_closest_vertex_axis_separates_diagonal_circle() {
        // Edge normals alone would report overlap here; only the axis through
        // the corner separates the pair.
        let circle = circle_at(0.95, 0.95, 0.5);
        let square = box_at(0.0, 0.0, 1.0, 1.0);
        assert!(collide(&circle, &square).is_none());
    }

    #[test]
    fn test_boxes_overlapping_on_x() {
        let a = box_at(0.0, 0.0, 50.0, 50.0);
        let b = box_at(40.0, 0.0, 50.0, 50.0);
        let (normal, depth) = collide(&a, &b).unwrap();
        assert_relative_eq!(normal.x, 1.0);
        assert_relative_eq!(normal.y, 0.0);
        assert_relative_eq!(depth, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_separated_boxes() {
        let a = box_at(0.0, 0.0, 50.0, 50.0);
        let b = box_at(60.0, 0.0, 50.0, 50.0);
        assert!(collide(&a, &b).is_none());
    }

    #[test]
    fn test_rotated_box_collision() {
        let mut a = box_at(0.0, 0.0, 50.0, 50.0);
        a.set_rotation(45.0);
        let b = box_at(40.0, 0.0, 50.0, 50.0);
        let (normal, depth) = collide(&a, &b).unwrap();
        assert!(depth > 0.0);
        assert_relative_eq!(normal.magnitude(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_reported_normals_are_unit_length() {
        let mut tilted = box_at(20.0, 15.0, 30.0, 30.0);
        tilted.set_rotation(30.0);
        let bodies = [
            circle_at(0.0, 0.0, 20.0),
            circle_at(25.0, 10.0, 15.0),
            box_at(10.0, 0.0, 40.0, 40.0),
            tilted,
        ];
        let mut reported = 0;
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                if let Some((normal, depth)) = collide(&bodies[i], &bodies[j]) {
                    assert_relative_eq!(normal.magnitude(), 1.0, epsilon = 1e-6);
                    assert!(depth >= 0.0);
                    reported += 1;
                }
            }
        }
        assert!(reported > 0);
    }

    #[test]
    fn test_circle_circle_contact_point() {
        let a = circle_at(0.0, 0.0, 20.0);
        let b = circle_at(40.0, 0.0, 25.0);
        let (contact, second) = contact_points(&a, &b);
        assert_eq!(contact, Vec2::new(20.0, 0.0));
        assert!(second.is_none());
    }

    #[test]
    fn test_circle_polygon_contact_is_closest_boundary_point() {
        let circle = circle_at(0.8, 0.2, 0.5);
        let square = box_at(0.0, 0.0, 1.0, 1.0);
        let (contact, second) = contact_points(&circle, &square);
        assert_relative_eq!(contact.x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(contact.y, 0.2, epsilon = 1e-9);
        assert!(second.is_none());
    }

    #[test]
    fn test_flat_box_contact_produces_two_points() {
        let a = box_at(0.0, 0.0, 50.0, 50.0);
        let b = box_at(40.0, 0.0, 50.0, 50.0);
        let (first, second) = contact_points(&a, &b);
        assert_eq!(first, Vec2::new(25.0, -25.0));
        assert_eq!(second, Some(Vec2::new(15.0, 25.0)));
    }

    #[test]
    fn test_point_segment_distance_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        let (on_segment, d1) = point_segment_distance(Vec2::new(4.0, 3.0), a, b);
        assert_eq!(on_segment, Vec2::new(4.0, 0.0));
        assert_relative_eq!(d1, 9.0);
        let (clamped, d2) = point_segment_distance(Vec2::new(-3.0, 4.0), a, b);
        assert_eq!(clamped, a);
        assert_relative_eq!(d2, 25.0);
    }
}
