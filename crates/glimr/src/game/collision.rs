//! AABB-vs-circle collision in the XY plane.
//!
//! ```text
//!        ┌───────────┐
//!        │           │      closest = clamp(centre, min, max)
//!        │     ·─────┼──●   hit    ⇔ |centre − closest|² < r²
//!        │           │      normal  = normalize(centre − box centre)
//!        └───────────┘
//! ```
//!
//! The normal points from the box centre toward the circle centre. When the
//! two centres coincide it falls back to `(0, 1)`.

use glam::Vec2;

/// Result of a positive AABB-vs-circle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector from the box centre toward the circle centre.
    pub normal: Vec2,
    /// Circle centre minus box centre, divided by the box half extents.
    /// The component with the larger magnitude names the face that was hit.
    pub relative: Vec2,
}

/// Which axis a reflection flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Contact {
    /// The axis with the larger penetration relative to the box extents.
    pub fn reflect_axis(&self) -> Axis {
        if self.relative.x.abs() > self.relative.y.abs() {
            Axis::X
        } else {
            Axis::Y
        }
    }
}

/// Test a box (centre + full extents) against a circle.
pub fn aabb_circle(box_center: Vec2, box_size: Vec2, circle_center: Vec2, radius: f32) -> Option<Contact> {
    let half = box_size * 0.5;
    let closest = circle_center.clamp(box_center - half, box_center + half);
    if circle_center.distance_squared(closest) >= radius * radius {
        return None;
    }

    let offset = circle_center - box_center;
    let normal = offset.try_normalize().unwrap_or(Vec2::Y);
    let relative = Vec2::new(
        if half.x > 0.0 { offset.x / half.x } else { offset.x },
        if half.y > 0.0 { offset.y / half.y } else { offset.y },
    );
    Some(Contact { normal, relative })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn just_touching_is_no_hit() {
        // Box spans x ∈ [−5, 5]; circle of radius 1 at x = 6 touches the face.
        assert!(aabb_circle(Vec2::ZERO, Vec2::new(10.0, 2.0), Vec2::new(6.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn overlapping_side_hit() {
        let c = aabb_circle(Vec2::ZERO, Vec2::new(10.0, 2.0), Vec2::new(5.5, 0.0), 1.0).unwrap();
        assert!((c.normal - Vec2::X).length() < 1e-6);
        assert_eq!(c.reflect_axis(), Axis::X);
    }

    #[test]
    fn coincident_centres_fall_back_to_up() {
        let c = aabb_circle(Vec2::new(2.0, 3.0), Vec2::ONE, Vec2::new(2.0, 3.0), 0.5).unwrap();
        assert_eq!(c.normal, Vec2::Y);
    }

    #[test]
    fn circle_inside_box_hits() {
        assert!(aabb_circle(Vec2::ZERO, Vec2::splat(4.0), Vec2::new(0.5, 0.5), 0.1).is_some());
    }

    #[test]
    fn corner_miss() {
        // Diagonal distance from the corner (1,1) to (1.8,1.8) is ~1.13.
        assert!(aabb_circle(Vec2::ZERO, Vec2::splat(2.0), Vec2::new(1.8, 1.8), 1.0).is_none());
    }

    #[test]
    fn wide_brick_hit_from_below_reflects_y() {
        // Ball just under the left half of a wide, flat brick.
        let c = aabb_circle(Vec2::new(0.5, 4.5), Vec2::new(0.9, 0.4), Vec2::new(0.0, 4.05), 0.3).unwrap();
        assert_eq!(c.reflect_axis(), Axis::Y);
    }

    #[test]
    fn zero_extent_box_matches_point_in_circle() {
        // A box of zero extent is a point: the test reduces to point-in-circle,
        // which is symmetric in which shape is called the "box".
        let ball = Vec2::new(0.3, -0.2);
        let point = Vec2::new(0.1, 0.1);
        let r = 0.5;
        let hit = aabb_circle(point, Vec2::ZERO, ball, r).is_some();
        assert_eq!(hit, point.distance_squared(ball) < r * r);
        let swapped = aabb_circle(ball, Vec2::ZERO, point, r).is_some();
        assert_eq!(hit, swapped);
    }
}
