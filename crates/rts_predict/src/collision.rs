//! Collision primitives.
//!
//! Circle-circle and circle-rectangle overlap tests plus minimum translation
//! resolution. Only the moving point is ever corrected; obstacles are plain
//! values and are never touched.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Extra distance added when pushing a point out of an obstacle, so that
/// floating-point error does not leave it touching and re-penetrating next tick.
pub const COLLISION_MARGIN: f32 = 0.05;

/// Axis-aligned rectangle described by its center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Center in world space.
    pub center: Vec2,
    /// Half width and half height.
    pub half_extents: Vec2,
}

impl Rect {
    /// Create a rectangle from its center and full size.
    #[must_use]
    pub fn from_center_size(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            center,
            half_extents: Vec2::new(width.abs() / 2.0, height.abs() / 2.0),
        }
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Grow the rectangle by `padding` on every side.
    #[must_use]
    pub fn expanded(&self, padding: f32) -> Self {
        Self {
            center: self.center,
            half_extents: self.half_extents + Vec2::new(padding, padding),
        }
    }

    /// Closest point on or inside the rectangle to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        let min = self.min();
        let max = self.max();
        Vec2::new(point.x.clamp(min.x, max.x), point.y.clamp(min.y, max.y))
    }

    /// Whether `point` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Approximate radius used by detour and range heuristics: half the longer side.
    #[must_use]
    pub fn effective_radius(&self) -> f32 {
        self.half_extents.x.max(self.half_extents.y)
    }
}

/// Result of resolving a penetrating circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector pointing from the obstacle toward the corrected point.
    pub normal: Vec2,
    /// Penetration depth before correction.
    pub overlap: f32,
    /// The point pushed out along `normal` by `overlap` plus [`COLLISION_MARGIN`].
    pub corrected: Vec2,
    /// Approximate center of the obstacle that was hit.
    pub obstacle_center: Vec2,
    /// Effective radius of the obstacle that was hit.
    pub obstacle_radius: f32,
}

/// Probe: does a circle at `point` overlap another circle?
///
/// Touching (distance exactly equal to the radius sum) is not an overlap.
#[must_use]
pub fn circle_overlaps_circle(point: Vec2, radius: f32, center: Vec2, other_radius: f32) -> bool {
    let min_dist = radius + other_radius;
    point.distance_squared(center) < min_dist * min_dist
}

/// Probe: does a circle at `point` overlap the rectangle?
#[must_use]
pub fn circle_overlaps_rect(point: Vec2, radius: f32, rect: &Rect) -> bool {
    if rect.contains(point) {
        return true;
    }
    let closest = rect.closest_point(point);
    point.distance_squared(closest) < radius * radius
}

/// Resolve a circle at `point` against a circular obstacle.
///
/// Returns `None` when there is no overlap (or the input is not finite).
/// Exactly coincident centers push along +X instead of dividing by zero.
#[must_use]
pub fn resolve_circle_circle(
    point: Vec2,
    radius: f32,
    center: Vec2,
    other_radius: f32,
) -> Option<Contact> {
    let delta = point - center;
    let dist = delta.length();
    let min_dist = radius + other_radius;

    // NaN compares false here, so malformed input falls through to None.
    if !(dist < min_dist) {
        return None;
    }

    let normal = delta.normalize_or(Vec2::X);
    let overlap = min_dist - dist;

    Some(Contact {
        normal,
        overlap,
        corrected: point + normal * (overlap + COLLISION_MARGIN),
        obstacle_center: center,
        obstacle_radius: other_radius,
    })
}

/// Resolve a circle at `point` against an axis-aligned rectangle.
///
/// The push direction is from the closest boundary point toward the circle
/// center. A center inside the rectangle is pushed out through the nearest
/// edge.
#[must_use]
pub fn resolve_circle_rect(point: Vec2, radius: f32, rect: &Rect) -> Option<Contact> {
    if !point.is_finite() {
        return None;
    }

    let closest = rect.closest_point(point);
    let delta = point - closest;
    let dist = delta.length();

    let (normal, overlap) = if dist <= crate::math::LENGTH_EPSILON {
        // Center inside (or on) the rectangle: exit via the least-penetration edge.
        let min = rect.min();
        let max = rect.max();
        let exits = [
            (point.x - min.x, Vec2::new(-1.0, 0.0)),
            (max.x - point.x, Vec2::new(1.0, 0.0)),
            (point.y - min.y, Vec2::new(0.0, -1.0)),
            (max.y - point.y, Vec2::new(0.0, 1.0)),
        ];
        let (depth, normal) = exits
            .into_iter()
            .fold(exits[0], |best, e| if e.0 < best.0 { e } else { best });
        (normal, depth + radius)
    } else if dist < radius {
        (delta * (1.0 / dist), radius - dist)
    } else {
        return None;
    };

    Some(Contact {
        normal,
        overlap,
        corrected: point + normal * (overlap + COLLISION_MARGIN),
        obstacle_center: rect.center,
        obstacle_radius: rect.effective_radius(),
    })
}
