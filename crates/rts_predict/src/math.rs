//! 2D vector math for the prediction core.
//!
//! The client predicts motion in floating-point world coordinates (the
//! authoritative side owns the final word, so bit-exact lockstep is not
//! required here). Every helper that could divide by a length has a
//! zero-length fallback so that degenerate input never produces NaN.

use serde::{Deserialize, Serialize};

/// Lengths below this are treated as zero.
pub const LENGTH_EPSILON: f32 = 1e-6;

/// 2D vector in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate (screen space, grows downward).
    pub y: f32,
}

impl Vec2 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Unit vector along +X.
    pub const X: Self = Self { x: 1.0, y: 0.0 };

    /// Squared length (avoids sqrt for comparisons).
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Squared distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (other - self).length_squared()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross).
    #[must_use]
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Both components are finite (not NaN, not infinite).
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Normalize, returning `None` for (near) zero-length or non-finite input.
    #[must_use]
    pub fn try_normalize(self) -> Option<Self> {
        let len = self.length();
        if !len.is_finite() || len <= LENGTH_EPSILON {
            return None;
        }
        Some(Self::new(self.x / len, self.y / len))
    }

    /// Normalize, falling back to `fallback` when the vector has no direction.
    #[must_use]
    pub fn normalize_or(self, fallback: Self) -> Self {
        self.try_normalize().unwrap_or(fallback)
    }

    /// Rotate counter-clockwise (in math orientation) by `radians`.
    #[must_use]
    pub fn rotate(self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Perpendicular vector, rotated +90°.
    #[must_use]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Clamp the length to at most `max`.
    #[must_use]
    pub fn clamp_length(self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > LENGTH_EPSILON {
            self * (max / len)
        } else {
            self
        }
    }

    /// Step of at most `max_step` from `self` toward `target`, never overshooting.
    #[must_use]
    pub fn step_toward(self, target: Self, max_step: f32) -> Self {
        let delta = target - self;
        let dist = delta.length();
        if dist <= LENGTH_EPSILON {
            return Self::ZERO;
        }
        delta * (max_step.min(dist).max(0.0) / dist)
    }

    /// Round each component to the nearest whole unit.
    #[must_use]
    pub fn rounded_key(self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance() {
        let a = Vec2::new(3.0, 0.0);
        let b = Vec2::new(0.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-5);
        assert!((a.distance_squared(b) - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_vec2_dot_and_cross() {
        let a = Vec2::new(2.0, 3.0);
        let b = Vec2::new(4.0, -1.0);
        assert_eq!(a.dot(b), 5.0);
        assert_eq!(a.cross(b), -14.0);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(Vec2::ZERO.try_normalize(), None);
        assert_eq!(Vec2::ZERO.normalize_or(Vec2::X), Vec2::X);
    }

    #[test]
    fn test_normalize_rejects_nan() {
        let v = Vec2::new(f32::NAN, 1.0);
        assert_eq!(v.try_normalize(), None);
        assert!(!v.is_finite());
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let r = Vec2::X.rotate(std::f32::consts::FRAC_PI_2);
        assert!(r.x.abs() < 1e-6);
        assert!((r.y - 1.0).abs() < 1e-6);
        assert_eq!(Vec2::X.perp(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_step_toward_never_overshoots() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(3.0, 0.0);
        assert_eq!(from.step_toward(to, 4.5), Vec2::new(3.0, 0.0));
        assert_eq!(from.step_toward(to, 1.0), Vec2::new(1.0, 0.0));
        assert_eq!(from.step_toward(from, 1.0), Vec2::ZERO);
    }

    #[test]
    fn test_clamp_length() {
        let v = Vec2::new(30.0, 40.0).clamp_length(5.0);
        assert!((v.length() - 5.0).abs() < 1e-5);
        assert_eq!(Vec2::new(1.0, 0.0).clamp_length(5.0), Vec2::new(1.0, 0.0));
    }
}
